//! Touch gesture resolution.

use crate::controller::TabEvent;

/// Screen coordinates of a touch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Turns a touch start/end pair into a relative transition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwipeResolver {
    threshold: f64,
}

impl SwipeResolver {
    /// `threshold` is the horizontal travel (px) a swipe must exceed.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
        }
    }

    /// Rightward travel goes back, leftward travel goes forward. Mostly
    /// vertical gestures are scrolling and resolve to nothing.
    pub fn resolve(&self, start: TouchPoint, end: TouchPoint) -> Option<TabEvent> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if dy.abs() > dx.abs() {
            return None;
        }
        if dx > self.threshold {
            Some(TabEvent::Prev)
        } else if dx < -self.threshold {
            Some(TabEvent::Next)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_swipes_navigate() {
        let swipe = SwipeResolver::default();
        let start = TouchPoint::new(200.0, 100.0);
        assert_eq!(swipe.resolve(start, TouchPoint::new(260.0, 110.0)), Some(TabEvent::Prev));
        assert_eq!(swipe.resolve(start, TouchPoint::new(120.0, 90.0)), Some(TabEvent::Next));
        assert_eq!(swipe.resolve(start, start), None);
    }

    #[test]
    fn vertical_gestures_are_ignored() {
        let swipe = SwipeResolver::default();
        let start = TouchPoint::new(200.0, 100.0);
        assert_eq!(swipe.resolve(start, TouchPoint::new(230.0, 300.0)), None);
        assert_eq!(swipe.resolve(start, TouchPoint::new(150.0, -20.0)), None);
    }

    #[test]
    fn short_travel_below_threshold() {
        let swipe = SwipeResolver::new(40.0);
        let start = TouchPoint::new(0.0, 0.0);
        assert_eq!(swipe.resolve(start, TouchPoint::new(30.0, 0.0)), None);
        assert_eq!(swipe.resolve(start, TouchPoint::new(-41.0, 0.0)), Some(TabEvent::Next));
    }
}
