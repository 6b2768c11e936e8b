//! The active-index state machine shared by tabs and carousels.

use tracing::trace;

use sitekit_render::Element;

/// Class marking the active trigger and panel.
pub const ACTIVE_CLASS: &str = "active";

/// Transitions accepted by [`TabController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabEvent {
    /// Activate index `i`. Out-of-range indices are ignored.
    Select(usize),
    Next,
    Prev,
}

impl TabEvent {
    /// Map a keyboard key name (`KeyboardEvent.key`) to a relative move.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" => Some(Self::Prev),
            "ArrowRight" | "Right" => Some(Self::Next),
            _ => None,
        }
    }
}

/// Tracks which of `len` panels is active.
///
/// Before the first activation no panel is active; after it exactly one is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabController {
    len: usize,
    active: Option<usize>,
}

impl TabController {
    /// A controller with the first panel active (none when `len` is 0).
    pub fn new(len: usize) -> Self {
        Self {
            len,
            active: (len > 0).then_some(0),
        }
    }

    /// A controller with nothing active yet.
    pub fn inactive(len: usize) -> Self {
        Self { len, active: None }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    /// Apply `event` and return the active index afterwards.
    pub fn transition(&mut self, event: TabEvent) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let next = match (event, self.active) {
            (TabEvent::Select(i), _) if i < self.len => Some(i),
            (TabEvent::Select(_), current) => current,
            (TabEvent::Next, Some(a)) => Some((a + 1) % self.len),
            (TabEvent::Next, None) => Some(0),
            (TabEvent::Prev, Some(a)) => Some((a + self.len - 1) % self.len),
            (TabEvent::Prev, None) => Some(self.len - 1),
        };
        trace!(?event, from = ?self.active, to = ?next, "tab transition");
        self.active = next;
        next
    }

    /// Set or clear [`ACTIVE_CLASS`] on every element of one role (triggers,
    /// panels, dots) so that only the active index carries it.
    pub fn mark<'a>(&self, elements: impl IntoIterator<Item = &'a mut Element>) {
        for (i, el) in elements.into_iter().enumerate() {
            el.toggle_class(ACTIVE_CLASS, self.is_active(i));
        }
    }
}
