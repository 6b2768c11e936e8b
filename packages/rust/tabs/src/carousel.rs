//! Carousel state and block decoration.
//!
//! A [`Carousel`] wraps a [`TabController`] with deadline-based autoplay and
//! swipe input. [`CarouselBlock`] reshapes authored rows (text cell, image
//! cell) into the slider markup; rendering reads only the carousel state.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use sitekit_render::Element;
use sitekit_shared::{CarouselOptions, Result, SiteError};

use crate::controller::{ACTIVE_CLASS, TabController, TabEvent};
use crate::swipe::{SwipeResolver, TouchPoint};

/// Class showing a slide's text and image.
pub const UNHIDE_CLASS: &str = "unhide";

// ---------------------------------------------------------------------------
// Autoplay
// ---------------------------------------------------------------------------

/// Fires once per `interval`; [`Autoplay::reset`] pushes the deadline out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autoplay {
    interval: Duration,
    deadline: Instant,
}

impl Autoplay {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            deadline: now + interval,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancel the pending deadline and schedule a fresh one from `now`.
    pub fn reset(&mut self, now: Instant) {
        self.deadline = now + self.interval;
    }

    /// Whether the deadline has passed. Firing reschedules from `now`, so a
    /// late tick fires once rather than catching up.
    pub fn tick(&mut self, now: Instant) -> bool {
        if now < self.deadline {
            return false;
        }
        self.reset(now);
        true
    }
}

// ---------------------------------------------------------------------------
// Carousel
// ---------------------------------------------------------------------------

/// Input accepted by [`Carousel::handle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CarouselEvent {
    /// Dot `i` clicked.
    Select(usize),
    /// Left arrow control.
    Prev,
    /// Right arrow control.
    Next,
    Swipe { start: TouchPoint, end: TouchPoint },
}

#[derive(Debug, Clone)]
pub struct Carousel {
    slides: TabController,
    autoplay: Autoplay,
    swipe: SwipeResolver,
}

impl Carousel {
    pub fn new(len: usize, options: &CarouselOptions, now: Instant) -> Self {
        Self {
            slides: TabController::new(len),
            autoplay: Autoplay::new(options.interval, now),
            swipe: SwipeResolver::new(options.swipe_threshold),
        }
    }

    pub fn slides(&self) -> &TabController {
        &self.slides
    }

    pub fn active(&self) -> Option<usize> {
        self.slides.active()
    }

    pub fn autoplay(&self) -> &Autoplay {
        &self.autoplay
    }

    /// Apply a manual interaction. Any transition resets the autoplay timer.
    pub fn handle(&mut self, event: CarouselEvent, now: Instant) -> Option<usize> {
        let transition = match event {
            CarouselEvent::Select(i) => Some(TabEvent::Select(i)),
            CarouselEvent::Prev => Some(TabEvent::Prev),
            CarouselEvent::Next => Some(TabEvent::Next),
            CarouselEvent::Swipe { start, end } => self.swipe.resolve(start, end),
        };
        let Some(transition) = transition else {
            return self.slides.active();
        };
        self.autoplay.reset(now);
        self.slides.transition(transition)
    }

    /// Advance to the next slide when the autoplay deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.slides.len() < 2 || !self.autoplay.tick(now) {
            return false;
        }
        let active = self.slides.transition(TabEvent::Next);
        debug!(?active, "carousel autoplay");
        true
    }
}

// ---------------------------------------------------------------------------
// Block decoration
// ---------------------------------------------------------------------------

/// One authored row: a text cell and an image cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub text: Element,
    pub image: Element,
}

/// Authored carousel content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarouselBlock {
    pub slides: Vec<Slide>,
}

impl CarouselBlock {
    /// Read rows of `block` (`div > div(text) + div(image)`). Rows without
    /// both cells are skipped.
    pub fn from_block(block: Element) -> Result<Self> {
        let mut slides = Vec::new();
        for (row_index, row) in block.into_child_elements().into_iter().enumerate() {
            let mut cells = row.into_child_elements().into_iter();
            match (cells.next(), cells.next()) {
                (Some(text), Some(image)) => slides.push(Slide { text, image }),
                _ => warn!(row = row_index, "carousel row without text and image cells skipped"),
            }
        }
        if slides.is_empty() {
            return Err(SiteError::validation("carousel block has no slides"));
        }
        Ok(Self { slides })
    }

    /// Parse `html` and read the first top-level element as the block.
    pub fn from_html(html: &str) -> Result<Self> {
        let block = Element::parse_fragment(html)
            .into_iter()
            .find_map(|node| match node {
                sitekit_render::Node::Element(el) => Some(el),
                sitekit_render::Node::Text(_) => None,
            })
            .ok_or_else(|| SiteError::parse("carousel markup has no block element"))?;
        Self::from_block(block)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Render the slider for `carousel`'s current state.
    pub fn render(&self, carousel: &Carousel) -> Element {
        let state = carousel.slides();
        let active = state.active().unwrap_or(0);

        let mut texts = Vec::with_capacity(self.slides.len());
        let mut images = Vec::with_capacity(self.slides.len());
        for (i, slide) in self.slides.iter().enumerate() {
            texts.push(slide_cell(&slide.text, "text-item", i, state));
            images.push(slide_cell(&slide.image, "image-item", i, state));
        }

        let wrapper = Element::new("div")
            .class("swiper-wrapper")
            .attr(
                "style",
                format!("transform: translate3d(-{}%, 0, 0)", active * 100),
            )
            .children_from(images);

        let container = Element::new("div")
            .class("carousel-items-container")
            .child(Element::new("div").class("text").children_from(texts))
            .child(Element::new("div").class("image").child(wrapper));

        let mut dots = (0..self.slides.len())
            .map(|i| {
                Element::new("span")
                    .class("swiper-pagination-bullet")
                    .attr("index", i.to_string())
                    .attr("role", "button")
            })
            .collect::<Vec<_>>();
        state.mark(dots.iter_mut());

        let controls = Element::new("div").class("hero-slider-controller").child(
            Element::new("div")
                .class("control-container")
                .child(arrow("left"))
                .child(
                    Element::new("div")
                        .class("swip-pagination swiper-pagination-clickable swiper-pagination-bullets")
                        .children_from(dots),
                )
                .child(arrow("right")),
        );

        Element::new("div")
            .class("carousel")
            .child(container)
            .child(controls)
    }
}

fn slide_cell(cell: &Element, role: &str, index: usize, state: &TabController) -> Element {
    let mut el = cell.clone().class(role).attr("index", index.to_string());
    let on = state.is_active(index);
    el.toggle_class(ACTIVE_CLASS, on);
    el.toggle_class(UNHIDE_CLASS, on);
    el
}

fn arrow(side: &str) -> Element {
    Element::new("div")
        .class(&format!("swip-{side}"))
        .child(Element::new("span").class(&format!("icon icon-{side}")))
}
