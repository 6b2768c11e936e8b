//! Tabs and carousels for sitekit.
//!
//! This crate provides:
//! - [`controller`]: the single-active-index state machine
//! - [`carousel`]: autoplay, swipe handling and slider markup
//! - [`swipe`]: touch gesture resolution
//! - [`block`]: the tabs block

pub mod block;
pub mod carousel;
pub mod controller;
pub mod swipe;

pub use block::{Tab, TabsBlock};
pub use carousel::{Autoplay, Carousel, CarouselBlock, CarouselEvent, Slide};
pub use controller::{ACTIVE_CLASS, TabController, TabEvent};
pub use swipe::{SwipeResolver, TouchPoint};
