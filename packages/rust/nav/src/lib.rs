//! Header navigation for sitekit.
//!
//! This crate provides:
//! - [`tree`]: building the mega-menu from the flat nav-tree sheet
//! - [`menu`]: the click/back/resize state machine and its rendering
//! - [`document`]: loading the nav-tree document

pub mod document;
pub mod menu;
pub mod tree;

pub use document::{NAV_TREE_PATH, fetch_nav_tree};
pub use menu::{
    BACK_LABEL_KEY, DeviceClass, Handled, ItemState, MenuController, MenuEvent, MenuLabels,
    TOGGLER_LABEL_KEY, Viewport,
};
pub use tree::{MAX_DEPTH, NavItem, NavTree, NavTreeBuilder};
