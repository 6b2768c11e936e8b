//! Markup for sitekit blocks.
//!
//! This crate provides:
//! - [`dom`]: an owned element tree that escapes text on serialization
//! - [`results`]: listing and search result entries, result-count lines
//! - [`highlight`]: injection-safe search-term emphasis
//! - [`pagination`]: the page-link control and its condensed form
//! - [`search_widget`], [`date`] and [`text`] helpers

pub mod date;
pub mod dom;
pub mod highlight;
pub mod pagination;
pub mod results;
pub mod search_widget;
pub mod text;

pub use date::{format_date, format_epoch_millis, parse_epoch_millis, year_of};
pub use dom::{Element, Node, escape};
pub use highlight::{Highlighter, set_highlighted};
pub use pagination::{
    CondensedLayout, DEFAULT_CONDENSE_LIMIT, PaginationWidget, Regime, clamp_page, set_page_param,
    total_pages,
};
pub use results::{
    CountTemplate, NEWS_TITLE_KEY, ParentTitles, ResultRenderer, listing_title, parent_path,
    search_title,
};
pub use search_widget::search_widget;
pub use text::{crop_string, first_japanese_sentence, first_sentence};
