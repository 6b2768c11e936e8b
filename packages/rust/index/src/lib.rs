//! Content index client for sitekit.
//!
//! This crate provides:
//! - [`source`]: the [`SiteSource`] seam and its HTTP implementation
//! - [`cache`]: [`PagedIndexCache`], incremental and request-coalescing
//! - [`query`]: [`TabularQuery`] filtering and ordering over loaded rows
//! - [`placeholders`] and [`tags`]: localised string and tag lookups

pub mod cache;
pub mod placeholders;
pub mod query;
pub mod source;
pub mod tags;

pub use cache::{DEFAULT_PAGE_SIZE, IndexEntry, PagedIndexCache};
pub use placeholders::{PlaceholderSource, PlaceholderStore, placeholders_path};
pub use query::{Direction, SortKey, TabularQuery, parse_int_prefix};
pub use source::{HttpSource, PageRequest, SiteSource};
pub use tags::{TAGS_PATH, Tag, TagCatalog, TagQuery};
