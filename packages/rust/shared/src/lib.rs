//! Shared types, error model, and configuration for sitekit.
//!
//! This crate is the foundation depended on by all other sitekit crates.
//! It provides:
//! - [`SiteError`], the unified error type
//! - Domain types ([`IndexRow`], [`NavNode`], [`PageState`], [`Placeholders`], [`Locale`])
//! - Configuration ([`AppConfig`], [`IndexOptions`], config loading)

pub mod config;
pub mod error;
pub mod locale;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CarouselConfig, CarouselOptions, FeedConfig, IndexConfig, IndexOptions, ListConfig,
    SearchConfig, SiteConfig, ViewportConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate,
};
pub use error::{Result, SiteError};
pub use locale::{DEFAULT_LOCALE, Locale};
pub use types::{
    Field, IndexPage, IndexRow, NavNode, NavTreeDocument, PageState, Placeholders,
};
