//! Application configuration for sitekit.
//!
//! User config lives at `~/.sitekit/sitekit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitekit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitekit";

// ---------------------------------------------------------------------------
// Config structs (matching sitekit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which site to talk to and which locales it serves.
    #[serde(default)]
    pub site: SiteConfig,

    /// Index endpoint paging.
    #[serde(default)]
    pub index: IndexConfig,

    /// Search results block.
    #[serde(default)]
    pub search: SearchConfig,

    /// News list block.
    #[serde(default)]
    pub list: ListConfig,

    /// Newsroom feed block.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Carousel timing and gestures.
    #[serde(default)]
    pub carousel: CarouselConfig,

    /// Responsive breakpoints.
    #[serde(default)]
    pub viewport: ViewportConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin the index and placeholder documents are served from.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the content index document (without `.json`).
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Locale used when the path carries no language segment.
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Language path segments the site recognises.
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_name: default_index_name(),
            default_locale: default_locale(),
            locales: default_locales(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}
fn default_index_name() -> String {
    "query-index".into()
}
fn default_locale() -> String {
    "en".into()
}
fn default_locales() -> Vec<String> {
    ["en", "de", "cn", "th", "id", "it", "jp"]
        .iter()
        .map(|l| (*l).to_string())
        .collect()
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Rows requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_page_size() -> usize {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_per_page")]
    pub results_per_page: usize,

    /// Page count above which the pagination collapses into ellipses.
    #[serde(default = "default_pagination_limit")]
    pub pagination_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_page: default_search_per_page(),
            pagination_limit: default_pagination_limit(),
        }
    }
}

fn default_search_per_page() -> usize {
    10
}
fn default_pagination_limit() -> usize {
    5
}

/// `[list]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default = "default_list_per_page")]
    pub results_per_page: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            results_per_page: default_list_per_page(),
        }
    }
}

fn default_list_per_page() -> usize {
    12
}

/// `[feed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Cards added per "view more" click.
    #[serde(default = "default_chunk")]
    pub chunk: usize,

    /// Rows dated in or before this year are dropped.
    #[serde(default = "default_min_year")]
    pub min_year: i32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            chunk: default_chunk(),
            min_year: default_min_year(),
        }
    }
}

fn default_chunk() -> usize {
    15
}
fn default_min_year() -> i32 {
    2000
}

/// `[carousel]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Autoplay interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Minimum horizontal travel (px) before a swipe counts.
    #[serde(default)]
    pub swipe_threshold: f64,

    /// Upper bound on navigation dots for the career carousel.
    #[serde(default = "default_max_nav_buttons")]
    pub max_nav_buttons: usize,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            swipe_threshold: 0.0,
            max_nav_buttons: default_max_nav_buttons(),
        }
    }
}

fn default_interval_ms() -> u64 {
    5000
}
fn default_max_nav_buttons() -> usize {
    10
}

/// `[viewport]` section. Widths are CSS pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// At or above this width the menu is driven by hover, not clicks (77rem).
    #[serde(default = "default_wide_min_width")]
    pub wide_min_width: f64,

    /// At or above this width (and below `wide_min_width`) the device is a tablet.
    #[serde(default = "default_tablet_min_width")]
    pub tablet_min_width: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            wide_min_width: default_wide_min_width(),
            tablet_min_width: default_tablet_min_width(),
        }
    }
}

fn default_wide_min_width() -> f64 {
    1232.0
}
fn default_tablet_min_width() -> f64 {
    768.0
}

// ---------------------------------------------------------------------------
// Runtime options (derived from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime index client configuration.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Site origin, e.g. `https://www.example.com`.
    pub base_url: String,
    /// Index document name.
    pub index_name: String,
    /// Rows per page request.
    pub page_size: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl From<&AppConfig> for IndexOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.site.base_url.clone(),
            index_name: config.site.index_name.clone(),
            page_size: config.index.page_size,
            timeout: Duration::from_secs(config.index.timeout_secs),
        }
    }
}

/// Runtime carousel configuration.
#[derive(Debug, Clone)]
pub struct CarouselOptions {
    pub interval: Duration,
    pub swipe_threshold: f64,
    pub max_nav_buttons: usize,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CarouselOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.carousel.interval_ms),
            swipe_threshold: config.carousel.swipe_threshold,
            max_nav_buttons: config.carousel.max_nav_buttons,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitekit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SiteError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitekit/sitekit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| SiteError::config(format!("failed to parse {}: {e}", path.display())))?;
    validate(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SiteError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| SiteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make paging or pagination meaningless.
pub fn validate(config: &AppConfig) -> Result<()> {
    if config.index.page_size == 0 {
        return Err(SiteError::config("index.page_size must be at least 1"));
    }
    if config.search.results_per_page == 0 || config.list.results_per_page == 0 {
        return Err(SiteError::config("results_per_page must be at least 1"));
    }
    if config.feed.chunk == 0 {
        return Err(SiteError::config("feed.chunk must be at least 1"));
    }
    if config.viewport.tablet_min_width > config.viewport.wide_min_width {
        return Err(SiteError::config(
            "viewport.tablet_min_width must not exceed viewport.wide_min_width",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("index_name"));
        assert!(toml_str.contains("query-index"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.index.page_size, 1000);
        assert_eq!(parsed.search.pagination_limit, 5);
        assert_eq!(parsed.site.locales.len(), 7);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[site]
base_url = "https://www.example.com"

[search]
results_per_page = 20
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.site.base_url, "https://www.example.com");
        assert_eq!(config.site.index_name, "query-index");
        assert_eq!(config.search.results_per_page, 20);
        assert_eq!(config.search.pagination_limit, 5);
        assert_eq!(config.carousel.interval_ms, 5000);
    }

    #[test]
    fn index_options_from_app_config() {
        let app = AppConfig::default();
        let opts = IndexOptions::from(&app);
        assert_eq!(opts.page_size, 1000);
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.index_name, "query-index");
    }

    #[test]
    fn validation_rejects_zero_page_size() {
        let mut config = AppConfig::default();
        config.index.page_size = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join(format!("sitekit-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sitekit.toml");
        std::fs::write(&path, "[feed]\nchunk = 6\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.feed.chunk, 6);
        assert_eq!(config.feed.min_year, 2000);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
