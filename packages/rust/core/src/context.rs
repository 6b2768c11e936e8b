//! What every block pipeline needs: the index cache, placeholder and tag
//! lookups, configuration, and the location being decorated.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use sitekit_index::{HttpSource, PagedIndexCache, PlaceholderStore, SiteSource, TagCatalog};
use sitekit_shared::{AppConfig, IndexOptions, IndexRow, Locale, Result, SiteError};

/// Path and query of the page a block is decorated on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    /// Query string without the leading `?`.
    pub query: String,
}

impl Location {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into().trim_start_matches('?').to_string(),
        }
    }

    /// Parse an absolute URL or a site-relative `/path?query`.
    pub fn parse(raw: &str) -> Result<Self> {
        let base = Url::parse("http://localhost/").map_err(|e| SiteError::parse(e.to_string()))?;
        let url = base
            .join(raw)
            .map_err(|e| SiteError::validation(format!("invalid location '{raw}': {e}")))?;
        Ok(Self::new(url.path(), url.query().unwrap_or("")))
    }
}

/// How much of an index sheet a pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadScope {
    /// One page request, as a page load does.
    #[default]
    FirstPage,
    /// Every page of the sheet.
    All,
}

/// Shared services handed to every pipeline.
pub struct SiteContext<S> {
    pub config: AppConfig,
    pub cache: PagedIndexCache<S>,
    pub placeholders: Arc<PlaceholderStore<S>>,
    pub tags: TagCatalog<S, PlaceholderStore<S>>,
}

impl<S: SiteSource + Clone> SiteContext<S> {
    pub fn new(source: S, config: AppConfig) -> Self {
        let shared = Arc::new(source.clone());
        let placeholders = Arc::new(PlaceholderStore::new(Arc::clone(&shared)));
        let cache = PagedIndexCache::from_options(source, &IndexOptions::from(&config));
        let tags = TagCatalog::new(shared, Arc::clone(&placeholders));
        Self {
            config,
            cache,
            placeholders,
            tags,
        }
    }
}

impl SiteContext<HttpSource> {
    /// Context fetching over HTTP from `config.site.base_url`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let source = HttpSource::from_options(&IndexOptions::from(&config))?;
        Ok(Self::new(source, config))
    }
}

impl<S: SiteSource> SiteContext<S> {
    /// Language of `location`, from its first path segment.
    pub fn locale_for(&self, location: &Location) -> Locale {
        Locale::from_path(&location.path, &self.config.site.locales)
    }

    /// Rows of `sheet` in the configured index.
    pub async fn load_rows(&self, sheet: &str, scope: LoadScope) -> Result<Arc<Vec<IndexRow>>> {
        match scope {
            LoadScope::FirstPage => {
                let entry = self.cache.fetch_index(self.cache.index_name(), sheet).await?;
                debug!(sheet, rows = entry.rows.len(), complete = entry.complete, "rows loaded");
                Ok(entry.rows)
            }
            LoadScope::All => {
                let query = self.cache.query_index(sheet).await?;
                Ok(Arc::new(query.to_list()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Serve `rows` as the single page of `sheet` in `query-index.json`.
    pub async fn mount_sheet(server: &MockServer, sheet: &str, rows: Value) {
        let total = rows.as_array().map_or(0, Vec::len);
        Mock::given(method("GET"))
            .and(path("/query-index.json"))
            .and(query_param("sheet", sheet))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": total,
                "offset": 0,
                "limit": 1000,
                "data": rows,
            })))
            .mount(server)
            .await;
    }

    /// Serve `pairs` as the placeholder sheet at `placeholders_path`.
    pub async fn mount_placeholders(server: &MockServer, at: &str, pairs: &[(&str, &str)]) {
        let data = pairs
            .iter()
            .map(|(k, v)| json!({ "Key": k, "Text": v }))
            .collect::<Vec<_>>();
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(server)
            .await;
    }

    pub fn context(server: &MockServer) -> SiteContext<HttpSource> {
        let mut config = AppConfig::default();
        config.site.base_url = server.uri();
        let source = HttpSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        SiteContext::new(source, config)
    }
}
