//! Where index pages and other site JSON documents come from.
//!
//! [`SiteSource`] is the seam the cache, placeholder and tag lookups fetch
//! through. [`HttpSource`] is the production implementation; tests swap in
//! scripted sources or point `HttpSource` at a mock server.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use sitekit_shared::{IndexOptions, IndexPage, Result, SiteError};

/// User-Agent string for site requests.
const USER_AGENT: &str = concat!("sitekit/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// One page request against an index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Index document name, e.g. `query-index`.
    pub index: String,
    /// Sheet within the document; empty means the default sheet.
    pub sheet: String,
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    /// Site-absolute path of the index document.
    pub fn path(&self) -> String {
        format!("/{}.json", self.index)
    }

    /// Query pairs in endpoint order: `limit`, `offset`, then `sheet` if set.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        if !self.sheet.is_empty() {
            pairs.push(("sheet".to_string(), self.sheet.clone()));
        }
        pairs
    }
}

/// Fetches JSON documents from the site.
pub trait SiteSource: Send + Sync + 'static {
    /// GET a site-absolute `path` with `query` pairs and decode the body as JSON.
    ///
    /// A non-success status is an error; there is no retry.
    fn fetch_document(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Fetch one page of an index document.
    fn fetch_page(&self, request: &PageRequest) -> impl Future<Output = Result<IndexPage>> + Send {
        async move {
            let value = self
                .fetch_document(&request.path(), &request.query())
                .await?;
            serde_json::from_value(value).map_err(|e| {
                SiteError::parse(format!("{}: malformed index page: {e}", request.path()))
            })
        }
    }
}

// ---------------------------------------------------------------------------
// HttpSource
// ---------------------------------------------------------------------------

/// `reqwest`-backed [`SiteSource`] rooted at the site origin.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    /// Create a source for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| SiteError::validation(format!("invalid base URL '{base_url}': {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| SiteError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    /// Create a source from runtime index options.
    pub fn from_options(opts: &IndexOptions) -> Result<Self> {
        Self::new(&opts.base_url, opts.timeout)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| SiteError::validation(format!("invalid path '{path}': {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

impl SiteSource for HttpSource {
    async fn fetch_document(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = self.url_for(path, query)?;
        debug!(%url, "fetching document");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SiteError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "non-success response");
            return Err(SiteError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SiteError::parse(format!("{url}: invalid JSON body: {e}")))
    }
}
