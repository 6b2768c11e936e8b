//! Incrementally loaded, request-coalescing cache of index sheets.
//!
//! Each `(index, sheet)` key owns an [`IndexEntry`] that grows one page at a
//! time. At most one page fetch per key is in flight: concurrent callers join
//! the pending fetch instead of issuing their own request. Only the
//! fetch-completion step mutates an entry, so readers in the meantime see the
//! pre-fetch snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use sitekit_shared::{IndexOptions, IndexRow, Result};

use crate::query::TabularQuery;
use crate::source::{PageRequest, SiteSource};

/// Default number of rows requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

// ---------------------------------------------------------------------------
// IndexEntry
// ---------------------------------------------------------------------------

/// Loaded state of one `(index, sheet)` key.
#[derive(Debug, Clone, Default)]
pub struct IndexEntry {
    /// Normalised rows in arrival order.
    pub rows: Arc<Vec<IndexRow>>,
    /// Offset of the next page to request.
    pub next_offset: usize,
    /// Whether the last page has arrived.
    pub complete: bool,
}

type PendingFetch = Shared<BoxFuture<'static, Result<IndexEntry>>>;

type CacheKey = (String, String);

#[derive(Default)]
struct Slot {
    entry: IndexEntry,
    pending: Option<PendingFetch>,
}

#[derive(Default)]
struct CacheState {
    /// Bumped by [`PagedIndexCache::clear`]; fetches started under an older
    /// epoch do not write back.
    epoch: u64,
    slots: HashMap<CacheKey, Slot>,
}

// ---------------------------------------------------------------------------
// PagedIndexCache
// ---------------------------------------------------------------------------

/// Session-wide index cache over a [`SiteSource`].
///
/// Cloning is cheap and clones share the same state, so one instance can be
/// handed to every block that needs index data.
pub struct PagedIndexCache<S> {
    source: Arc<S>,
    index_name: String,
    page_size: usize,
    state: Arc<Mutex<CacheState>>,
}

impl<S> Clone for PagedIndexCache<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            index_name: self.index_name.clone(),
            page_size: self.page_size,
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: SiteSource> PagedIndexCache<S> {
    /// Create a cache reading `index_name` pages of `page_size` rows.
    pub fn new(source: S, index_name: impl Into<String>, page_size: usize) -> Self {
        Self {
            source: Arc::new(source),
            index_name: index_name.into(),
            page_size: page_size.max(1),
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn from_options(source: S, opts: &IndexOptions) -> Self {
        Self::new(source, opts.index_name.clone(), opts.page_size)
    }

    /// Name of the index used by [`query_index`](Self::query_index).
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the next page of `index`/`sheet`, or return the entry as-is when
    /// it is already complete.
    ///
    /// Calls that arrive while a page is in flight await that same fetch.
    /// A failed fetch leaves the entry unchanged and is reported to every
    /// caller that joined it.
    #[instrument(skip_all, fields(index = %index, sheet = %sheet))]
    pub async fn fetch_index(&self, index: &str, sheet: &str) -> Result<IndexEntry> {
        let key = (index.to_string(), sheet.to_string());

        let pending = {
            let mut state = self.state.lock().await;
            let epoch = state.epoch;
            let slot = state.slots.entry(key.clone()).or_default();

            if slot.entry.complete {
                debug!(rows = slot.entry.rows.len(), "index already complete");
                return Ok(slot.entry.clone());
            }

            match &slot.pending {
                Some(pending) => {
                    debug!("joining in-flight fetch");
                    pending.clone()
                }
                None => {
                    let request = PageRequest {
                        index: key.0.clone(),
                        sheet: key.1.clone(),
                        limit: self.page_size,
                        offset: slot.entry.next_offset,
                    };
                    let fetch = complete_fetch(
                        Arc::clone(&self.source),
                        Arc::clone(&self.state),
                        key,
                        request,
                        epoch,
                    )
                    .boxed()
                    .shared();
                    slot.pending = Some(fetch.clone());
                    fetch
                }
            }
        };

        pending.await
    }

    /// Load every page of `sheet` in the configured index and return a query
    /// over the full row set.
    #[instrument(skip_all, fields(index = %self.index_name, sheet = %sheet))]
    pub async fn query_index(&self, sheet: &str) -> Result<TabularQuery> {
        self.query(&self.index_name.clone(), sheet).await
    }

    /// Load every page of `index`/`sheet` and return a query over it.
    pub async fn query(&self, index: &str, sheet: &str) -> Result<TabularQuery> {
        loop {
            let entry = self.fetch_index(index, sheet).await?;
            if entry.complete {
                info!(rows = entry.rows.len(), "index fully loaded");
                return Ok(TabularQuery::from(entry.rows));
            }
        }
    }

    /// Current entry for a key without fetching.
    pub async fn snapshot(&self, index: &str, sheet: &str) -> Option<IndexEntry> {
        let state = self.state.lock().await;
        state
            .slots
            .get(&(index.to_string(), sheet.to_string()))
            .map(|slot| slot.entry.clone())
    }

    /// Whether every page of `index`/`sheet` has been loaded.
    pub async fn is_complete(&self, index: &str, sheet: &str) -> bool {
        self.snapshot(index, sheet)
            .await
            .is_some_and(|entry| entry.complete)
    }

    /// Drop every entry. In-flight fetches still resolve for their callers
    /// but no longer write into the cache.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        state.slots.clear();
        debug!(epoch = state.epoch, "index cache cleared");
    }
}

/// Fetch one page and fold it into the slot for `key`.
async fn complete_fetch<S: SiteSource>(
    source: Arc<S>,
    state: Arc<Mutex<CacheState>>,
    key: CacheKey,
    request: PageRequest,
    epoch: u64,
) -> Result<IndexEntry> {
    debug!(offset = request.offset, limit = request.limit, "fetching index page");
    let outcome = source.fetch_page(&request).await;

    let mut state = state.lock().await;
    let current = state.epoch == epoch;
    let slot = if current {
        state.slots.get_mut(&key)
    } else {
        None
    };

    let page = match outcome {
        Ok(page) => page,
        Err(err) => {
            warn!(index = %request.index, sheet = %request.sheet, error = %err, "index page fetch failed");
            if let Some(slot) = slot {
                slot.pending = None;
            }
            return Err(err);
        }
    };

    let fetched = page.data.len();
    let mut complete = page.is_last();
    if fetched == 0 && !complete {
        warn!(
            index = %request.index,
            offset = request.offset,
            total = page.total,
            "empty page before end of sheet, treating sheet as complete"
        );
        complete = true;
    }

    let mut rows = match &slot {
        Some(slot) => Arc::clone(&slot.entry.rows),
        None => Arc::default(),
    };
    Arc::make_mut(&mut rows).extend(page.data.into_iter().map(|mut row| {
        row.normalize();
        row
    }));

    let entry = IndexEntry {
        rows,
        next_offset: request.offset + fetched,
        complete,
    };
    debug!(
        fetched,
        rows = entry.rows.len(),
        total = page.total,
        complete,
        "index page merged"
    );

    if let Some(slot) = slot {
        slot.entry = entry.clone();
        slot.pending = None;
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::{Value, json};
    use sitekit_shared::{Field, IndexPage, SiteError};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::source::HttpSource;

    /// Serves pre-built pages by offset and counts requests.
    struct ScriptedSource {
        pages: Vec<IndexPage>,
        calls: AtomicUsize,
        failures: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(pages: Vec<IndexPage>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                failures: AtomicUsize::new(0),
                delay: Duration::from_millis(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing_first(self, n: usize) -> Self {
            self.failures.store(n, Ordering::SeqCst);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SiteSource for ScriptedSource {
        async fn fetch_document(&self, path: &str, _query: &[(String, String)]) -> Result<Value> {
            Err(SiteError::Network(format!("{path}: not scripted")))
        }

        async fn fetch_page(&self, request: &PageRequest) -> Result<IndexPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SiteError::Http {
                    status: 503,
                    url: request.path(),
                });
            }
            self.pages
                .iter()
                .find(|p| p.offset == request.offset)
                .cloned()
                .ok_or_else(|| SiteError::Network(format!("no page at {}", request.offset)))
        }
    }

    fn page(total: usize, offset: usize, paths: &[&str]) -> IndexPage {
        IndexPage {
            total,
            offset,
            limit: paths.len(),
            data: paths
                .iter()
                .map(|p| [("path", json!(p)), ("description", json!("0"))].into_iter().collect())
                .collect(),
        }
    }

    fn paths(entry: &IndexEntry) -> Vec<&str> {
        entry.rows.iter().map(IndexRow::path).collect()
    }

    #[tokio::test]
    async fn completed_entry_is_served_without_fetching() {
        let source = ScriptedSource::new(vec![page(5, 0, &["/a", "/b", "/c", "/d", "/e"])]);
        let cache = PagedIndexCache::new(source, "query-index", 5);

        let first = cache.fetch_index("query-index", "").await.unwrap();
        assert!(first.complete);
        assert_eq!(cache.source().calls(), 1);

        let second = cache.fetch_index("query-index", "").await.unwrap();
        assert_eq!(cache.source().calls(), 1);
        assert!(Arc::ptr_eq(&first.rows, &second.rows));
        assert!(cache.is_complete("query-index", "").await);
    }

    #[tokio::test]
    async fn pages_accumulate_in_order() {
        let source = ScriptedSource::new(vec![page(4, 0, &["A", "B"]), page(4, 2, &["C", "D"])]);
        let cache = PagedIndexCache::new(source, "query-index", 2);

        let first = cache.fetch_index("query-index", "en-search").await.unwrap();
        assert_eq!(paths(&first), ["A", "B"]);
        assert_eq!(first.next_offset, 2);
        assert!(!first.complete);

        let second = cache.fetch_index("query-index", "en-search").await.unwrap();
        assert_eq!(paths(&second), ["A", "B", "C", "D"]);
        assert!(second.complete);

        // The earlier snapshot is not disturbed by the merge.
        assert_eq!(first.rows.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_fetch() {
        let source = ScriptedSource::new(vec![page(2, 0, &["/x", "/y"])])
            .with_delay(Duration::from_millis(20));
        let cache = PagedIndexCache::new(source, "x", 10);

        let (a, b) = tokio::join!(cache.fetch_index("x", "y"), cache.fetch_index("x", "y"));

        assert_eq!(cache.source().calls(), 1);
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(paths(&a), ["/x", "/y"]);
        assert!(Arc::ptr_eq(&a.rows, &b.rows));
    }

    #[tokio::test]
    async fn concurrent_calls_from_separate_tasks_share_one_fetch() {
        let source =
            ScriptedSource::new(vec![page(1, 0, &["/x"])]).with_delay(Duration::from_millis(20));
        let cache = PagedIndexCache::new(source, "x", 10);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.fetch_index("x", "y").await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().complete);
        }
        assert_eq!(cache.source().calls(), 1);
    }

    #[tokio::test]
    async fn rows_are_normalized_on_ingestion() {
        let source = ScriptedSource::new(vec![page(1, 0, &["/a"])]);
        let cache = PagedIndexCache::new(source, "query-index", 10);

        let entry = cache.fetch_index("query-index", "").await.unwrap();
        assert_eq!(entry.rows[0].get(Field::Description), None);
        assert_eq!(entry.rows[0].value("description"), Some(&json!("")));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_entry_unchanged() {
        let source = ScriptedSource::new(vec![page(2, 0, &["A", "B"])]).failing_first(1);
        let cache = PagedIndexCache::new(source, "query-index", 2);

        let err = cache.fetch_index("query-index", "").await.unwrap_err();
        assert!(matches!(err, SiteError::Http { status: 503, .. }));

        let snapshot = cache.snapshot("query-index", "").await.unwrap();
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.next_offset, 0);

        // No retry happened on its own; the next call fetches again.
        assert_eq!(cache.source().calls(), 1);
        let entry = cache.fetch_index("query-index", "").await.unwrap();
        assert_eq!(paths(&entry), ["A", "B"]);
        assert_eq!(cache.source().calls(), 2);
    }

    #[tokio::test]
    async fn query_index_loads_every_page() {
        let source = ScriptedSource::new(vec![
            page(5, 0, &["A", "B"]),
            page(5, 2, &["C", "D"]),
            page(5, 4, &["E"]),
        ]);
        let cache = PagedIndexCache::new(source, "query-index", 2);

        let query = cache.query_index("").await.unwrap();
        let rows = query.to_list();
        assert_eq!(
            rows.iter().map(IndexRow::path).collect::<Vec<_>>(),
            ["A", "B", "C", "D", "E"]
        );
        assert_eq!(cache.source().calls(), 3);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let source = ScriptedSource::new(vec![page(1, 0, &["/a"])]);
        let cache = PagedIndexCache::new(source, "query-index", 10);

        cache.fetch_index("query-index", "en-search").await.unwrap();
        cache.fetch_index("query-index", "de-search").await.unwrap();
        assert_eq!(cache.source().calls(), 2);
        assert!(!cache.is_complete("query-index", "").await);
    }

    #[tokio::test]
    async fn clear_forgets_loaded_entries() {
        let source = ScriptedSource::new(vec![page(1, 0, &["/a"])]);
        let cache = PagedIndexCache::new(source, "query-index", 10);

        cache.fetch_index("query-index", "").await.unwrap();
        cache.clear().await;
        assert!(cache.snapshot("query-index", "").await.is_none());

        cache.fetch_index("query-index", "").await.unwrap();
        assert_eq!(cache.source().calls(), 2);
    }

    #[tokio::test]
    async fn empty_page_ends_the_sheet() {
        let source = ScriptedSource::new(vec![IndexPage {
            total: 10,
            offset: 0,
            limit: 0,
            data: vec![],
        }]);
        let cache = PagedIndexCache::new(source, "query-index", 5);

        let query = cache.query_index("").await.unwrap();
        assert!(query.is_empty());
        assert_eq!(cache.source().calls(), 1);
    }

    // -----------------------------------------------------------------------
    // Against a mock HTTP endpoint
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn http_concurrent_requests_hit_endpoint_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/query-index.json"))
            .and(query_param("sheet", "en-search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "total": 1, "offset": 0, "limit": 1,
                        "data": [{"path": "/only"}]
                    }))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let cache = PagedIndexCache::new(source, "query-index", 1000);

        let (a, b) = tokio::join!(
            cache.fetch_index("query-index", "en-search"),
            cache.fetch_index("query-index", "en-search")
        );
        assert!(a.unwrap().complete);
        assert!(b.unwrap().complete);

        // Complete now, so this must not reach the server either.
        cache.fetch_index("query-index", "en-search").await.unwrap();
    }

    #[tokio::test]
    async fn http_pages_are_requested_at_growing_offsets() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/query-index.json"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 3, "offset": 0, "limit": 2,
                "data": [{"path": "/a"}, {"path": "/b"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/query-index.json"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 3, "offset": 2, "limit": 1,
                "data": [{"path": "/c"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let cache = PagedIndexCache::new(source, "query-index", 2);

        let query = cache.query_index("").await.unwrap();
        assert_eq!(query.len(), 3);
    }

    #[tokio::test]
    async fn http_error_reaches_every_waiter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/query-index.json"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(30)))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let cache = PagedIndexCache::new(source, "query-index", 10);

        let (a, b) = tokio::join!(
            cache.fetch_index("query-index", ""),
            cache.fetch_index("query-index", "")
        );
        assert!(matches!(a, Err(SiteError::Http { status: 500, .. })));
        assert!(matches!(b, Err(SiteError::Http { status: 500, .. })));
    }
}
