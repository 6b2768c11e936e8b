//! Localised placeholder strings, fetched once per language.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, instrument};

use sitekit_shared::{Locale, Placeholders, Result, SiteError};

use crate::source::SiteSource;

/// Looks up the placeholder sheet for a language.
pub trait PlaceholderSource: Send + Sync {
    fn placeholders(&self, locale: &Locale) -> impl Future<Output = Result<Placeholders>> + Send;
}

#[derive(Debug, Deserialize)]
struct PlaceholderSheet {
    #[serde(default)]
    data: Vec<PlaceholderRow>,
}

#[derive(Debug, Deserialize)]
struct PlaceholderRow {
    #[serde(rename = "Key", default)]
    key: String,
    #[serde(rename = "Text", default)]
    text: String,
}

/// Path of the placeholder sheet for `locale`.
pub fn placeholders_path(locale: &Locale) -> String {
    format!("{}/placeholders.json", locale.path_prefix())
}

/// Caching [`PlaceholderSource`] over a [`SiteSource`].
///
/// Concurrent first requests for the same language share one fetch. A failed
/// fetch is not cached.
pub struct PlaceholderStore<S> {
    source: Arc<S>,
    cells: Mutex<HashMap<String, Arc<OnceCell<Placeholders>>>>,
}

impl<S: SiteSource> PlaceholderStore<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            cells: Mutex::new(HashMap::new()),
        }
    }

    async fn cell(&self, locale: &Locale) -> Arc<OnceCell<Placeholders>> {
        let mut cells = self.cells.lock().await;
        Arc::clone(cells.entry(locale.code().to_string()).or_default())
    }

    async fn load(&self, locale: &Locale) -> Result<Placeholders> {
        let path = placeholders_path(locale);
        let value = self.source.fetch_document(&path, &[]).await?;
        let sheet: PlaceholderSheet = serde_json::from_value(value)
            .map_err(|e| SiteError::parse(format!("{path}: malformed placeholder sheet: {e}")))?;

        let placeholders: Placeholders = sheet
            .data
            .into_iter()
            .filter(|row| !row.key.trim().is_empty())
            .map(|row| (row.key.trim().to_string(), row.text))
            .collect();
        debug!(locale = %locale, count = placeholders.len(), "placeholders loaded");
        Ok(placeholders)
    }
}

impl<S: SiteSource> PlaceholderSource for PlaceholderStore<S> {
    #[instrument(skip_all, fields(locale = %locale))]
    async fn placeholders(&self, locale: &Locale) -> Result<Placeholders> {
        let cell = self.cell(locale).await;
        cell.get_or_try_init(|| self.load(locale)).await.cloned()
    }
}

/// Fixed placeholders, for callers that already hold the strings.
impl PlaceholderSource for Placeholders {
    async fn placeholders(&self, _locale: &Locale) -> Result<Placeholders> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::source::HttpSource;

    fn sheet() -> serde_json::Value {
        json!({
            "data": [
                {"Key": "searchtext", "Text": "Suche"},
                {"Key": "resultstext_prefix", "Text": "Ergebnisse"},
                {"Key": "", "Text": "ignored"}
            ]
        })
    }

    #[tokio::test]
    async fn loads_localised_sheet_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/de/placeholders.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sheet())
                    .set_delay(Duration::from_millis(20)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let store = PlaceholderStore::new(Arc::new(source));
        let de = Locale::new("de");

        let (a, b) = tokio::join!(store.placeholders(&de), store.placeholders(&de));
        let a = a.unwrap();
        assert_eq!(a.text("searchtext"), "Suche");
        assert_eq!(a.len(), 2);
        assert_eq!(b.unwrap(), a);

        store.placeholders(&de).await.unwrap();
    }

    #[tokio::test]
    async fn default_language_reads_root_sheet() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/placeholders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sheet()))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let store = PlaceholderStore::new(Arc::new(source));

        let placeholders = store.placeholders(&Locale::default()).await.unwrap();
        assert_eq!(placeholders.text("resultstext_prefix"), "Ergebnisse");
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/placeholders.json"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/placeholders.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sheet()))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let store = PlaceholderStore::new(Arc::new(source));

        assert!(store.placeholders(&Locale::default()).await.is_err());
        let placeholders = store.placeholders(&Locale::default()).await.unwrap();
        assert_eq!(placeholders.text("searchtext"), "Suche");
    }

    #[test]
    fn sheet_paths() {
        assert_eq!(placeholders_path(&Locale::default()), "/placeholders.json");
        assert_eq!(placeholders_path(&Locale::new("jp")), "/jp/placeholders.json");
    }
}
