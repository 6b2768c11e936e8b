//! Tag and category lookup from the `tags-categories` document.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use sitekit_shared::{Locale, Result, SiteError};

use crate::placeholders::PlaceholderSource;
use crate::source::SiteSource;

/// Path of the tags and categories document.
pub const TAGS_PATH: &str = "/tags-categories.json";

/// A tag or category with its localised display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: String,
    /// Classification column of the sheet, e.g. `Category` or `Tag`.
    pub kind: String,
    /// Localised name from the placeholder sheet, `""` when undefined.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TagSheet {
    #[serde(default)]
    data: Vec<TagRow>,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    #[serde(rename = "Key", default)]
    key: String,
    #[serde(rename = "Type", default)]
    kind: String,
}

/// Lookup parameters for [`TagCatalog::fetch_tags_or_categories`].
#[derive(Debug, Clone, Default)]
pub struct TagQuery<'a> {
    /// Ids to keep; empty keeps every id.
    pub ids: &'a [String],
    /// Sheet of the document; empty reads the default sheet.
    pub sheet: &'a str,
    /// Type to keep; empty keeps every type.
    pub kind: &'a str,
}

/// Per-sheet cache of tag rows over a [`SiteSource`].
pub struct TagCatalog<S, P> {
    source: Arc<S>,
    placeholders: Arc<P>,
    sheets: Mutex<HashMap<(String, String), Arc<Vec<Tag>>>>,
}

impl<S: SiteSource, P: PlaceholderSource> TagCatalog<S, P> {
    pub fn new(source: Arc<S>, placeholders: Arc<P>) -> Self {
        Self {
            source,
            placeholders,
            sheets: Mutex::new(HashMap::new()),
        }
    }

    /// Tags of `query.sheet` named in `locale`, filtered by id and type.
    ///
    /// A sheet is fetched once per locale; failures are returned and the next
    /// call fetches again.
    #[instrument(skip_all, fields(sheet = %query.sheet, kind = %query.kind, locale = %locale))]
    pub async fn fetch_tags_or_categories(
        &self,
        query: TagQuery<'_>,
        locale: &Locale,
    ) -> Result<Vec<Tag>> {
        let key = (query.sheet.to_string(), locale.code().to_string());

        let mut sheets = self.sheets.lock().await;
        let tags = match sheets.get(&key) {
            Some(tags) => Arc::clone(tags),
            None => {
                let tags = Arc::new(self.load(query.sheet, locale).await?);
                sheets.insert(key, Arc::clone(&tags));
                tags
            }
        };
        drop(sheets);

        Ok(tags
            .iter()
            .filter(|tag| query.ids.is_empty() || query.ids.contains(&tag.id))
            .filter(|tag| query.kind.is_empty() || tag.kind == query.kind)
            .cloned()
            .collect())
    }

    async fn load(&self, sheet: &str, locale: &Locale) -> Result<Vec<Tag>> {
        let placeholders = self.placeholders.placeholders(locale).await?;

        let query = if sheet.is_empty() {
            Vec::new()
        } else {
            vec![("sheet".to_string(), sheet.to_string())]
        };
        let value = self.source.fetch_document(TAGS_PATH, &query).await?;
        let parsed: TagSheet = serde_json::from_value(value)
            .map_err(|e| SiteError::parse(format!("{TAGS_PATH}: malformed tag sheet: {e}")))?;

        let tags: Vec<Tag> = parsed
            .data
            .into_iter()
            .map(|row| Tag {
                name: placeholders.text(&row.key).to_string(),
                id: row.key,
                kind: row.kind,
            })
            .collect();
        debug!(count = tags.len(), "tags loaded");
        Ok(tags)
    }
}
