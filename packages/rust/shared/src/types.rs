//! Core domain types: index rows, navigation nodes, page state and placeholders.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// IndexRow
// ---------------------------------------------------------------------------

/// Fields of an index row that sitekit reads by name.
///
/// Rows may carry any number of other columns; those stay reachable through
/// [`IndexRow::text`] and [`IndexRow::value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Path,
    Title,
    PageName,
    BreadcrumbTitle,
    Description,
    NewsDate,
    PublishedDate,
    Type,
    Category,
    PageType,
    Image,
    Tags,
}

impl Field {
    /// Column name as it appears in the index JSON.
    pub fn key(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Title => "title",
            Self::PageName => "pagename",
            Self::BreadcrumbTitle => "breadcrumbtitle",
            Self::Description => "description",
            Self::NewsDate => "newsdate",
            Self::PublishedDate => "publisheddate",
            Self::Type => "type",
            Self::Category => "category",
            Self::PageType => "pagetype",
            Self::Image => "image",
            Self::Tags => "tags",
        }
    }
}

/// One row of a content index: column name to JSON value.
///
/// Rows coming off the wire must pass through [`IndexRow::normalize`] exactly
/// once; the index cache does this at ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRow(Map<String, Value>);

impl IndexRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace string cells holding exactly `"0"` with `""`.
    ///
    /// The spreadsheet export behind the index fills empty cells of filtered
    /// sheets with `"0"`. Non-string values (a numeric `0`) are left alone.
    pub fn normalize(&mut self) {
        for value in self.0.values_mut() {
            if matches!(value, Value::String(s) if s == "0") {
                *value = Value::String(String::new());
            }
        }
    }

    /// Non-empty string value of a recognised field.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.str_value(field.key())
    }

    /// Non-empty string value of any column.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text of any column: strings as-is, numbers and booleans rendered.
    pub fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.0.get(key)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Raw JSON value of any column.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The row's `path`, or `""` when absent.
    pub fn path(&self) -> &str {
        self.get(Field::Path).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for IndexRow
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One page of the index endpoint:
/// `GET /{index}.json?limit=&offset=&sheet=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexPage {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub data: Vec<IndexRow>,
}

impl IndexPage {
    /// Whether this page reaches the end of the sheet.
    ///
    /// The endpoint echoes a `limit` clipped to the rows it returned, so the
    /// last page satisfies `offset + limit == total`. A server that echoes the
    /// requested limit instead overshoots `total`, which also ends the sheet.
    pub fn is_last(&self) -> bool {
        self.offset + self.limit >= self.total
    }
}

// ---------------------------------------------------------------------------
// NavNode
// ---------------------------------------------------------------------------

/// One record of the navigation tree document (`/nav-tree.json?sheet={lang}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    /// Display name, also the id children refer to.
    pub category: String,
    /// `category` of the parent node, compared case-insensitively.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image: Option<String>,
    /// Authoring hint; children are discovered by `parent` regardless.
    #[serde(rename = "hasChild", default, deserialize_with = "flag")]
    pub has_child: bool,
}

impl NavNode {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether `other` names this node as its parent.
    pub fn is_parent_of(&self, other: &NavNode) -> bool {
        other
            .parent
            .as_deref()
            .is_some_and(|p| p.to_lowercase() == self.category.to_lowercase())
    }
}

/// Root of the navigation tree document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavTreeDocument {
    #[serde(default)]
    pub data: Vec<NavNode>,
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

// ---------------------------------------------------------------------------
// PageState
// ---------------------------------------------------------------------------

/// Paging and search state carried in the URL query (`pg`, `s`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    /// 0-based page index.
    pub current_page: usize,
    /// Raw, URL-decoded search term.
    pub search_term: Option<String>,
}

impl PageState {
    /// Parse from a query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let mut current_page = None;
        let mut search_term = None;

        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "pg" if current_page.is_none() => current_page = Some(parse_page(&value)),
                "s" if search_term.is_none() => search_term = Some(value.into_owned()),
                _ => {}
            }
        }

        Self {
            current_page: current_page.unwrap_or(0),
            search_term,
        }
    }
}

/// Leading-digits integer parse; anything else (or a negative) is page 0.
fn parse_page(raw: &str) -> usize {
    let digits: String = raw
        .trim_start()
        .trim_start_matches('+')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

/// Localised user-facing strings keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders(HashMap<String, String>);

impl Placeholders {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `""` when the sheet does not define it.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Placeholders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_blanks_string_zeroes_only() {
        let mut first: IndexRow = serde_json::from_value(json!({
            "unrelated": 0,
            "description": "0",
            "breadcrumbtitle": "0",
            "newsdate": "0",
        }))
        .unwrap();
        let mut second: IndexRow = serde_json::from_value(json!({
            "unrelated": 0,
            "description": "0 Mydesc 0",
            "breadcrumbtitle": "",
            "newsdate": "12345",
        }))
        .unwrap();

        first.normalize();
        second.normalize();

        assert_eq!(first.value("unrelated"), Some(&json!(0)));
        assert_eq!(first.value("description"), Some(&json!("")));
        assert_eq!(first.value("breadcrumbtitle"), Some(&json!("")));
        assert_eq!(first.value("newsdate"), Some(&json!("")));
        assert_eq!(first.get(Field::Description), None);

        assert_eq!(second.value("unrelated"), Some(&json!(0)));
        assert_eq!(second.get(Field::Description), Some("0 Mydesc 0"));
        assert_eq!(second.get(Field::NewsDate), Some("12345"));
    }

    #[test]
    fn text_renders_numbers() {
        let row: IndexRow = [("lastModified", json!(1685443971)), ("title", json!("x"))]
            .into_iter()
            .collect();
        assert_eq!(row.text("lastModified").as_deref(), Some("1685443971"));
        assert_eq!(row.text("title").as_deref(), Some("x"));
        assert_eq!(row.text("missing"), None);
        assert_eq!(row.path(), "");
    }

    #[test]
    fn index_page_completion() {
        let page: IndexPage =
            serde_json::from_str(r#"{"total":4,"offset":2,"limit":2,"data":[]}"#).unwrap();
        assert!(page.is_last());
        let page: IndexPage =
            serde_json::from_str(r#"{"total":4,"offset":0,"limit":2,"data":[]}"#).unwrap();
        assert!(!page.is_last());
        let page: IndexPage =
            serde_json::from_str(r#"{"total":5,"offset":0,"limit":1000,"data":[]}"#).unwrap();
        assert!(page.is_last());
    }

    #[test]
    fn nav_node_deserializes_sheet_strings() {
        let doc: NavTreeDocument = serde_json::from_str(
            r#"{"data":[
                {"category":"Brand","parent":"","link":"/brand","hasChild":"true"},
                {"category":"Oral Care","parent":"brand","link":"","hasChild":"false"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(doc.data.len(), 2);
        assert!(doc.data[0].is_root());
        assert!(doc.data[0].has_child);
        assert_eq!(doc.data[1].link, None);
        assert!(doc.data[0].is_parent_of(&doc.data[1]));
    }

    #[test]
    fn page_state_from_query() {
        let state = PageState::from_query("?s=e+a&pg=1");
        assert_eq!(state.search_term.as_deref(), Some("e a"));
        assert_eq!(state.current_page, 1);

        let state = PageState::from_query("?");
        assert_eq!(state.current_page, 0);
        assert_eq!(state.search_term, None);

        assert_eq!(PageState::from_query("pg=abc").current_page, 0);
        assert_eq!(PageState::from_query("pg=-3").current_page, 0);
        assert_eq!(PageState::from_query("pg=12xyz").current_page, 12);
        assert_eq!(
            PageState::from_query("s=caf%C3%A9").search_term.as_deref(),
            Some("café")
        );
    }

    #[test]
    fn placeholders_default_to_empty() {
        let placeholders: Placeholders = [("searchtext", "Search")].into_iter().collect();
        assert_eq!(placeholders.text("searchtext"), "Search");
        assert_eq!(placeholders.text("missing"), "");
        assert_eq!(placeholders.get("missing"), None);
    }
}
