//! Site language derived from the URL path.

use std::fmt;

/// Language code used when a path has no recognised language segment.
pub const DEFAULT_LOCALE: &str = "en";

/// A site language such as `en`, `de` or `jp`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Take the first path segment when it names a known language, else `en`.
    pub fn from_path(path: &str, known: &[String]) -> Self {
        let first = path.split('/').nth(1).unwrap_or("");
        if known.iter().any(|k| k == first) {
            Self(first.to_string())
        } else {
            Self::default()
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LOCALE
    }

    pub fn is_japanese(&self) -> bool {
        matches!(self.0.as_str(), "jp" | "ja")
    }

    pub fn is_chinese(&self) -> bool {
        self.0 == "cn"
    }

    /// `""` for the default language, `/{code}` otherwise.
    pub fn path_prefix(&self) -> String {
        if self.is_default() {
            String::new()
        } else {
            format!("/{}", self.0)
        }
    }

    /// Prefix a site-absolute path with the language segment.
    pub fn localized_path(&self, path: &str) -> String {
        format!("{}{path}", self.path_prefix())
    }

    /// Index sheet holding this language's searchable pages.
    pub fn search_sheet(&self) -> String {
        format!("{}-search", self.0)
    }

    /// Sheet prefix for per-language sheets that omit the default language.
    pub fn sheet_prefix(&self) -> String {
        if self.is_default() {
            String::new()
        } else {
            format!("{}-", self.0)
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(DEFAULT_LOCALE.to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
