//! Date cells of the index: epoch milliseconds rendered per language.

use chrono::{DateTime, Datelike, Utc};
use tracing::warn;

use sitekit_index::parse_int_prefix;
use sitekit_shared::Locale;

/// Parse a date cell holding epoch milliseconds.
pub fn parse_epoch_millis(raw: &str) -> Option<DateTime<Utc>> {
    let millis = parse_int_prefix(raw)?;
    let parsed = DateTime::from_timestamp_millis(millis);
    if parsed.is_none() {
        warn!(raw, "date cell out of range");
    }
    parsed
}

/// Render a date the way the site shows it for `locale`.
pub fn format_date(date: &DateTime<Utc>, locale: &Locale) -> String {
    let pattern = match locale.code() {
        "jp" | "ja" | "cn" => "%Y年%-m月%-d日",
        "de" => "%d.%m.%Y",
        "it" => "%-d/%-m/%Y",
        "th" | "id" => "%-d %b %Y",
        _ => "%b %-d, %Y",
    };
    date.format(pattern).to_string()
}

/// Render an epoch-millisecond cell, or `None` when it is not a date.
pub fn format_epoch_millis(raw: &str, locale: &Locale) -> Option<String> {
    parse_epoch_millis(raw).map(|date| format_date(&date, locale))
}

/// Calendar year of an epoch-millisecond cell.
pub fn year_of(raw: &str) -> Option<i32> {
    parse_epoch_millis(raw).map(|date| date.year())
}
