//! In-memory query surface over a fully loaded index.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

use sitekit_shared::IndexRow;

/// Sort direction for [`TabularQuery::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Extracted sort key.
///
/// Keys that parse as a base-10 integer compare numerically. Anything else
/// (including a missing value) is text and sorts after every number in both
/// directions; text keys compare lexicographically among themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Number(i64),
    Text(String),
}

impl SortKey {
    /// Classify a raw cell value the way an integer parse of it would.
    pub fn from_text(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or("");
        match parse_int_prefix(raw) {
            Some(n) => Self::Number(n),
            None => Self::Text(raw.to_string()),
        }
    }

    fn compare(&self, other: &Self, direction: Direction) -> Ordering {
        let ordered = |o: Ordering| match direction {
            Direction::Ascending => o,
            Direction::Descending => o.reverse(),
        };
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => ordered(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => ordered(a.cmp(b)),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// Leading optional sign and digits, as an integer parse of a cell would read
/// them. `"2023abc"` is 2023; `"abc"`, `""` and overflowing values are `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// TabularQuery
// ---------------------------------------------------------------------------

/// A filtered, ordered view over index rows.
///
/// Every operation returns a new view; the rows behind it are shared and never
/// mutated.
#[derive(Debug, Clone, Default)]
pub struct TabularQuery {
    rows: Arc<Vec<IndexRow>>,
    order: Vec<usize>,
}

impl From<Arc<Vec<IndexRow>>> for TabularQuery {
    fn from(rows: Arc<Vec<IndexRow>>) -> Self {
        let order = (0..rows.len()).collect();
        Self { rows, order }
    }
}

impl From<Vec<IndexRow>> for TabularQuery {
    fn from(rows: Vec<IndexRow>) -> Self {
        Self::from(Arc::new(rows))
    }
}

impl TabularQuery {
    /// Keep rows for which `predicate` holds.
    pub fn filter(&self, mut predicate: impl FnMut(&IndexRow) -> bool) -> Self {
        let order = self
            .order
            .iter()
            .copied()
            .filter(|&i| predicate(&self.rows[i]))
            .collect();
        Self {
            rows: Arc::clone(&self.rows),
            order,
        }
    }

    /// Stable sort by an extracted key. Ties keep their current order.
    pub fn order_by<F>(&self, key: F, direction: Direction) -> Self
    where
        F: Fn(&IndexRow) -> Option<Cow<'_, str>>,
    {
        let mut keyed: Vec<(SortKey, usize)> = self
            .order
            .iter()
            .map(|&i| (SortKey::from_text(key(&self.rows[i]).as_deref()), i))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| a.compare(b, direction));
        Self {
            rows: Arc::clone(&self.rows),
            order: keyed.into_iter().map(|(_, i)| i).collect(),
        }
    }

    /// Stable sort by the text of column `field`.
    pub fn order_by_field(&self, field: &str, direction: Direction) -> Self {
        self.order_by(|row| row.text(field), direction)
    }

    pub fn order_by_descending(&self, field: &str) -> Self {
        self.order_by_field(field, Direction::Descending)
    }

    /// Rows in view order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexRow> {
        self.order.iter().map(|&i| &self.rows[i])
    }

    /// Materialize the view.
    pub fn to_list(&self) -> Vec<IndexRow> {
        self.iter().cloned().collect()
    }

    pub fn first(&self) -> Option<&IndexRow> {
        self.order.first().map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
