//! Page-link control for paged result lists.
//!
//! The control is a `ul.pagination` holding a `prev` link, one link per page
//! (1-based labels, `active` on the current page) and a `next` link. Every
//! href keeps the other query parameters of the current URL and overwrites
//! `pg` with the 0-based target page.
//!
//! Above a page-count limit the control can be condensed: an ellipsis item
//! sits after the first page and another before the last, and page items far
//! from the current one are flagged `notvisible`. All page items stay in the
//! markup either way.

use std::collections::BTreeSet;

use url::form_urlencoded;

use crate::dom::Element;

/// Query parameter carrying the 0-based page index.
pub const PAGE_PARAM: &str = "pg";

/// Page count above which the search results condense their pagination.
pub const DEFAULT_CONDENSE_LIMIT: usize = 5;

/// Class flagging an item the condensed control hides.
pub const HIDDEN_CLASS: &str = "notvisible";

/// Replace (or append) `pg` in `query`, keeping every other pair in order.
///
/// Mirrors `URLSearchParams.set`: the first `pg` is replaced in place and any
/// further ones are dropped.
pub fn set_page_param(query: &str, page: usize) -> String {
    let page = page.to_string();
    let mut replaced = false;
    let mut out = form_urlencoded::Serializer::new(String::new());

    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        if key == PAGE_PARAM {
            if !replaced {
                out.append_pair(PAGE_PARAM, &page);
                replaced = true;
            }
        } else {
            out.append_pair(&key, &value);
        }
    }
    if !replaced {
        out.append_pair(PAGE_PARAM, &page);
    }
    out.finish()
}

// ---------------------------------------------------------------------------
// Condensed layout
// ---------------------------------------------------------------------------

/// Which part of a long page list the current page is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// `current < limit - 1`: hide a forward run after the current page.
    Start,
    /// `current < total - 3`: hide runs on both sides of the current page.
    Middle,
    /// The last pages: hide a backward run before the current page.
    End,
}

/// Visibility of page and ellipsis items in a condensed control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedLayout {
    pub regime: Regime,
    /// 0-based page indices flagged not-visible.
    pub hidden_pages: BTreeSet<usize>,
    /// Ellipsis after the first page.
    pub hide_leading_ellipsis: bool,
    /// Ellipsis before the last page.
    pub hide_trailing_ellipsis: bool,
}

impl CondensedLayout {
    /// Lay out `total` pages with `current` selected; `None` when `total`
    /// does not exceed `limit` and the plain control applies.
    ///
    /// The first and last pages are never hidden. The forward run is
    /// `[current + 2, total - 2]`, the backward run `[1, current - 3]`, and an
    /// ellipsis is hidden when no page in its gap is. A `current` past the
    /// end is treated as the last page.
    pub fn new(current: usize, total: usize, limit: usize) -> Option<Self> {
        if total <= limit || total < 2 {
            return None;
        }
        let current = current.min(total - 1);
        let last_inner = total - 2;

        let regime = if current + 1 < limit {
            Regime::Start
        } else if current + 3 < total {
            Regime::Middle
        } else {
            Regime::End
        };

        let mut hidden_pages = BTreeSet::new();
        if matches!(regime, Regime::Start | Regime::Middle) {
            hidden_pages.extend((current + 2)..=last_inner);
        }
        if matches!(regime, Regime::Middle | Regime::End) && current >= 4 {
            hidden_pages.extend(1..=(current - 3).min(last_inner));
        }

        let split = current.min(last_inner + 1);
        let hide_leading_ellipsis = !hidden_pages.iter().any(|&p| p < split);
        let hide_trailing_ellipsis = !hidden_pages.iter().any(|&p| p > split);

        Some(Self {
            regime,
            hidden_pages,
            hide_leading_ellipsis,
            hide_trailing_ellipsis,
        })
    }
}

// ---------------------------------------------------------------------------
// PaginationWidget
// ---------------------------------------------------------------------------

/// Builds the page-link control for a URL path and query.
#[derive(Debug, Clone)]
pub struct PaginationWidget<'a> {
    path: &'a str,
    query: &'a str,
    condense_above: Option<usize>,
}

impl<'a> PaginationWidget<'a> {
    /// `path` is the current URL path, `query` its query string (with or
    /// without `?`).
    pub fn new(path: &'a str, query: &'a str) -> Self {
        Self {
            path,
            query,
            condense_above: None,
        }
    }

    /// Condense the control when there are more than `limit` pages.
    pub fn condensed(mut self, limit: usize) -> Self {
        self.condense_above = Some(limit);
        self
    }

    fn href(&self, page: usize) -> String {
        format!("{}?{}", self.path, set_page_param(self.query, page))
    }

    /// Build the control. It has no items when `total <= 1`; a `current`
    /// past the end (from a hand-edited `pg`) selects the last page.
    pub fn build(&self, current: usize, total: usize) -> Element {
        let mut nav = Element::new("ul").class("pagination");
        if total <= 1 {
            return nav;
        }
        let current = clamp_page(current, total);

        let mut prev = Element::new("li").class("page prev");
        let mut prev_link = Element::new("a");
        if current == 0 {
            prev.add_class("disabled");
        } else {
            prev_link.set_attr("href", self.href(current - 1));
        }
        nav.push(prev.child(prev_link));

        let layout = self
            .condense_above
            .and_then(|limit| CondensedLayout::new(current, total, limit));

        for page in 0..total {
            let mut item = Element::new("li");
            if page == current {
                item.add_class("active");
            }
            if layout.as_ref().is_some_and(|l| l.hidden_pages.contains(&page)) {
                item.add_class(HIDDEN_CLASS);
            }
            item.push(
                Element::new("a")
                    .attr("href", self.href(page))
                    .text((page + 1).to_string()),
            );
            nav.push(item);

            if let Some(layout) = &layout {
                if page == 0 {
                    nav.push(ellipsis(layout.hide_leading_ellipsis));
                } else if page + 2 == total {
                    nav.push(ellipsis(layout.hide_trailing_ellipsis));
                }
            }
        }

        let mut next = Element::new("li").class("page next");
        let mut next_link = Element::new("a");
        if current + 1 == total {
            next.add_class("disabled");
        } else {
            next_link.set_attr("href", self.href(current + 1));
        }
        nav.push(next.child(next_link));

        nav
    }
}

fn ellipsis(hidden: bool) -> Element {
    let mut item = Element::new("li").class("ellipsis");
    if hidden {
        item.add_class(HIDDEN_CLASS);
    }
    item.child(Element::new("a").text("..."))
}

/// `current` limited to the last of `total` pages (0 when there are none).
pub fn clamp_page(current: usize, total: usize) -> usize {
    current.min(total.saturating_sub(1))
}

/// Number of pages needed for `results` at `per_page` per page.
pub fn total_pages(results: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    results.div_ceil(per_page)
}
