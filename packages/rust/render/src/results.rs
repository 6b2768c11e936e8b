//! Result entries for listing and search pages.
//!
//! A result is a heading link, an optional `p.parent-detail` line and, for
//! search, a description paragraph. Title and detail fields fall back through
//! per-variant chains because index rows are often sparse.

use std::collections::HashMap;

use sitekit_shared::{Field, IndexRow, Locale, Placeholders};

use crate::date::format_epoch_millis;
use crate::dom::{Element, Node};
use crate::highlight::{EMPHASIS_TAG, set_highlighted};
use crate::text::first_japanese_sentence;

/// `type` value of newsroom pages.
pub const NEWSROOM_TYPE: &str = "Newsroom";

/// Placeholder naming the parent of every newsroom page.
pub const NEWS_TITLE_KEY: &str = "news-page-title-text";

// ---------------------------------------------------------------------------
// Field fallbacks
// ---------------------------------------------------------------------------

/// Listing title: `pagename`, then `breadcrumbtitle`, then `title`.
pub fn listing_title(row: &IndexRow) -> Option<&str> {
    row.get(Field::PageName)
        .or_else(|| row.get(Field::BreadcrumbTitle))
        .or_else(|| row.get(Field::Title))
}

/// Search title. Newsroom rows prefer `breadcrumbtitle`, others `title`;
/// both end at `type`.
pub fn search_title(row: &IndexRow) -> Option<&str> {
    if is_newsroom(row) {
        row.get(Field::BreadcrumbTitle)
            .or_else(|| row.get(Field::Title))
            .or_else(|| row.get(Field::Type))
    } else {
        row.get(Field::Title)
            .or_else(|| row.get(Field::BreadcrumbTitle))
            .or_else(|| row.get(Field::Type))
    }
}

pub fn is_newsroom(row: &IndexRow) -> bool {
    row.get(Field::Type) == Some(NEWSROOM_TYPE)
}

/// `path` truncated at its last `/`, or `None` when that leaves nothing.
pub fn parent_path(path: &str) -> Option<&str> {
    let cut = path.rfind('/')?;
    let parent = &path[..cut];
    (!parent.is_empty()).then_some(parent)
}

/// Breadcrumb titles by path, for labelling a result with its parent page.
///
/// The first row carrying a path decides its title, matching a linear lookup.
#[derive(Debug, Default)]
pub struct ParentTitles<'a> {
    by_path: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> ParentTitles<'a> {
    pub fn new(rows: impl IntoIterator<Item = &'a IndexRow>) -> Self {
        let mut by_path = HashMap::new();
        for row in rows {
            by_path
                .entry(row.path())
                .or_insert_with(|| row.get(Field::BreadcrumbTitle));
        }
        Self { by_path }
    }

    pub fn title_for(&self, path: &str) -> Option<&'a str> {
        self.by_path.get(path).copied().flatten()
    }
}

// ---------------------------------------------------------------------------
// Result count
// ---------------------------------------------------------------------------

/// Word order and quoting of the result-count line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountTemplate {
    /// `prefix N postfix "term"`
    Default,
    /// `「term」 prefix Npostfix`
    Japanese,
    /// `"term" prefix Npostfix`
    Chinese,
}

impl CountTemplate {
    pub fn for_locale(locale: &Locale) -> Self {
        if locale.is_japanese() {
            Self::Japanese
        } else if locale.is_chinese() {
            Self::Chinese
        } else {
            Self::Default
        }
    }

    /// Nodes of the line, with `term` emphasised.
    pub fn render(self, count: usize, term: &str, placeholders: &Placeholders) -> Vec<Node> {
        let prefix = placeholders.text("resultstext_prefix");
        let postfix = placeholders.text("resultstext_postfix");
        let emphasis = Node::from(Element::new(EMPHASIS_TAG).text(term));

        match self {
            Self::Default => {
                let lead = join_words(&[prefix, &count.to_string(), postfix]);
                vec![Node::text(format!("{lead} \"")), emphasis, Node::text("\"")]
            }
            Self::Japanese | Self::Chinese => {
                let (open, close) = if self == Self::Japanese {
                    ("「", "」")
                } else {
                    ("\"", "\"")
                };
                let tail = join_words(&[prefix, &format!("{count}{postfix}")]);
                vec![
                    Node::text(open),
                    emphasis,
                    Node::text(format!("{close} {tail}")),
                ]
            }
        }
    }
}

fn join_words(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// ResultRenderer
// ---------------------------------------------------------------------------

/// Renders result entries for one page language.
#[derive(Debug, Clone, Copy)]
pub struct ResultRenderer<'a> {
    locale: &'a Locale,
    placeholders: &'a Placeholders,
}

impl<'a> ResultRenderer<'a> {
    pub fn new(locale: &'a Locale, placeholders: &'a Placeholders) -> Self {
        Self {
            locale,
            placeholders,
        }
    }

    /// `h3.search-summary` announcing `count` matches for `term`.
    pub fn result_count(&self, count: usize, term: &str) -> Element {
        Element::new("h3")
            .class("search-summary")
            .children_from(CountTemplate::for_locale(self.locale).render(
                count,
                term,
                self.placeholders,
            ))
    }

    /// `div.result` for a listing: heading link and the `newsdate`.
    pub fn listing_result(&self, row: &IndexRow) -> Element {
        let mut result = Element::new("div").class("result");

        if let Some(date) = row
            .get(Field::NewsDate)
            .and_then(|d| format_epoch_millis(d, self.locale))
        {
            result.push(
                Element::new("p")
                    .class("parent-detail")
                    .child(Element::new("span").text(date)),
            );
        }

        let link = Element::new("a")
            .attr("href", row.path())
            .text(listing_title(row).unwrap_or(""));
        result.push(Element::new("h3").child(link));
        result
    }

    /// `div.search-result`: parent/date detail, highlighted heading link and
    /// highlighted description.
    pub fn search_result(&self, row: &IndexRow, term: &str, parents: &ParentTitles<'_>) -> Element {
        let mut result = Element::new("div").class("search-result");

        let parent = parent_path(row.path()).and_then(|parent| {
            if is_newsroom(row) {
                self.placeholders.get(NEWS_TITLE_KEY)
            } else {
                parents.title_for(parent)
            }
        });
        let date = row
            .get(Field::PublishedDate)
            .and_then(|d| format_epoch_millis(d, self.locale));

        if parent.is_some() || date.is_some() {
            let mut detail = Element::new("p").class("parent-detail");
            if let Some(parent) = parent {
                let mut span = Element::new("span").text(parent);
                if date.is_some() {
                    span.add_class("news-date");
                }
                detail.push(span);
            }
            if let Some(date) = date {
                detail.push(Element::new("span").text(date));
            }
            result.push(detail);
        }

        let mut link = Element::new("a").attr("href", row.path());
        set_highlighted(&mut link, search_title(row).unwrap_or(""), term);
        result.push(Element::new("h3").child(link));

        let description = row.get(Field::Description).unwrap_or("");
        let description = if self.locale.is_japanese() {
            first_japanese_sentence(description)
        } else {
            description
        };
        let mut para = Element::new("p");
        set_highlighted(&mut para, description, term);
        result.push(para);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, &str)]) -> IndexRow {
        pairs.iter().map(|(k, v)| (*k, json!(v))).collect()
    }

    fn english() -> Placeholders {
        [
            ("resultstext_postfix", "matches for"),
            (NEWS_TITLE_KEY, "News & Articles"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn title_fallbacks() {
        let r = row(&[("pagename", "P"), ("breadcrumbtitle", "B"), ("title", "T")]);
        assert_eq!(listing_title(&r), Some("P"));
        assert_eq!(search_title(&r), Some("T"));

        let news = row(&[("type", "Newsroom"), ("breadcrumbtitle", "B"), ("title", "T")]);
        assert_eq!(search_title(&news), Some("B"));

        let bare = row(&[("type", "Product")]);
        assert_eq!(search_title(&bare), Some("Product"));
        assert_eq!(listing_title(&bare), None);
    }

    #[test]
    fn parent_paths() {
        assert_eq!(parent_path("/news/a/"), Some("/news/a"));
        assert_eq!(parent_path("/news/a"), Some("/news"));
        assert_eq!(parent_path("/top"), None);
        assert_eq!(parent_path(""), None);
    }

    #[test]
    fn default_count_line() {
        let locale = Locale::default();
        let placeholders = english();
        let renderer = ResultRenderer::new(&locale, &placeholders);

        let summary = renderer.result_count(3, "tex");
        assert_eq!(summary.class_name(), "search-summary");
        assert_eq!(summary.inner_html().trim(), r#"3 matches for "<strong>tex</strong>""#);
    }

    #[test]
    fn cjk_count_lines() {
        let placeholders: Placeholders = [
            ("resultstext_prefix", "の検索結果"),
            ("resultstext_postfix", "件"),
        ]
        .into_iter()
        .collect();

        let jp = Locale::new("jp");
        let summary = ResultRenderer::new(&jp, &placeholders).result_count(1, "a");
        assert_eq!(summary.inner_html(), "「<strong>a</strong>」 の検索結果 1件");

        let cn = Locale::new("cn");
        let summary = ResultRenderer::new(&cn, &placeholders).result_count(2, "a");
        assert_eq!(summary.inner_html(), r#""<strong>a</strong>" の検索結果 2件"#);
    }

    #[test]
    fn count_line_escapes_term() {
        let locale = Locale::default();
        let placeholders = english();
        let summary = ResultRenderer::new(&locale, &placeholders).result_count(0, "<i>x");
        assert!(summary.inner_html().contains("<strong>&lt;i&gt;x</strong>"));
    }

    #[test]
    fn search_result_highlights_title_and_description() {
        let locale = Locale::default();
        let placeholders = english();
        let renderer = ResultRenderer::new(&locale, &placeholders);
        let rows = vec![row(&[("path", "/news/d/"), ("description", "text of d")])];
        let parents = ParentTitles::new(&rows);

        let result = renderer.search_result(&rows[0], "tex", &parents);
        let children: Vec<_> = result.child_elements().collect();

        assert_eq!(result.class_name(), "search-result");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag(), "h3");
        assert_eq!(children[1].tag(), "p");
        assert_eq!(children[1].inner_html(), "<strong>tex</strong>t of d");
    }

    #[test]
    fn search_result_parent_and_date() {
        let locale = Locale::default();
        let placeholders = english();
        let renderer = ResultRenderer::new(&locale, &placeholders);
        let rows = vec![
            row(&[("path", "/products"), ("breadcrumbtitle", "Products")]),
            row(&[
                ("path", "/products/brush"),
                ("title", "Brush"),
                ("publisheddate", "1685443971000"),
            ]),
            row(&[("path", "/news/x"), ("type", "Newsroom"), ("title", "X")]),
        ];
        let parents = ParentTitles::new(&rows);

        let brush = renderer.search_result(&rows[1], "brush", &parents);
        let detail = brush.find_by_class("parent-detail").unwrap();
        let spans: Vec<_> = detail.child_elements().collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text_content(), "Products");
        assert!(spans[0].has_class("news-date"));
        assert_eq!(spans[1].text_content(), "May 30, 2023");

        let news = renderer.search_result(&rows[2], "x", &parents);
        let detail = news.find_by_class("parent-detail").unwrap();
        assert_eq!(detail.text_content(), "News & Articles");
        assert_eq!(detail.child_elements().count(), 1);
    }

    #[test]
    fn japanese_description_is_cut_at_first_stop() {
        let locale = Locale::new("jp");
        let placeholders = Placeholders::default();
        let renderer = ResultRenderer::new(&locale, &placeholders);
        let rows = vec![row(&[("path", "/jp/a"), ("title", "a"), ("description", "一文目。二文目。")])];

        let result = renderer.search_result(&rows[0], "a", &ParentTitles::new(&rows));
        assert_eq!(result.child_elements().last().unwrap().text_content(), "一文目");
    }

    #[test]
    fn listing_result_shows_news_date() {
        let locale = Locale::default();
        let placeholders = Placeholders::default();
        let renderer = ResultRenderer::new(&locale, &placeholders);

        let result = renderer.listing_result(&row(&[
            ("path", "/news/a"),
            ("pagename", "A <b>"),
            ("newsdate", "1685443971000"),
        ]));

        assert_eq!(result.class_name(), "result");
        assert_eq!(
            result.to_html(),
            r#"<div class="result"><p class="parent-detail"><span>May 30, 2023</span></p><h3><a href="/news/a">A &lt;b&gt;</a></h3></div>"#
        );
    }
}
