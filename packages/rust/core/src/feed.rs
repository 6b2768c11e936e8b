//! The newsroom feed: highlight cards over the full search sheet, year and
//! category filters, and "view more" chunking.

use tracing::{info, instrument, warn};

use sitekit_index::{Direction, PlaceholderSource, SiteSource, Tag, TagQuery};
use sitekit_render::{Element, first_sentence, format_epoch_millis, year_of};
use sitekit_shared::{Field, FeedConfig, IndexRow, Locale, Placeholders, Result};

use crate::context::{Location, SiteContext};

/// Tags sheet and type listing newsroom categories.
const CATEGORY_SHEET: &str = "categories";
const CATEGORY_KIND: &str = "newsroom";

/// Fields shown on a card when none are configured.
pub const DEFAULT_FIELDS: [&str; 5] = ["path", "image", "publisheddate", "title", "description"];

// ---------------------------------------------------------------------------
// FeedView
// ---------------------------------------------------------------------------

/// Which of the feed results are on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView {
    results: Vec<IndexRow>,
    loaded: usize,
    chunk: usize,
}

impl FeedView {
    /// Show the first `chunk` results.
    pub fn new(results: Vec<IndexRow>, chunk: usize) -> Self {
        let chunk = chunk.max(1);
        Self {
            loaded: chunk.min(results.len()),
            results,
            chunk,
        }
    }

    /// Show every result at once, as after applying a filter.
    pub fn all(results: Vec<IndexRow>) -> Self {
        let len = results.len();
        Self {
            results,
            loaded: len,
            chunk: len.max(1),
        }
    }

    pub fn visible(&self) -> &[IndexRow] {
        &self.results[..self.loaded]
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn has_more(&self) -> bool {
        self.loaded < self.results.len()
    }

    /// Reveal the next chunk and return just the newly shown results.
    pub fn load_more(&mut self) -> &[IndexRow] {
        let start = self.loaded;
        self.loaded = (self.loaded + self.chunk).min(self.results.len());
        &self.results[start..self.loaded]
    }
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// Year and category selection from the filter form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub year: Option<i32>,
    pub category: Option<String>,
}

impl FeedFilter {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.category.is_none()
    }
}

/// Loaded feed results with their filter options.
#[derive(Debug, Clone)]
pub struct Feed {
    /// Rows in display order.
    pub rows: Vec<IndexRow>,
    /// Distinct years in result order.
    pub years: Vec<i32>,
    pub categories: Vec<Tag>,
    sort: String,
}

impl Feed {
    fn year(&self, row: &IndexRow) -> Option<i32> {
        row.str_value(&self.sort).and_then(year_of)
    }

    /// Rows matching `filter`.
    pub fn filtered(&self, filter: &FeedFilter) -> Vec<IndexRow> {
        self.rows
            .iter()
            .filter(|row| filter.year.is_none_or(|y| self.year(row) == Some(y)))
            .filter(|row| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| row.get(Field::Category) == Some(c))
            })
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FeedBlock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FeedBlock {
    /// Column ordered on, descending; also the date the year is read from.
    pub sort: String,
    /// Card fields, lowercased, in display order.
    pub fields: Vec<String>,
    /// `pagetype` values left out of the feed.
    pub omit_page_types: Vec<String>,
    pub min_year: i32,
    pub chunk: usize,
}

impl From<&FeedConfig> for FeedBlock {
    fn from(config: &FeedConfig) -> Self {
        Self {
            sort: Field::PublishedDate.key().to_string(),
            fields: DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect(),
            omit_page_types: Vec::new(),
            min_year: config.min_year,
            chunk: config.chunk,
        }
    }
}

impl FeedBlock {
    pub fn with_sort(mut self, sort: &str) -> Self {
        self.sort = sort.trim().to_lowercase();
        self
    }

    /// Card fields from a comma list such as `path, title, description`.
    pub fn with_fields(mut self, fields: &str) -> Self {
        self.fields = split_list(fields);
        self
    }

    /// Page types to omit, from a comma list.
    pub fn with_omitted_page_types(mut self, page_types: &str) -> Self {
        self.omit_page_types = split_list(page_types);
        self
    }

    /// Load the full search sheet and derive the feed and its filter options.
    #[instrument(skip_all, fields(path = %location.path, sort = %self.sort))]
    pub async fn load<S: SiteSource>(
        &self,
        ctx: &SiteContext<S>,
        location: &Location,
    ) -> Result<Feed> {
        let locale = ctx.locale_for(location);
        let query = ctx.cache.query_index(&locale.search_sheet()).await?;

        let sort = self.sort.clone();
        let rows = query
            .filter(|row| {
                let page_type = row.get(Field::PageType).unwrap_or("").trim().to_lowercase();
                !self.omit_page_types.contains(&page_type)
            })
            .order_by(|row| row.text(&sort), Direction::Descending)
            .iter()
            .filter(|row| {
                row.str_value(&sort)
                    .and_then(year_of)
                    .is_some_and(|year| year > self.min_year)
            })
            .cloned()
            .collect::<Vec<_>>();

        let mut years = Vec::new();
        for year in rows.iter().filter_map(|row| row.str_value(&sort).and_then(year_of)) {
            if !years.contains(&year) {
                years.push(year);
            }
        }

        let categories = match ctx
            .tags
            .fetch_tags_or_categories(
                TagQuery {
                    ids: &[],
                    sheet: CATEGORY_SHEET,
                    kind: CATEGORY_KIND,
                },
                &locale,
            )
            .await
        {
            Ok(tags) => tags,
            Err(e) => {
                warn!(error = %e, "category options unavailable");
                Vec::new()
            }
        };

        info!(rows = rows.len(), years = years.len(), categories = categories.len(), "feed loaded");
        Ok(Feed {
            rows,
            years,
            categories,
            sort,
        })
    }

    /// Load and render the feed. An empty filter shows the first chunk with a
    /// "view more" control; a filter shows every match.
    pub async fn decorate<S: SiteSource>(
        &self,
        ctx: &SiteContext<S>,
        location: &Location,
        filter: &FeedFilter,
    ) -> Result<Element> {
        let locale = ctx.locale_for(location);
        let placeholders = ctx.placeholders.placeholders(&locale).await?;
        let feed = self.load(ctx, location).await?;

        let view = if filter.is_empty() {
            FeedView::new(feed.rows.clone(), self.chunk)
        } else {
            FeedView::all(feed.filtered(filter))
        };
        Ok(self.render(&feed, &view, filter, &locale, &placeholders))
    }

    pub fn render(
        &self,
        feed: &Feed,
        view: &FeedView,
        filter: &FeedFilter,
        locale: &Locale,
        placeholders: &Placeholders,
    ) -> Element {
        let mut block = Element::new("div")
            .class("feed-newsroom")
            .child(filter_form(feed, filter, placeholders));

        block.push(
            Element::new("div")
                .class("highlight")
                .children_from(view.visible().iter().map(|row| self.card(row, locale))),
        );

        if view.has_more() {
            block.push(
                Element::new("div").class("load-more-container").child(
                    Element::new("button")
                        .class("load-more-button")
                        .text(placeholders.text("view-more")),
                ),
            );
        }
        block
    }

    /// One highlight card: an optional image link and a body holding the
    /// configured fields.
    pub fn card(&self, row: &IndexRow, locale: &Locale) -> Element {
        let linked = self.fields.iter().any(|f| f == "path");
        let mut body = Element::new(if linked { "a" } else { "div" });
        let mut image = None;

        for field in &self.fields {
            match field.as_str() {
                "path" => body.set_attr("href", row.path()),
                "image" => {
                    image = row.get(Field::Image).map(|src| {
                        Element::new("picture").child(
                            Element::new("img")
                                .attr("src", src)
                                .attr("alt", "")
                                .attr("loading", "lazy"),
                        )
                    });
                }
                "publisheddate" => body.push(
                    Element::new("div").class("date").text(
                        row.get(Field::PublishedDate)
                            .and_then(|d| format_epoch_millis(d, locale))
                            .unwrap_or_default(),
                    ),
                ),
                "title" => body.push(
                    Element::new("div")
                        .class("title")
                        .text(row.get(Field::Title).unwrap_or("")),
                ),
                "description" => body.push(Element::new("div").text(first_sentence(
                    row.get(Field::Description).unwrap_or(""),
                    locale,
                ))),
                other => body.push(
                    Element::new("div").text(row.text(other).unwrap_or_default().into_owned()),
                ),
            }
        }

        if !linked {
            body.prepend(Element::new("a").attr("href", row.path()));
        }

        let mut card = Element::new("div").class("other");
        if let Some(picture) = image {
            card.push(Element::new("a").attr("href", row.path()).child(picture));
        }
        card.push(body);
        card
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn option(value: &str, label: &str, selected: bool) -> Element {
    let mut option = Element::new("option").attr("value", value).text(label);
    if selected {
        option.set_attr("selected", "selected");
    }
    option
}

fn filter_form(feed: &Feed, filter: &FeedFilter, placeholders: &Placeholders) -> Element {
    let categories = Element::new("select")
        .class("form-control")
        .attr("id", "news_category")
        .child(option("", placeholders.text("category"), filter.category.is_none()))
        .children_from(feed.categories.iter().map(|tag| {
            option(&tag.id, &tag.name, filter.category.as_deref() == Some(tag.id.as_str()))
        }));

    let years = Element::new("select")
        .class("form-control")
        .attr("id", "news_year")
        .child(option("", placeholders.text("year"), filter.year.is_none()))
        .children_from(feed.years.iter().map(|year| {
            option(&year.to_string(), &year.to_string(), filter.year == Some(*year))
        }));

    Element::new("form").attr("action", "#results").child(
        Element::new("div")
            .class("filter-nav")
            .child(Element::new("span").child(categories))
            .child(Element::new("span").child(years))
            .child(
                Element::new("button")
                    .attr("id", "news_filter")
                    .text(placeholders.text("filter")),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{context, mount_placeholders, mount_sheet};
    use serde_json::json;
    use sitekit_shared::AppConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // 2021-01-01, 2022-01-01, 2023-01-01 and 1999-06-01 (UTC).
    const Y2021: i64 = 1_609_459_200_000;
    const Y2022: i64 = 1_640_995_200_000;
    const Y2023: i64 = 1_672_531_200_000;
    const Y1999: i64 = 928_195_200_000;

    fn rows(n: usize) -> Vec<IndexRow> {
        (0..n)
            .map(|i| [("path", json!(format!("/news/{i}")))].into_iter().collect())
            .collect()
    }

    #[test]
    fn view_reveals_chunks() {
        let mut view = FeedView::new(rows(32), 15);
        assert_eq!(view.visible().len(), 15);
        assert!(view.has_more());

        assert_eq!(view.load_more().len(), 15);
        assert_eq!(view.load_more()[0].path(), "/news/30");
        assert_eq!(view.loaded(), 32);
        assert!(!view.has_more());
        assert!(view.load_more().is_empty());

        let small = FeedView::new(rows(3), 15);
        assert!(!small.has_more());
        assert!(!FeedView::all(rows(40)).has_more());
    }

    async fn newsroom_server() -> MockServer {
        let server = MockServer::start().await;
        let mut data = vec![
            json!({ "path": "/news/old", "publisheddate": Y1999.to_string(), "title": "Old" }),
            json!({ "path": "/news/press", "publisheddate": Y2023.to_string(), "pagetype": "Press ", "title": "Press" }),
            json!({ "path": "/news/undated", "publisheddate": "0", "title": "Undated" }),
        ];
        for (i, date) in [Y2021, Y2023, Y2022, Y2022].into_iter().enumerate() {
            data.push(json!({
                "path": format!("/news/{i}"),
                "publisheddate": date.to_string(),
                "title": format!("Story {i}"),
                "description": "First. Second.",
                "category": if i % 2 == 0 { "launch" } else { "people" },
                "image": format!("/media/{i}.png"),
            }));
        }
        mount_sheet(&server, "en-search", json!(data)).await;
        mount_placeholders(
            &server,
            "/placeholders.json",
            &[("launch", "Launches"), ("view-more", "View more")],
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/tags-categories.json"))
            .and(query_param("sheet", "categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "Key": "launch", "Type": "newsroom" },
                    { "Key": "brand", "Type": "products" }
                ]
            })))
            .mount(&server)
            .await;
        server
    }

    fn block() -> FeedBlock {
        FeedBlock::from(&AppConfig::default().feed).with_omitted_page_types("press, events")
    }

    #[tokio::test]
    async fn loads_ordered_dated_rows_and_options() {
        let server = newsroom_server().await;
        let ctx = context(&server);

        let feed = block().load(&ctx, &Location::new("/newsroom", "")).await.unwrap();
        let paths = feed.rows.iter().map(IndexRow::path).collect::<Vec<_>>();
        assert_eq!(paths, ["/news/1", "/news/2", "/news/3", "/news/0"]);
        assert_eq!(feed.years, [2023, 2022, 2021]);
        assert_eq!(feed.categories.len(), 1);
        assert_eq!(feed.categories[0].name, "Launches");

        let by_year = feed.filtered(&FeedFilter {
            year: Some(2022),
            category: None,
        });
        assert_eq!(by_year.len(), 2);
        let both = feed.filtered(&FeedFilter {
            year: Some(2022),
            category: Some("launch".into()),
        });
        assert_eq!(both.iter().map(IndexRow::path).collect::<Vec<_>>(), ["/news/2"]);
    }

    #[tokio::test]
    async fn renders_cards_and_view_more() {
        let server = newsroom_server().await;
        let ctx = context(&server);
        let mut block = block();
        block.chunk = 3;

        let el = block
            .decorate(&ctx, &Location::new("/newsroom", ""), &FeedFilter::default())
            .await
            .unwrap();

        let cards = el.find_all_by_class("other");
        assert_eq!(cards.len(), 3);
        let body = cards[0].child_elements().nth(1).unwrap();
        assert_eq!(body.tag(), "a");
        assert_eq!(body.get_attr("href"), Some("/news/1"));
        assert_eq!(body.find_by_class("date").unwrap().text_content(), "Jan 1, 2023");
        assert_eq!(body.find_by_class("title").unwrap().text_content(), "Story 1");
        assert!(body.text_content().contains("First"));
        assert!(!body.text_content().contains("Second"));
        assert_eq!(
            el.find_by_class("load-more-button").unwrap().text_content(),
            "View more"
        );

        let filtered = block
            .decorate(
                &ctx,
                &Location::new("/newsroom", ""),
                &FeedFilter {
                    year: Some(2021),
                    category: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.find_all_by_class("other").len(), 1);
        assert!(filtered.find_by_class("load-more-container").is_none());
        let year_select = filtered.find(&|el| el.get_attr("id") == Some("news_year")).unwrap();
        let selected = year_select.find(&|el| el.get_attr("selected").is_some()).unwrap();
        assert_eq!(selected.get_attr("value"), Some("2021"));
    }

    #[test]
    fn card_without_path_field_is_a_div() {
        let block = FeedBlock::from(&FeedConfig::default()).with_fields("Title, category");
        let row: IndexRow = [
            ("path", json!("/news/x")),
            ("title", json!("X")),
            ("category", json!("launch")),
        ]
        .into_iter()
        .collect();

        let card = block.card(&row, &Locale::default());
        let body = card.child_elements().next().unwrap();
        assert_eq!(body.tag(), "div");
        assert_eq!(body.find_by_tag("a").unwrap().get_attr("href"), Some("/news/x"));
        assert_eq!(body.text_content(), "Xlaunch");
    }
}
