//! The news listing block.

use std::sync::Arc;

use tracing::{info, instrument};

use sitekit_index::{Direction, PlaceholderSource, SiteSource, TabularQuery};
use sitekit_render::{
    Element, NEWS_TITLE_KEY, PaginationWidget, ResultRenderer, clamp_page, total_pages,
};
use sitekit_shared::{Field, IndexRow, ListConfig, PageState, Result};

use crate::context::{LoadScope, Location, SiteContext};

/// Path segment marking news articles.
const NEWS_SEGMENT: &str = "/news/";

/// News rows other than `current_path`, newest first.
pub fn news_rows(rows: impl Into<TabularQuery>, current_path: &str) -> Vec<IndexRow> {
    let query: TabularQuery = rows.into();
    query
        .filter(|row| {
            row.get(Field::NewsDate).is_some()
                && row.path() != current_path
                && row.path().contains(NEWS_SEGMENT)
        })
        .order_by_field(Field::NewsDate.key(), Direction::Descending)
        .to_list()
}

#[derive(Debug, Clone)]
pub struct ListBlock {
    pub results_per_page: usize,
    pub scope: LoadScope,
}

impl From<&ListConfig> for ListBlock {
    fn from(config: &ListConfig) -> Self {
        Self {
            results_per_page: config.results_per_page.max(1),
            scope: LoadScope::FirstPage,
        }
    }
}

impl ListBlock {
    pub fn with_scope(mut self, scope: LoadScope) -> Self {
        self.scope = scope;
        self
    }

    #[instrument(skip_all, fields(path = %location.path))]
    pub async fn decorate<S: SiteSource>(
        &self,
        ctx: &SiteContext<S>,
        location: &Location,
    ) -> Result<Element> {
        let state = PageState::from_query(&location.query);
        let locale = ctx.locale_for(location);
        let placeholders = ctx.placeholders.placeholders(&locale).await?;

        let rows = ctx.load_rows(&locale.search_sheet(), self.scope).await?;
        let news = news_rows(Arc::clone(&rows), &location.path);
        info!(rows = rows.len(), news = news.len(), "news listing");

        let mut block = Element::new("div").class("list news");
        let title = placeholders.text(NEWS_TITLE_KEY);
        if !title.is_empty() {
            block.push(Element::new("h2").text(title));
        }

        let renderer = ResultRenderer::new(&locale, &placeholders);
        let pages = total_pages(news.len(), self.results_per_page);
        let current = clamp_page(state.current_page, pages);
        let start = current.saturating_mul(self.results_per_page);
        for row in news.iter().skip(start).take(self.results_per_page) {
            block.push(renderer.listing_result(row));
        }

        block.push(PaginationWidget::new(&location.path, &location.query).build(current, pages));
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{context, mount_placeholders, mount_sheet};
    use serde_json::json;
    use sitekit_shared::AppConfig;
    use wiremock::MockServer;

    fn row(path: &str, newsdate: &str) -> IndexRow {
        [("path", json!(path)), ("newsdate", json!(newsdate)), ("pagename", json!(path))]
            .into_iter()
            .collect()
    }

    #[test]
    fn filters_and_orders_news() {
        let rows = vec![
            row("/news/a", "1600000000000"),
            row("/news/b", "1700000000000"),
            row("/about", "1700000000000"),
            row("/news/current", "1800000000000"),
            row("/news/undated", ""),
        ];
        let news = news_rows(rows, "/news/current");
        let paths = news.iter().map(IndexRow::path).collect::<Vec<_>>();
        assert_eq!(paths, ["/news/b", "/news/a"]);
    }

    #[tokio::test]
    async fn renders_heading_page_and_pagination() {
        let server = MockServer::start().await;
        let rows = (0..14)
            .map(|i| {
                json!({
                    "path": format!("/de/news/item-{i}"),
                    "pagename": format!("Item {i}"),
                    "newsdate": (1_680_000_000_000_i64 + i * 86_400_000).to_string(),
                })
            })
            .collect::<Vec<_>>();
        mount_sheet(&server, "de-search", json!(rows)).await;
        mount_placeholders(&server, "/de/placeholders.json", &[(NEWS_TITLE_KEY, "Neuigkeiten")]).await;

        let ctx = context(&server);
        let block = ListBlock::from(&AppConfig::default().list);
        let el = block
            .decorate(&ctx, &Location::new("/de/news", "pg=1"))
            .await
            .unwrap();

        assert_eq!(el.find_by_tag("h2").unwrap().text_content(), "Neuigkeiten");
        let results = el.find_all_by_class("result");
        assert_eq!(results.len(), 2);
        // Page 2 of 12 per page holds the two oldest items.
        assert_eq!(results[0].find_by_tag("a").unwrap().text_content(), "Item 1");
        assert_eq!(results[1].find_by_tag("a").unwrap().text_content(), "Item 0");
        assert_eq!(
            results[1].find_by_class("parent-detail").unwrap().text_content(),
            "28.03.2023"
        );

        let pagination = el.find_by_class("pagination").unwrap();
        assert!(pagination.find_by_class("next").unwrap().has_class("disabled"));
    }
}
