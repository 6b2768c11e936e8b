//! The search-results block: search form, match summary, one page of
//! results and the condensed pagination.

use tracing::{info, instrument};

use sitekit_index::{PlaceholderSource, SiteSource};
use sitekit_render::{
    Element, PaginationWidget, ParentTitles, ResultRenderer, clamp_page, search_widget,
    total_pages,
};
use sitekit_shared::{Field, IndexRow, PageState, Result, SearchConfig};

use crate::context::{LoadScope, Location, SiteContext};

/// Columns searched, in the order they are joined.
const SEARCH_FIELDS: [Field; 4] = [
    Field::Description,
    Field::PageName,
    Field::BreadcrumbTitle,
    Field::Title,
];

/// Whether `row` contains `term` (case-insensitively) in any searched column.
pub fn matches_term(row: &IndexRow, term: &str) -> bool {
    let haystack = SEARCH_FIELDS
        .iter()
        .map(|f| row.get(*f).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    haystack.contains(&term.to_lowercase())
}

#[derive(Debug, Clone)]
pub struct SearchBlock {
    pub results_per_page: usize,
    pub pagination_limit: usize,
    pub scope: LoadScope,
}

impl From<&SearchConfig> for SearchBlock {
    fn from(config: &SearchConfig) -> Self {
        Self {
            results_per_page: config.results_per_page.max(1),
            pagination_limit: config.pagination_limit,
            scope: LoadScope::FirstPage,
        }
    }
}

impl SearchBlock {
    pub fn with_scope(mut self, scope: LoadScope) -> Self {
        self.scope = scope;
        self
    }

    /// Decorate the block for `location`. Without a search term only the
    /// form is rendered and no index is fetched.
    #[instrument(skip_all, fields(path = %location.path))]
    pub async fn decorate<S: SiteSource>(
        &self,
        ctx: &SiteContext<S>,
        location: &Location,
    ) -> Result<Element> {
        let state = PageState::from_query(&location.query);
        let locale = ctx.locale_for(location);
        let placeholders = ctx.placeholders.placeholders(&locale).await?;

        let term = state.search_term.as_deref().filter(|t| !t.is_empty());
        let mut block = Element::new("div")
            .class("search-results")
            .child(search_widget(&placeholders, term, true, &locale));

        let Some(term) = term else {
            return Ok(block);
        };

        let rows = ctx.load_rows(&locale.search_sheet(), self.scope).await?;
        let matches = rows.iter().filter(|row| matches_term(row, term)).collect::<Vec<_>>();
        info!(term, matches = matches.len(), rows = rows.len(), "search complete");

        let renderer = ResultRenderer::new(&locale, &placeholders);
        let parents = ParentTitles::new(rows.iter());
        block.push(renderer.result_count(matches.len(), term));

        let pages = total_pages(matches.len(), self.results_per_page);
        let current = clamp_page(state.current_page, pages);
        let start = current.saturating_mul(self.results_per_page);
        for row in matches.iter().skip(start).take(self.results_per_page) {
            block.push(renderer.search_result(row, term, &parents));
        }

        block.push(
            PaginationWidget::new(&location.path, &location.query)
                .condensed(self.pagination_limit)
                .build(current, pages),
        );
        Ok(block)
    }
}
