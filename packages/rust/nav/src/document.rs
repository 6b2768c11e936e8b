//! Loading the nav-tree document for a language.

use tracing::{info, instrument};

use sitekit_index::SiteSource;
use sitekit_shared::{Locale, NavTreeDocument, Result, SiteError};

use crate::tree::{NavTree, NavTreeBuilder};

/// Site-absolute path of the nav-tree document.
pub const NAV_TREE_PATH: &str = "/nav-tree.json";

/// Fetch the nav-tree sheet named after the locale and build the menu.
#[instrument(skip_all, fields(locale = %locale))]
pub async fn fetch_nav_tree<S: SiteSource>(source: &S, locale: &Locale) -> Result<NavTree> {
    let query = [("sheet".to_string(), locale.code().to_string())];
    let value = source.fetch_document(NAV_TREE_PATH, &query).await?;
    let document: NavTreeDocument = serde_json::from_value(value)
        .map_err(|e| SiteError::parse(format!("{NAV_TREE_PATH}: malformed nav tree: {e}")))?;

    let tree = NavTreeBuilder::new(&document.data).build();
    info!(nodes = document.data.len(), items = tree.items.len(), "nav tree built");
    Ok(tree)
}
