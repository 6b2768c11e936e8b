//! The search form shown in the header and on the search page.

use sitekit_shared::{Locale, Placeholders};

use crate::dom::Element;

/// Build `form.search` submitting `s` to the language's search page.
///
/// `searchbox` selects `type="search"` over a plain text input. The
/// validation message comes from the `emptysearchtext` placeholder.
pub fn search_widget(
    placeholders: &Placeholders,
    initial: Option<&str>,
    searchbox: bool,
    locale: &Locale,
) -> Element {
    let input = Element::new("input")
        .attr("type", if searchbox { "search" } else { "text" })
        .attr("name", "s")
        .attr("value", initial.unwrap_or(""))
        .class("search-text")
        .attr("placeholder", placeholders.text("searchtext"))
        .attr("required", "true")
        .attr("data-invalid-message", placeholders.text("emptysearchtext"));

    let button = Element::new("button")
        .class("icon search-icon")
        .attr("aria-label", placeholders.get("searchtext").unwrap_or("Search"));

    Element::new("form")
        .attr("method", "get")
        .class("search")
        .attr("action", locale.localized_path("/search"))
        .child(Element::new("div").child(input).child(button))
}
