//! Tabs block: authored rows of (label, content) become a tab list and
//! panels driven by a [`TabController`].

use tracing::warn;

use sitekit_render::{Element, Node};
use sitekit_shared::{Result, SiteError};

use crate::controller::TabController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub label: String,
    pub panel: Element,
}

/// Authored tab content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabsBlock {
    pub tabs: Vec<Tab>,
}

impl TabsBlock {
    /// Read `div > div(label) + div(content)` rows. Rows with an empty label
    /// are skipped.
    pub fn from_block(block: Element) -> Result<Self> {
        let mut tabs = Vec::new();
        for (row_index, row) in block.into_child_elements().into_iter().enumerate() {
            let mut cells = row.into_child_elements().into_iter();
            let Some(label_cell) = cells.next() else {
                continue;
            };
            let label = label_cell.text_content().trim().to_string();
            if label.is_empty() {
                warn!(row = row_index, "tab row without a label skipped");
                continue;
            }
            let panel = cells.next().unwrap_or_else(|| Element::new("div"));
            tabs.push(Tab { label, panel });
        }
        if tabs.is_empty() {
            return Err(SiteError::validation("tabs block has no tabs"));
        }
        Ok(Self { tabs })
    }

    pub fn from_html(html: &str) -> Result<Self> {
        let block = Element::parse_fragment(html)
            .into_iter()
            .find_map(|node| match node {
                Node::Element(el) => Some(el),
                Node::Text(_) => None,
            })
            .ok_or_else(|| SiteError::parse("tabs markup has no block element"))?;
        Self::from_block(block)
    }

    pub fn controller(&self) -> TabController {
        TabController::new(self.tabs.len())
    }

    /// Render the tab list and panels for `state`. Exactly the active tab
    /// and panel carry `active`; inactive panels are `aria-hidden`.
    pub fn render(&self, state: &TabController) -> Element {
        let mut triggers = Vec::with_capacity(self.tabs.len());
        let mut panels = Vec::with_capacity(self.tabs.len());

        for (i, tab) in self.tabs.iter().enumerate() {
            let selected = state.is_active(i);
            triggers.push(
                Element::new("button")
                    .class("tabs-tab")
                    .attr("id", format!("tab-{i}"))
                    .attr("role", "tab")
                    .attr("aria-controls", format!("tabpanel-{i}"))
                    .attr("aria-selected", selected.to_string())
                    .attr("data-index", i.to_string())
                    .text(tab.label.as_str()),
            );
            panels.push(
                tab.panel
                    .clone()
                    .class("tabs-panel")
                    .attr("id", format!("tabpanel-{i}"))
                    .attr("role", "tabpanel")
                    .attr("aria-labelledby", format!("tab-{i}"))
                    .attr("aria-hidden", (!selected).to_string()),
            );
        }
        state.mark(triggers.iter_mut());
        state.mark(panels.iter_mut());

        Element::new("div")
            .class("tabs")
            .child(
                Element::new("div")
                    .class("tabs-list")
                    .attr("role", "tablist")
                    .children_from(triggers),
            )
            .children_from(panels)
    }
}
