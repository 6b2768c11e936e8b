//! Builds the navigation menu from the flat nav-tree document.
//!
//! Nodes name their parent by `category` (case-insensitively). Root nodes
//! with children become mega-menu items; deeper nodes become labelled groups
//! or plain links.

use std::collections::HashSet;

use tracing::{debug, warn};

use sitekit_render::{Element, Node};
use sitekit_shared::NavNode;

/// Deepest nesting followed before descent is cut.
pub const MAX_DEPTH: usize = 16;

/// Menu level of the root list.
const ROOT_LEVEL: usize = 1;

// ---------------------------------------------------------------------------
// NavItem
// ---------------------------------------------------------------------------

/// One built menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    /// A plain link.
    Leaf { label: String, link: String },
    /// A labelled group of nested items. A group whose node also has a link
    /// renders that link in its heading.
    Group {
        label: String,
        link: Option<String>,
        level: usize,
        children: Vec<NavItem>,
    },
    /// A root item with a dropdown panel.
    Mega {
        label: String,
        link: Option<String>,
        description: Option<String>,
        image: Option<String>,
        children: Vec<NavItem>,
    },
}

impl NavItem {
    pub fn label(&self) -> &str {
        match self {
            Self::Leaf { label, .. } | Self::Group { label, .. } | Self::Mega { label, .. } => label,
        }
    }

    pub fn children(&self) -> &[NavItem] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Group { children, .. } | Self::Mega { children, .. } => children,
        }
    }
}

/// The built menu: root items in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavTree {
    pub items: Vec<NavItem>,
}

impl NavTree {
    /// Indices of root items that open a dropdown.
    pub fn mega_items(&self) -> impl Iterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| matches!(item, NavItem::Mega { .. }))
            .map(|(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// NavTreeBuilder
// ---------------------------------------------------------------------------

/// Recursive-descent builder over the nodes of one nav-tree sheet.
#[derive(Debug, Clone)]
pub struct NavTreeBuilder<'a> {
    nodes: &'a [NavNode],
    max_depth: usize,
}

impl<'a> NavTreeBuilder<'a> {
    pub fn new(nodes: &'a [NavNode]) -> Self {
        Self {
            nodes,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(&self) -> NavTree {
        let mut items = Vec::new();
        for node in self.nodes.iter().filter(|n| n.is_root()) {
            let mut ancestry = HashSet::from([key(&node.category)]);
            let children = self.children_of(node, ROOT_LEVEL + 1, &mut ancestry);

            if !children.is_empty() {
                items.push(NavItem::Mega {
                    label: node.category.clone(),
                    link: node.link.clone(),
                    description: node.description.clone(),
                    image: node.image.clone(),
                    children,
                });
            } else if let Some(link) = &node.link {
                items.push(NavItem::Leaf {
                    label: node.category.clone(),
                    link: link.clone(),
                });
            } else {
                debug!(category = %node.category, "root node without link or children skipped");
            }
        }
        NavTree { items }
    }

    fn children_of(
        &self,
        parent: &NavNode,
        level: usize,
        ancestry: &mut HashSet<String>,
    ) -> Vec<NavItem> {
        if level > self.max_depth {
            warn!(category = %parent.category, level, "nav tree too deep, children dropped");
            return Vec::new();
        }

        let mut items = Vec::new();
        for node in self.nodes.iter().filter(|n| parent.is_parent_of(n)) {
            let id = key(&node.category);
            if !ancestry.insert(id.clone()) {
                warn!(
                    category = %node.category,
                    parent = %parent.category,
                    "nav node is its own ancestor, branch cut"
                );
                continue;
            }
            let children = self.children_of(node, level + 1, ancestry);
            ancestry.remove(&id);

            match (&node.link, children.is_empty()) {
                (Some(link), true) => items.push(NavItem::Leaf {
                    label: node.category.clone(),
                    link: link.clone(),
                }),
                (link, false) => items.push(NavItem::Group {
                    label: node.category.clone(),
                    link: link.clone(),
                    level,
                    children,
                }),
                (None, true) => {
                    debug!(category = %node.category, "nav node without link or children skipped");
                }
            }
        }
        items
    }
}

fn key(category: &str) -> String {
    category.to_lowercase()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl NavTree {
    /// Render `ul.menu-level-1`. Mega items carry the `mega-dropdown` panel
    /// with a summary, the nested sub-menu and the item image.
    pub fn render(&self) -> Element {
        let mut ul = Element::new("ul").class(&format!("menu-level-{ROOT_LEVEL}"));
        for item in &self.items {
            ul.push(render_root(item));
        }
        ul
    }
}

fn link(label: &str, href: Option<&str>) -> Element {
    let mut a = Element::new("a").class("link").text(label);
    if let Some(href) = href {
        a.set_attr("href", href);
    }
    a
}

fn render_root(item: &NavItem) -> Element {
    let item_class = format!("menu-level-{ROOT_LEVEL}-item");
    match item {
        NavItem::Mega {
            label,
            link: href,
            description,
            image,
            children,
        } => {
            let mut summary_link = Element::new("a").child(
                Element::new("h2")
                    .text(label.as_str())
                    .child(Element::new("span").class("icon angle-right")),
            );
            if let Some(href) = href {
                summary_link.set_attr("href", href);
            }
            let summary = Element::new("div")
                .class("main-item-summary")
                .child(summary_link)
                .child(Element::new("p").text(description.clone().unwrap_or_default()));

            let sub_menu = Element::new("nav")
                .class("mega-sub-menu")
                .child(
                    Element::new("h3")
                        .class("mobile-menu-header")
                        .child(link(label, href.as_deref())),
                )
                .child(render_level(children, ROOT_LEVEL + 1));

            let mut right = Element::new("div").class("right-content");
            if let Some(src) = image {
                right.push(
                    Element::new("picture").child(
                        Element::new("img")
                            .attr("src", src.as_str())
                            .attr("alt", "")
                            .attr("loading", "lazy"),
                    ),
                );
            }

            let panel = Element::new("div").class("mega mega-dropdown").child(
                Element::new("div")
                    .class("mega-container")
                    .child(
                        Element::new("div").class("left-content").child(
                            Element::new("div")
                                .class("left-content-container")
                                .child(summary)
                                .child(sub_menu),
                        ),
                    )
                    .child(right),
            );

            Element::new("li")
                .class("drop")
                .class(&item_class)
                .child(link(label, href.as_deref()))
                .child(panel)
        }
        NavItem::Leaf { label, link: href } => Element::new("li")
            .class(&item_class)
            .child(link(label, Some(href))),
        NavItem::Group { .. } => Element::new("li")
            .class(&item_class)
            .child(render_nested(item)),
    }
}

fn render_level(items: &[NavItem], level: usize) -> Element {
    Element::new("div")
        .class(&format!("menu-level-{level}"))
        .children_from(items.iter().map(render_nested))
}

fn render_nested(item: &NavItem) -> Node {
    match item {
        NavItem::Leaf { label, link: href } => link(label, Some(href)).into(),
        NavItem::Group {
            label,
            link: href,
            level,
            children,
        } => {
            let heading = match href {
                Some(href) => Element::new("h6").class("subtitle").child(link(label, Some(href))),
                None => Element::new("h6").class("subtitle").text(label.as_str()),
            };
            Element::new("div")
                .class(&format!("menu-level-{level}-item"))
                .child(heading)
                .child(render_level(children, level + 1))
                .into()
        }
        NavItem::Mega { label, link: href, .. } => link(label, href.as_deref()).into(),
    }
}
