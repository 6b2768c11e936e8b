//! Header menu interaction as an explicit state machine.
//!
//! [`MenuController::handle`] applies one [`MenuEvent`] and reports whether
//! the event was consumed. [`MenuController::render`] is a pure function of
//! the controller state and the built [`NavTree`].

use tracing::{debug, instrument};

use sitekit_render::Element;
use sitekit_shared::{Placeholders, ViewportConfig};

use crate::tree::{NavItem, NavTree};

/// Class marking shown controls and open dropdowns.
pub const VISIBLE_CLASS: &str = "visible";

/// Class set on the bottom nav and header while the mobile drawer is open.
pub const OPEN_CLASS: &str = "open";
pub const HEADER_OPEN_CLASS: &str = "menu-open";

/// Placeholder keys for the menu's own controls.
pub const BACK_LABEL_KEY: &str = "back";
pub const TOGGLER_LABEL_KEY: &str = "menu";

/// Localised text of the back control and the toggler's accessible name.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuLabels<'a> {
    pub back: &'a str,
    pub toggler: &'a str,
}

impl<'a> MenuLabels<'a> {
    pub fn from_placeholders(placeholders: &'a Placeholders) -> Self {
        Self {
            back: placeholders.text(BACK_LABEL_KEY),
            toggler: placeholders.text(TOGGLER_LABEL_KEY),
        }
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

/// Breakpoints classifying a viewport width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    tablet_min_width: f64,
    wide_min_width: f64,
}

impl Viewport {
    pub fn classify(&self, width: f64) -> DeviceClass {
        if width >= self.wide_min_width {
            DeviceClass::Desktop
        } else if width >= self.tablet_min_width {
            DeviceClass::Tablet
        } else {
            DeviceClass::Mobile
        }
    }

    /// Whether a click on a mega-menu item is handled by the menu rather than
    /// left to hover styling.
    pub fn intercepts_clicks(&self, width: f64) -> bool {
        width < self.wide_min_width
    }
}

impl From<&ViewportConfig> for Viewport {
    fn from(config: &ViewportConfig) -> Self {
        Self {
            tablet_min_width: config.tablet_min_width,
            wide_min_width: config.wide_min_width,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from(&ViewportConfig::default())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Open/closed state of one mega-menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Closed,
    Open,
}

/// Input events. Widths are read at the time of the event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuEvent {
    /// Click on the link of root item `item`.
    ItemClick { item: usize, width: f64 },
    /// Click on the back control.
    Back,
    /// Click on the drawer toggler.
    Toggle,
    Resize { width: f64 },
    PointerEnter { item: usize },
    PointerLeave { item: usize },
}

/// Whether the event was consumed by the menu or left to the default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Consumed,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct MenuController {
    viewport: Viewport,
    /// One state per root item; only mega items ever open.
    items: Vec<ItemState>,
    mega: Vec<bool>,
    device: DeviceClass,
    drawer_open: bool,
    backdrop: bool,
}

impl MenuController {
    pub fn new(tree: &NavTree, viewport: Viewport, width: f64) -> Self {
        let mega = tree
            .items
            .iter()
            .map(|item| matches!(item, NavItem::Mega { .. }))
            .collect::<Vec<_>>();
        Self {
            viewport,
            items: vec![ItemState::Closed; mega.len()],
            mega,
            device: viewport.classify(width),
            drawer_open: false,
            backdrop: false,
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn item_state(&self, item: usize) -> Option<ItemState> {
        self.items.get(item).copied()
    }

    /// The open item, if any.
    pub fn open_item(&self) -> Option<usize> {
        self.items.iter().position(|s| *s == ItemState::Open)
    }

    /// The back control exists exactly while an item is open.
    pub fn back_visible(&self) -> bool {
        self.open_item().is_some()
    }

    pub fn toggler_visible(&self) -> bool {
        self.device != DeviceClass::Desktop && !self.back_visible()
    }

    pub fn drawer_open(&self) -> bool {
        self.drawer_open
    }

    pub fn backdrop_visible(&self) -> bool {
        self.backdrop
    }

    #[instrument(skip(self), fields(device = ?self.device))]
    pub fn handle(&mut self, event: MenuEvent) -> Handled {
        match event {
            MenuEvent::ItemClick { item, width } => {
                if !self.viewport.intercepts_clicks(width) {
                    return Handled::Ignored;
                }
                if !self.mega.get(item).copied().unwrap_or(false) {
                    return Handled::Ignored;
                }
                for (i, state) in self.items.iter_mut().enumerate() {
                    *state = if i == item {
                        ItemState::Open
                    } else {
                        ItemState::Closed
                    };
                }
                debug!(item, "mega menu opened");
                Handled::Consumed
            }
            MenuEvent::Back => {
                if self.open_item().is_none() {
                    return Handled::Ignored;
                }
                self.close_all();
                Handled::Consumed
            }
            MenuEvent::Toggle => {
                self.drawer_open = !self.drawer_open;
                Handled::Consumed
            }
            MenuEvent::Resize { width } => {
                let device = self.viewport.classify(width);
                if device != self.device {
                    debug!(from = ?self.device, to = ?device, "viewport class changed");
                }
                self.device = device;
                if device == DeviceClass::Desktop {
                    self.close_all();
                    self.drawer_open = false;
                }
                Handled::Ignored
            }
            MenuEvent::PointerEnter { item } => {
                self.backdrop = self.mega.get(item).copied().unwrap_or(false);
                Handled::Ignored
            }
            MenuEvent::PointerLeave { .. } => {
                self.backdrop = false;
                Handled::Ignored
            }
        }
    }

    fn close_all(&mut self) {
        self.items.fill(ItemState::Closed);
    }

    /// Classes the page header carries for the current state.
    pub fn header_classes(&self) -> Vec<&'static str> {
        if self.drawer_open {
            vec![HEADER_OPEN_CLASS]
        } else {
            Vec::new()
        }
    }

    /// Render `nav.nav-bottom`: the back control (while an item is open),
    /// the toggler, the menu list and the backdrop.
    pub fn render(&self, tree: &NavTree, labels: MenuLabels<'_>) -> Element {
        let mut menu = tree.render();
        for (i, li) in menu.child_elements_mut().enumerate() {
            let open = self.items.get(i) == Some(&ItemState::Open);
            li.walk_mut(&mut |el| {
                if el.has_class("mega-dropdown") {
                    el.toggle_class(VISIBLE_CLASS, open);
                }
            });
        }

        let mut nav = Element::new("nav").class("nav-bottom");
        nav.toggle_class(OPEN_CLASS, self.drawer_open);

        if self.back_visible() {
            nav.push(back_control(labels.back));
        }

        let mut toggler = Element::new("button").class("navbar-toggler").child(
            Element::new("span")
                .class("mobile-icon")
                .children_from((0..4).map(|_| Element::new("i"))),
        );
        if !labels.toggler.is_empty() {
            toggler.set_attr("aria-label", labels.toggler);
        }
        toggler.toggle_class(VISIBLE_CLASS, self.toggler_visible());
        nav.push(toggler);
        nav.push(menu);

        let mut backdrop = Element::new("div").class("backdrop");
        backdrop.toggle_class(VISIBLE_CLASS, self.backdrop);
        nav.push(backdrop);
        nav
    }
}

fn back_control(label: &str) -> Element {
    Element::new("div")
        .class("menu-back-btn")
        .class(VISIBLE_CLASS)
        .child(Element::new("span").class("icon icon-angle-left"))
        .child(Element::new("a").text(label))
}
