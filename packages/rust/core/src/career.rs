//! The career testimonial carousel: shuffled cards with a bounded row of
//! navigation dots and arrow controls.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use sitekit_index::{PlaceholderSource, SiteSource};
use sitekit_render::Element;
use sitekit_shared::{Field, IndexRow, Placeholders, Result};
use sitekit_tabs::{TabController, TabEvent};

use crate::context::{LoadScope, Location, SiteContext};

const QUOTE: &str = "career-quote";
const JOB_TITLE: &str = "career-jobtitle";
const SHEET: &str = "career-testimonials";

/// Class of the current navigation dot.
pub const ACTIVE_NAV_CLASS: &str = "active-nav";

const ICON_PREV: &str = "/icons/angle-left-blue.svg";
const ICON_NEXT: &str = "/icons/angle-right-blue-bg.svg";

/// Rows with an image, a quote and a job title. Runs on normalized rows,
/// where export-filled `"0"` cells are already empty.
pub fn complete_testimonials(rows: &[IndexRow]) -> Vec<IndexRow> {
    rows.iter()
        .filter(|row| {
            row.get(Field::Image).is_some()
                && row.str_value(QUOTE).is_some()
                && row.str_value(JOB_TITLE).is_some()
        })
        .cloned()
        .collect()
}

/// Cards plus the dot controller driving which one is in view.
#[derive(Debug, Clone)]
pub struct CareerCarousel {
    cards: Vec<IndexRow>,
    nav: TabController,
}

impl CareerCarousel {
    /// Shuffle `cards` with `rng`; at most `max_nav_buttons` dots are shown
    /// and navigation wraps within them.
    pub fn new(mut cards: Vec<IndexRow>, max_nav_buttons: usize, rng: &mut impl Rng) -> Self {
        cards.shuffle(rng);
        let dots = cards.len().min(max_nav_buttons);
        Self {
            nav: TabController::new(dots),
            cards,
        }
    }

    pub fn cards(&self) -> &[IndexRow] {
        &self.cards
    }

    /// Card scrolled into view.
    pub fn active(&self) -> Option<usize> {
        self.nav.active()
    }

    /// Dot `i` clicked.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        self.nav.transition(TabEvent::Select(index))
    }

    /// Arrow control clicked.
    pub fn step(&mut self, forward: bool) -> Option<usize> {
        self.nav
            .transition(if forward { TabEvent::Next } else { TabEvent::Prev })
    }

    /// Keyboard navigation: left and right arrows step, other keys do nothing.
    pub fn handle_key(&mut self, key: &str) -> Option<usize> {
        match TabEvent::from_key(key) {
            Some(event) => self.nav.transition(event),
            None => self.nav.active(),
        }
    }

    pub fn render(&self, placeholders: &Placeholders) -> Element {
        let slides = Element::new("div")
            .class("career-slides")
            .attr("data-active", self.active().unwrap_or(0).to_string())
            .children_from(self.cards.iter().map(|row| card(row, placeholders)));

        let mut nav = Element::new("div")
            .class("career-slides-nav")
            .child(arrow(ICON_PREV, placeholders.text("career-carousel-previous")));
        for i in 0..self.nav.len() {
            let mut dot = Element::new("span").attr("tabindex", "-1");
            dot.toggle_class(ACTIVE_NAV_CLASS, self.nav.is_active(i));
            nav.push(dot);
        }
        nav.push(arrow(ICON_NEXT, placeholders.text("career-carousel-next")));

        Element::new("div")
            .class("career-carousel")
            .child(Element::new("div").class("career-slider").child(slides))
            .child(Element::new("div").class("career-slides-navbar").child(nav))
    }
}

fn card(row: &IndexRow, placeholders: &Placeholders) -> Element {
    let name = row.get(Field::PageName).unwrap_or("");
    let readmore = Element::new("button")
        .text(placeholders.text("career-carousel-readmore"))
        .child(
            Element::new("img")
                .class("icon-angle-right-blue")
                .attr("src", ICON_NEXT)
                .attr("alt", ""),
        );

    Element::new("div").class("career-card").child(
        Element::new("a")
            .attr("href", row.path())
            .child(
                Element::new("picture").child(
                    Element::new("img")
                        .attr("src", row.get(Field::Image).unwrap_or(""))
                        .attr("alt", name)
                        .attr("loading", "lazy"),
                ),
            )
            .child(
                Element::new("div")
                    .class("career-card-bqc")
                    .child(Element::new("blockquote").text(row.str_value(QUOTE).unwrap_or(""))),
            )
            .child(Element::new("h6").text(name))
            .child(Element::new("p").text(row.str_value(JOB_TITLE).unwrap_or("")))
            .child(readmore),
    )
}

fn arrow(src: &str, alt: &str) -> Element {
    Element::new("img")
        .class("btn-angle")
        .attr("src", src)
        .attr("alt", alt)
}

/// Load the language's testimonial sheet and build the carousel.
#[instrument(skip_all, fields(path = %location.path))]
pub async fn career_carousel<S: SiteSource>(
    ctx: &SiteContext<S>,
    location: &Location,
    rng: &mut impl Rng,
) -> Result<Element> {
    let locale = ctx.locale_for(location);
    let placeholders = ctx.placeholders.placeholders(&locale).await?;

    let sheet = format!("{}{SHEET}", locale.sheet_prefix());
    let rows = ctx.load_rows(&sheet, LoadScope::FirstPage).await?;
    let cards = complete_testimonials(&rows);
    debug!(rows = rows.len(), cards = cards.len(), "testimonials loaded");

    let carousel = CareerCarousel::new(cards, ctx.config.carousel.max_nav_buttons, rng);
    Ok(carousel.render(&placeholders))
}
