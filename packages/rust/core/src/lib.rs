//! Block pipelines for sitekit.
//!
//! Each pipeline reads what it needs through a [`SiteContext`] and returns the
//! decorated block as an [`Element`](sitekit_render::Element). Pipelines are
//! independent: one failing never affects another.
//!
//! - [`search`]: search form, result summary, results and pagination
//! - [`list`]: the news listing
//! - [`feed`]: the newsroom feed with filters and "view more"
//! - [`career`]: the testimonial carousel

pub mod career;
pub mod context;
pub mod feed;
pub mod list;
pub mod search;

pub use career::{CareerCarousel, career_carousel, complete_testimonials};
pub use context::{LoadScope, Location, SiteContext};
pub use feed::{Feed, FeedBlock, FeedFilter, FeedView};
pub use list::{ListBlock, news_rows};
pub use search::{SearchBlock, matches_term};
