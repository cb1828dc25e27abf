//! CSS selectors for the urparts.com catalogue templates.
//!
//! Update this file when the site changes its markup. The breadcrumb
//! positions live in `extract.rs`.

use scraper::Selector;
use std::sync::LazyLock;

/// Manufacturer links on the root page and category links on a
/// manufacturer page. Both templates share the same list markup.
pub static CATALOGUE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#content > div > div > ul > li > a").unwrap());

/// Model links on a category page, in the second list container.
pub static MODEL_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#content > div > div:nth-of-type(2) > ul > li > a").unwrap()
});

/// Part anchors on a model page. The part name is the anchor's own text.
pub static PARTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#content > div > div > div > ul > li > a").unwrap());

/// The category label nested inside each part anchor.
pub static PART_CATEGORIES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#content > div > div > div > ul > li > a > span").unwrap()
});

/// Breadcrumb trail nodes.
pub static BREADCRUMB: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#path > a").unwrap());

pub const HREF_ATTR: &str = "href";
