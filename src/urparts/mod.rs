//! # urparts.com catalogue spider
//!
//! The catalogue is a tree of four page templates:
//!
//! ```text
//! Root ──▶ Manufacturer ──▶ Category ──▶ Model ──▶ PartRecord*
//! ```
//!
//! The first three kinds only yield links to the next level. A model page
//! lists the parts of one machine model and is the only source of records.
//! Every request carries the `PageKind` of the page it points at, and
//! `UrpartsSpider::parse` dispatches on it.

mod extract;
pub mod selectors;
mod spider;

pub use extract::{extract_links, extract_part_records, Breadcrumb};
pub use spider::UrpartsSpider;

use serde::Serialize;

/// The template of a catalogue page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// The catalogue landing page, listing manufacturers.
    #[default]
    Root,
    /// One manufacturer, listing its categories.
    Manufacturer,
    /// One category, listing its models.
    Category,
    /// One model, listing its parts.
    Model,
}

impl PageKind {
    /// The kind of page the links on this page point at. `None` for model
    /// pages, which are not followed any further.
    pub fn next(self) -> Option<PageKind> {
        match self {
            PageKind::Root => Some(PageKind::Manufacturer),
            PageKind::Manufacturer => Some(PageKind::Category),
            PageKind::Category => Some(PageKind::Model),
            PageKind::Model => None,
        }
    }
}

/// One part of one model, flattened with its place in the catalogue.
///
/// Field order is the column order of the exported files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartRecord {
    pub manufacturer: String,
    pub category: String,
    pub model: String,
    pub part: String,
    pub part_category: String,
}
