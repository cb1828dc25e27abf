//! Pure extraction functions, one per catalogue template.
//!
//! Nothing here does I/O. Given the same document every function returns
//! the same output, so a page can be re-parsed safely.

use super::selectors::{BREADCRUMB, CATALOGUE_LINKS, HREF_ATTR, MODEL_LINKS, PARTS, PART_CATEGORIES};
use super::{PageKind, PartRecord};
use crate::error::SpiderError;
use scraper::{ElementRef, Html};

const MANUFACTURER_POS: usize = 3;
const CATEGORY_POS: usize = 4;
const MODEL_POS: usize = 5;

/// The hrefs a page of `kind` links onward to, in document order.
///
/// Model pages link nowhere.
pub fn extract_links(html: &Html, kind: PageKind) -> Vec<String> {
    let selector = match kind {
        PageKind::Root | PageKind::Manufacturer => &*CATALOGUE_LINKS,
        PageKind::Category => &*MODEL_LINKS,
        PageKind::Model => return Vec::new(),
    };
    html.select(selector)
        .filter_map(|a| a.value().attr(HREF_ATTR))
        .map(str::to_owned)
        .collect()
}

/// Manufacturer, category and model names read from a model page's
/// breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub manufacturer: String,
    pub category: String,
    pub model: String,
}

impl Breadcrumb {
    /// Reads the names at positions 3, 4 and 5 of `trail`.
    ///
    /// Fails with `BreadcrumbTooShort` when the trail has fewer than six
    /// nodes.
    pub fn from_trail(trail: &[String], url: &str) -> Result<Self, SpiderError> {
        match (
            trail.get(MANUFACTURER_POS),
            trail.get(CATEGORY_POS),
            trail.get(MODEL_POS),
        ) {
            (Some(manufacturer), Some(category), Some(model)) => Ok(Breadcrumb {
                manufacturer: manufacturer.trim().to_owned(),
                category: category.trim().to_owned(),
                model: model.trim().to_owned(),
            }),
            _ => Err(SpiderError::BreadcrumbTooShort {
                url: url.to_owned(),
                found: trail.len(),
                expected: MODEL_POS + 1,
            }),
        }
    }
}

/// Turns a model page into one record per (part, part category) pair.
///
/// Parts and categories are paired by position; whichever list is longer
/// has its tail ignored. A page with no parts yields no records and no
/// error. `url` only labels the error of a short breadcrumb.
pub fn extract_part_records(html: &Html, url: &str) -> Result<Vec<PartRecord>, SpiderError> {
    let parts = part_names(html);
    let categories = part_categories(html);
    let breadcrumb = Breadcrumb::from_trail(&breadcrumb_trail(html), url)?;

    Ok(parts
        .into_iter()
        .zip(categories)
        .map(|(part, part_category)| PartRecord {
            manufacturer: breadcrumb.manufacturer.clone(),
            category: breadcrumb.category.clone(),
            model: breadcrumb.model.clone(),
            part,
            part_category,
        })
        .collect())
}

/// First token of every non-blank text node directly inside a part anchor.
fn part_names(html: &Html) -> Vec<String> {
    html.select(&PARTS)
        .flat_map(own_text_nodes)
        .filter_map(|text| text.split_whitespace().next())
        .map(str::to_owned)
        .collect()
}

fn part_categories(html: &Html) -> Vec<String> {
    html.select(&PART_CATEGORIES)
        .map(|span| own_text_nodes(span).collect::<String>().trim().to_owned())
        .collect()
}

/// The anchor's own label: its first non-blank direct text node. Text of
/// nested elements (separator glyphs, icons) is ignored.
fn breadcrumb_trail(html: &Html) -> Vec<String> {
    html.select(&BREADCRUMB)
        .map(|a| {
            own_text_nodes(a)
                .find(|text| !text.trim().is_empty())
                .unwrap_or_default()
                .to_owned()
        })
        .collect()
}

/// Text nodes that are direct children of `element`, skipping the text of
/// nested elements.
fn own_text_nodes<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    const URL: &str = "https://www.urparts.com/index.cfm/page/catalogue/Acme/Engines/V6";

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn root_links_come_from_the_catalogue_list() {
        let html = parse(&fixtures::listing_page(&["/m/Acme", "/m/Globex"]));
        assert_eq!(
            extract_links(&html, PageKind::Root),
            vec!["/m/Acme".to_string(), "/m/Globex".to_string()]
        );
        assert_eq!(
            extract_links(&html, PageKind::Manufacturer),
            extract_links(&html, PageKind::Root)
        );
    }

    #[test]
    fn model_links_come_from_the_second_container() {
        let html = parse(&fixtures::category_page(&["/model/V6", "/model/V8"]));
        assert_eq!(
            extract_links(&html, PageKind::Category),
            vec!["/model/V6".to_string(), "/model/V8".to_string()]
        );
    }

    #[test]
    fn category_page_without_models_yields_nothing() {
        let html = parse(&fixtures::category_page(&[]));
        assert!(extract_links(&html, PageKind::Category).is_empty());
    }

    #[test]
    fn model_pages_are_not_followed() {
        let html = parse(&fixtures::model_page(
            &fixtures::full_breadcrumb("Acme", "Engines", "V6"),
            &[("Bolt 10mm", "Fasteners")],
        ));
        assert!(extract_links(&html, PageKind::Model).is_empty());
    }

    #[test]
    fn model_page_yields_one_record_per_part() {
        let html = parse(&fixtures::model_page(
            &fixtures::full_breadcrumb("Acme", "Engines", "V6"),
            &[("Bolt 10mm", "Fasteners"), ("Nut 8mm", "Fasteners")],
        ));
        let records = extract_part_records(&html, URL).unwrap();
        let expected = |part: &str| PartRecord {
            manufacturer: "Acme".into(),
            category: "Engines".into(),
            model: "V6".into(),
            part: part.into(),
            part_category: "Fasteners".into(),
        };
        assert_eq!(records, vec![expected("Bolt"), expected("Nut")]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = parse(&fixtures::model_page(
            &fixtures::full_breadcrumb("Acme", "Engines", "V6"),
            &[("Bolt 10mm", "Fasteners"), ("Nut 8mm", "Fasteners")],
        ));
        assert_eq!(
            extract_part_records(&html, URL).unwrap(),
            extract_part_records(&html, URL).unwrap()
        );
    }

    #[test]
    fn parts_have_no_whitespace_and_categories_are_trimmed() {
        let page = r#"<html><body>
            <div id="path"><a>Home</a><a>Catalogue</a><a>Parts</a>
              <a> Acme </a><a>
                Engines</a><a>V6 </a></div>
            <div id="content"><div><div><div><ul>
              <li><a href="/p/1">
                  4711-A   spare <span>  Filters  </span>
              </a></li>
              <li><a href="/p/2">B-22<span>Seals</span></a></li>
            </ul></div></div></div></div>
        </body></html>"#;
        let records = extract_part_records(&parse(page), URL).unwrap();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(!record.part.chars().any(char::is_whitespace));
            assert_eq!(record.part_category, record.part_category.trim());
        }
        assert_eq!(records[0].part, "4711-A");
        assert_eq!(records[0].part_category, "Filters");
        assert_eq!(records[1].part, "B-22");
        assert_eq!(records[0].manufacturer, "Acme");
        assert_eq!(records[0].category, "Engines");
        assert_eq!(records[0].model, "V6");
    }

    #[test]
    fn breadcrumb_ignores_text_of_nested_elements() {
        let page = r#"<html><body>
            <div id="path"><a>Home</a><a><span>›</span>Catalogue</a><a><span>›</span>Parts</a>
              <a><span>›</span>Acme</a><a><span>›</span> Engines <i>x</i></a><a><span>›</span>V6</a>
            </div>
            <div id="content"><div><div><div><ul>
              <li><a>Bolt<span>Fasteners</span></a></li>
            </ul></div></div></div></div>
        </body></html>"#;
        let records = extract_part_records(&parse(page), URL).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].manufacturer, "Acme");
        assert_eq!(records[0].category, "Engines");
        assert_eq!(records[0].model, "V6");
    }

    #[test]
    fn pairing_is_bounded_by_the_shorter_list() {
        let page = r#"<html><body>
            <div id="path"><a>0</a><a>1</a><a>2</a><a>Acme</a><a>Engines</a><a>V6</a></div>
            <div id="content"><div><div><div><ul>
              <li><a>Bolt<span>Fasteners</span></a></li>
              <li><a>Nut</a></li>
              <li><a>Washer</a></li>
            </ul></div></div></div></div>
        </body></html>"#;
        let records = extract_part_records(&parse(page), URL).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].part, "Bolt");
    }

    #[test]
    fn short_breadcrumb_is_a_fault() {
        let html = parse(&fixtures::model_page(
            &["Home", "Catalogue", "Acme", "Engines"],
            &[("Bolt 10mm", "Fasteners")],
        ));
        match extract_part_records(&html, URL) {
            Err(SpiderError::BreadcrumbTooShort { url, found, expected }) => {
                assert_eq!(url, URL);
                assert_eq!(found, 4);
                assert_eq!(expected, 6);
            }
            other => panic!("expected BreadcrumbTooShort, got {other:?}"),
        }
    }

    #[test]
    fn page_without_parts_is_empty_not_faulty() {
        let html = parse(&fixtures::model_page(
            &fixtures::full_breadcrumb("Acme", "Engines", "V6"),
            &[],
        ));
        assert!(extract_part_records(&html, URL).unwrap().is_empty());
    }
}
