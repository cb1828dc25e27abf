use super::extract::{extract_links, extract_part_records};
use super::{PageKind, PartRecord};
use crate::error::SpiderError;
use crate::item::ParseOutput;
use crate::request::Request;
use crate::resolver::resolve;
use crate::response::Response;
use crate::spider::Spider;
use async_trait::async_trait;
use tracing::{debug, warn};

const START_URL: &str = "https://www.urparts.com/index.cfm/page/catalogue";
const ALLOWED_DOMAIN: &str = "urparts.com";

/// Walks the urparts.com catalogue from the landing page down to the parts
/// of every model.
#[derive(Debug, Clone, Default)]
pub struct UrpartsSpider;

impl UrpartsSpider {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous body of `parse`. The parsed document is not `Send`, so it
    /// must never live across an `.await`.
    fn handle(
        &self,
        response: &Response<PageKind>,
    ) -> Result<ParseOutput<PartRecord, PageKind>, SpiderError> {
        let kind = *response.page();
        let html = response.to_html();
        let mut output = ParseOutput::new();

        let Some(next) = kind.next() else {
            let records = extract_part_records(&html, response.url.as_str())?;
            debug!("{} parts on {}", records.len(), response.url);
            output.add_items(records);
            return Ok(output);
        };

        let hrefs = extract_links(&html, kind);
        debug!("{} {:?} links on {}", hrefs.len(), next, response.url);
        for href in hrefs {
            match resolve(&response.url, &href) {
                Ok(url) => output.add_request(Request::new(url, next)),
                Err(e) => warn!("Skipping unresolvable href {:?} on {}: {}", href, response.url, e),
            }
        }
        Ok(output)
    }
}

#[async_trait]
impl Spider for UrpartsSpider {
    type Item = PartRecord;
    type Page = PageKind;

    fn name(&self) -> &str {
        "urparts_crawling"
    }

    fn start_urls(&self) -> Vec<&'static str> {
        vec![START_URL]
    }

    fn allowed_domains(&self) -> Vec<&'static str> {
        vec![ALLOWED_DOMAIN]
    }

    async fn parse(
        &self,
        response: Response<PageKind>,
    ) -> Result<ParseOutput<PartRecord, PageKind>, SpiderError> {
        self.handle(&response)
    }
}
