//! # Spider Module
//!
//! Defines the `Spider` trait, the part of a crawl that knows about one site.
//!
//! ## Overview
//!
//! A spider names the URLs to start from, the hosts it may visit, and how a
//! downloaded page turns into scraped items and follow-up requests. Every
//! request carries a `Page` tag chosen by the spider; when its response comes
//! back, `parse` matches on that tag to pick the right handler. This replaces
//! per-callback dispatch with an explicit enumeration of page kinds.
//!
//! `parse` takes `&self`: a spider holds no mutable state, so the engine can
//! run many `parse` calls at once and re-parsing the same page always gives
//! the same output.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, Default)]
//! enum Page { #[default] Index, Article }
//!
//! struct ArticleSpider;
//!
//! #[async_trait]
//! impl Spider for ArticleSpider {
//!     type Item = Article;
//!     type Page = Page;
//!
//!     fn name(&self) -> &str { "articles" }
//!     fn start_urls(&self) -> Vec<&'static str> { vec!["https://example.com/articles"] }
//!
//!     async fn parse(&self, response: Response<Page>) -> Result<ParseOutput<Article, Page>, SpiderError> {
//!         match response.page() {
//!             Page::Index => { /* follow article links */ }
//!             Page::Article => { /* emit an Article */ }
//!         }
//!     }
//! }
//! ```

use crate::error::SpiderError;
use crate::item::{ParseOutput, ScrapedItem};
use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;
use std::fmt::Debug;
use url::Url;

/// Defines the contract for a web spider.
#[async_trait]
pub trait Spider: Send + Sync + 'static {
    /// The type of item that the spider scrapes.
    type Item: ScrapedItem;

    /// Routing tag carried by each request. `Default` is the tag of the
    /// start requests.
    type Page: Clone + Debug + Default + Send + Sync + 'static;

    fn name(&self) -> &str;

    /// Returns the initial URLs to start crawling from.
    fn start_urls(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Hosts the crawl may fetch from. Subdomains of a listed domain are
    /// allowed too. Empty means no restriction.
    fn allowed_domains(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Generates the initial requests, tagged with `Page::default()`.
    fn start_requests(&self) -> Result<Vec<Request<Self::Page>>, SpiderError> {
        self.start_urls()
            .into_iter()
            .map(|url| Ok(Request::new(Url::parse(url)?, Self::Page::default())))
            .collect()
    }

    /// Parses a response and extracts scraped items and new requests.
    ///
    /// An error aborts the handling of this one response only; the engine
    /// logs it and keeps crawling.
    async fn parse(
        &self,
        response: Response<Self::Page>,
    ) -> Result<ParseOutput<Self::Item, Self::Page>, SpiderError>;
}
