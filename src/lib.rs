//! # urparts-crawler
//!
//! A crawler for the urparts.com parts catalogue, built on a small
//! Scrapy-style engine.
//!
//! The catalogue is a four-level tree: manufacturers, their categories, the
//! models of each category, and the parts of each model. `UrpartsSpider`
//! walks it and emits one `PartRecord` per part. The engine (`Crawler`,
//! `Scheduler`, the downloader, parser and item processor actors) is generic
//! over any `Spider`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use urparts_crawler::prelude::*;
//!
//! async fn run() -> Result<(), SpiderError> {
//!     let crawler = CrawlerBuilder::new(UrpartsSpider::new())?
//!         .add_pipeline(CsvExporterPipeline::create("urparts_crawled_data.csv")?)
//!         .build()
//!         .await?;
//!     crawler.start_crawl().await
//! }
//! ```

pub mod builder;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod item;
pub mod middleware;
pub mod pipeline;
pub mod prelude;
pub mod request;
pub mod resolver;
pub mod response;
pub mod scheduler;
pub mod spider;
pub mod state;
pub mod stats;
pub mod urparts;

#[cfg(test)]
mod testing;

pub use builder::{CrawlerBuilder, CrawlerConfig};
pub use crawler::Crawler;
pub use downloader::{Downloader, DownloaderConfig, ReqwestClientDownloader};
pub use scheduler::Scheduler;
pub use spider::Spider;

pub use async_trait::async_trait;
pub use tokio;
