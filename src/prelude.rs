//! A "prelude" for users of the `urparts-crawler` crate.
//!
//! Re-exports the traits and types needed to write a spider, assemble a
//! crawler and run it.
//!
//! # Example
//!
//! ```
//! use urparts_crawler::prelude::*;
//! ```

pub use crate::{
    // Core structs
    Crawler,
    CrawlerBuilder,
    CrawlerConfig,
    DownloaderConfig,
    ReqwestClientDownloader,
    // Core traits
    Downloader,
    Spider,
    // Essential re-exports for trait implementation
    async_trait,
};

pub use crate::error::{PipelineError, SpiderError};
pub use crate::item::{ParseOutput, ScrapedItem};
pub use crate::middleware::{Middleware, MiddlewareAction, OffsiteMiddleware};
pub use crate::pipeline::{
    ConsoleWriterPipeline, CsvExporterPipeline, JsonLinesWriterPipeline, Pipeline,
};
pub use crate::request::Request;
pub use crate::resolver::resolve;
pub use crate::response::Response;
pub use crate::stats::StatCollector;
pub use crate::urparts::{PageKind, PartRecord, UrpartsSpider};
