//! # Builder Module
//!
//! `CrawlerBuilder` assembles a `Crawler` from a spider, a downloader,
//! middlewares and pipelines, and validates the concurrency settings.
//!
//! ## Defaults
//!
//! - Downloader: `ReqwestClientDownloader` with `DownloaderConfig::default()`,
//!   restricted to following redirects onto `Spider::allowed_domains`.
//! - Concurrency: derived from the CPU count (see `CrawlerConfig`).
//! - Pipelines: a `ConsoleWriterPipeline` when none are registered.
//! - Middlewares: an `OffsiteMiddleware` built from `Spider::allowed_domains`
//!   is placed first in the chain whenever the spider declares domains.
//!
//! ## Example
//!
//! ```rust,ignore
//! let crawler = CrawlerBuilder::new(UrpartsSpider::new())?
//!     .max_concurrent_downloads(8)
//!     .add_pipeline(CsvExporterPipeline::create("parts.csv")?)
//!     .build()
//!     .await?;
//! crawler.start_crawl().await?;
//! ```

use crate::crawler::{BoxedMiddleware, Crawler};
use crate::downloader::{Downloader, DownloaderConfig, ReqwestClientDownloader};
use crate::error::SpiderError;
use crate::middleware::{Middleware, OffsiteMiddleware};
use crate::pipeline::{ConsoleWriterPipeline, Pipeline};
use crate::scheduler::Scheduler;
use crate::spider::Spider;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use std::sync::Arc;
use tracing::debug;

/// Concurrency settings of a crawl.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// The maximum number of concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// The number of workers dedicated to parsing responses.
    pub parser_workers: usize,
    /// The maximum number of items inside the pipelines at once.
    pub max_concurrent_pipelines: usize,
    /// The minimum capacity of the channels between the actors.
    pub channel_capacity: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            max_concurrent_downloads: num_cpus::get().max(16),
            parser_workers: num_cpus::get().clamp(4, 16),
            max_concurrent_pipelines: num_cpus::get().min(8),
            channel_capacity: 1000,
        }
    }
}

pub struct CrawlerBuilder<S: Spider, D: Downloader> {
    crawler_config: CrawlerConfig,
    downloader: D,
    spider: Option<S>,
    middlewares: Vec<BoxedMiddleware<D::Client, S::Page>>,
    item_pipelines: Vec<Box<dyn Pipeline<S::Item>>>,
}

impl<S: Spider> CrawlerBuilder<S, ReqwestClientDownloader> {
    /// Creates a builder for `spider` with the default `reqwest` downloader.
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(spider: S) -> Result<Self, SpiderError> {
        let config = DownloaderConfig::default().with_allowed_domains(spider.allowed_domains());
        let downloader = ReqwestClientDownloader::new(config)?;
        Ok(Self::with_downloader(spider, downloader))
    }
}

impl<S: Spider, D: Downloader> CrawlerBuilder<S, D> {
    /// Creates a builder for `spider` that fetches pages with `downloader`.
    pub fn with_downloader(spider: S, downloader: D) -> Self {
        Self {
            crawler_config: CrawlerConfig::default(),
            downloader,
            spider: Some(spider),
            middlewares: Vec::new(),
            item_pipelines: Vec::new(),
        }
    }

    /// Replaces every concurrency setting at once.
    pub fn config(mut self, config: CrawlerConfig) -> Self {
        self.crawler_config = config;
        self
    }

    pub fn max_concurrent_downloads(mut self, limit: usize) -> Self {
        self.crawler_config.max_concurrent_downloads = limit;
        self
    }

    pub fn max_parser_workers(mut self, limit: usize) -> Self {
        self.crawler_config.parser_workers = limit;
        self
    }

    pub fn max_concurrent_pipelines(mut self, limit: usize) -> Self {
        self.crawler_config.max_concurrent_pipelines = limit;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.crawler_config.channel_capacity = capacity;
        self
    }

    /// Replaces the downloader with another of the same type.
    pub fn downloader(mut self, downloader: D) -> Self {
        self.downloader = downloader;
        self
    }

    /// Appends a middleware to the chain.
    pub fn add_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<D::Client, S::Page> + 'static,
    {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Appends an item pipeline.
    pub fn add_pipeline<P>(mut self, pipeline: P) -> Self
    where
        P: Pipeline<S::Item>,
    {
        self.item_pipelines.push(Box::new(pipeline));
        self
    }

    /// Validates the settings and builds the `Crawler`.
    ///
    /// Must be called inside a Tokio runtime: the scheduler's dispatch loop
    /// starts here.
    pub async fn build(mut self) -> Result<Crawler<S, D>, SpiderError> {
        let spider = self.validate_and_get_spider()?;

        if self.item_pipelines.is_empty() {
            debug!("No item pipelines registered, using ConsoleWriterPipeline");
            self.item_pipelines.push(Box::new(ConsoleWriterPipeline::new()));
        }

        let allowed_domains = spider.allowed_domains();
        if !allowed_domains.is_empty() {
            debug!("Restricting crawl to domains: {:?}", allowed_domains);
            self.middlewares
                .insert(0, Box::new(OffsiteMiddleware::new(allowed_domains)));
        }

        let config = &self.crawler_config;
        let channel_capacity = std::cmp::max(
            config.max_concurrent_downloads * 3,
            config.parser_workers * config.max_concurrent_pipelines * 2,
        )
        .max(config.channel_capacity);

        let state = CrawlerState::new();
        let (scheduler, req_rx) = Scheduler::new(Arc::clone(&state), channel_capacity);

        Ok(Crawler::new(
            scheduler,
            req_rx,
            state,
            Arc::new(self.downloader),
            self.middlewares,
            spider,
            Arc::new(self.item_pipelines),
            config.max_concurrent_downloads,
            config.parser_workers,
            config.max_concurrent_pipelines,
            channel_capacity,
            Arc::new(StatCollector::new()),
        ))
    }

    fn validate_and_get_spider(&mut self) -> Result<S, SpiderError> {
        if self.crawler_config.max_concurrent_downloads == 0 {
            return Err(SpiderError::ConfigurationError(
                "max_concurrent_downloads must be greater than 0.".to_string(),
            ));
        }
        if self.crawler_config.parser_workers == 0 {
            return Err(SpiderError::ConfigurationError(
                "parser_workers must be greater than 0.".to_string(),
            ));
        }
        if self.crawler_config.max_concurrent_pipelines == 0 {
            return Err(SpiderError::ConfigurationError(
                "max_concurrent_pipelines must be greater than 0.".to_string(),
            ));
        }
        self.spider.take().ok_or_else(|| {
            SpiderError::ConfigurationError("Crawler must have a spider.".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ParseOutput;
    use crate::request::Request;
    use crate::response::Response;
    use crate::testing::{CollectingPipeline, RedirectServer};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use url::Url;

    /// Emits the final URL of every page it is handed.
    struct EchoSpider {
        start: Url,
    }

    #[async_trait]
    impl Spider for EchoSpider {
        type Item = String;
        type Page = ();

        fn name(&self) -> &str {
            "echo"
        }

        fn allowed_domains(&self) -> Vec<&'static str> {
            vec!["127.0.0.1"]
        }

        fn start_requests(&self) -> Result<Vec<Request<()>>, SpiderError> {
            Ok(vec![Request::new(self.start.clone(), ())])
        }

        async fn parse(
            &self,
            response: Response<()>,
        ) -> Result<ParseOutput<String, ()>, SpiderError> {
            let mut output = ParseOutput::new();
            output.add_item(response.url.to_string());
            Ok(output)
        }
    }

    #[tokio::test]
    async fn default_downloader_stops_at_offsite_redirects() {
        let server = RedirectServer::start().await;
        let collected = CollectingPipeline::new();
        let spider = EchoSpider {
            start: server.onsite_url("/"),
        };

        let crawler = CrawlerBuilder::new(spider)
            .unwrap()
            .add_pipeline(collected.clone())
            .build()
            .await
            .unwrap();
        let stats = crawler.get_stats();
        crawler.start_crawl().await.unwrap();

        assert_eq!(server.offsite_hits(), 0);
        assert!(collected.items().is_empty());
        assert_eq!(stats.requests_failed.load(Ordering::SeqCst), 1);
        assert_eq!(stats.response_status_counts.get(&302).map(|c| *c), Some(1));
    }

    #[tokio::test]
    async fn zero_parser_workers_is_rejected() {
        let spider = EchoSpider {
            start: Url::parse("http://127.0.0.1/").unwrap(),
        };
        let result = CrawlerBuilder::new(spider)
            .unwrap()
            .max_parser_workers(0)
            .build()
            .await;
        assert!(matches!(result, Err(SpiderError::ConfigurationError(_))));
    }
}
