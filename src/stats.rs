//! # Statistics Module
//!
//! Counters describing what a crawl did, updated atomically by the engine's
//! actors and reported when the crawl ends.
//!
//! ## Metrics
//!
//! - **Requests**: enqueued, skipped as duplicates, sent, succeeded, failed, dropped
//! - **Responses**: received, status code distribution, bytes downloaded
//! - **Items**: scraped, processed by every pipeline, dropped by a pipeline
//! - **Parse failures**: `Spider::parse` calls that returned an error
//!
//! ## Example
//!
//! ```rust,ignore
//! let crawler = CrawlerBuilder::new(UrpartsSpider::new())?.build().await?;
//! let stats = crawler.get_stats();
//! crawler.start_crawl().await?;
//! println!("{}", stats.to_markdown_string());
//! ```

use crate::error::SpiderError;
use dashmap::DashMap;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

// Plain-value copy of the counters so every report reads one consistent set.
struct StatsSnapshot {
    requests_enqueued: usize,
    requests_duplicate: usize,
    requests_sent: usize,
    requests_succeeded: usize,
    requests_failed: usize,
    requests_dropped: usize,
    responses_received: usize,
    total_bytes_downloaded: usize,
    items_scraped: usize,
    items_processed: usize,
    items_dropped_by_pipeline: usize,
    parse_failures: usize,
    response_status_counts: BTreeMap<u16, usize>,
    elapsed_duration: Duration,
}

impl StatsSnapshot {
    fn formatted_duration(&self) -> String {
        format!("{:.2?}", self.elapsed_duration)
    }

    fn per_second(&self, count: usize) -> f64 {
        let total_seconds = self.elapsed_duration.as_secs_f64();
        if total_seconds > 0.0 {
            count as f64 / total_seconds
        } else {
            0.0
        }
    }

    fn formatted_bytes(&self) -> String {
        const KB: usize = 1024;
        const MB: usize = 1024 * KB;
        const GB: usize = 1024 * MB;

        match self.total_bytes_downloaded {
            b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
            b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
            b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
            b => format!("{} B", b),
        }
    }

    fn status_codes(&self, separator: &str, fmt: impl Fn(u16, usize) -> String) -> Option<String> {
        if self.response_status_counts.is_empty() {
            return None;
        }
        Some(
            self.response_status_counts
                .iter()
                .map(|(code, count)| fmt(*code, *count))
                .collect::<Vec<String>>()
                .join(separator),
        )
    }
}

/// Crawl counters shared by every engine task.
#[derive(Debug, serde::Serialize)]
pub struct StatCollector {
    #[serde(skip)]
    pub start_time: Instant,

    pub requests_enqueued: AtomicUsize,
    pub requests_duplicate: AtomicUsize,
    pub requests_sent: AtomicUsize,
    pub requests_succeeded: AtomicUsize,
    pub requests_failed: AtomicUsize,
    pub requests_dropped: AtomicUsize,

    pub responses_received: AtomicUsize,
    pub response_status_counts: DashMap<u16, usize>,
    pub total_bytes_downloaded: AtomicUsize,

    pub items_scraped: AtomicUsize,
    pub items_processed: AtomicUsize,
    pub items_dropped_by_pipeline: AtomicUsize,

    pub parse_failures: AtomicUsize,
}

impl StatCollector {
    pub(crate) fn new() -> Self {
        StatCollector {
            start_time: Instant::now(),
            requests_enqueued: AtomicUsize::new(0),
            requests_duplicate: AtomicUsize::new(0),
            requests_sent: AtomicUsize::new(0),
            requests_succeeded: AtomicUsize::new(0),
            requests_failed: AtomicUsize::new(0),
            requests_dropped: AtomicUsize::new(0),
            responses_received: AtomicUsize::new(0),
            response_status_counts: DashMap::new(),
            total_bytes_downloaded: AtomicUsize::new(0),
            items_scraped: AtomicUsize::new(0),
            items_processed: AtomicUsize::new(0),
            items_dropped_by_pipeline: AtomicUsize::new(0),
            parse_failures: AtomicUsize::new(0),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        let response_status_counts = self
            .response_status_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        StatsSnapshot {
            requests_enqueued: self.requests_enqueued.load(Ordering::SeqCst),
            requests_duplicate: self.requests_duplicate.load(Ordering::SeqCst),
            requests_sent: self.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.requests_failed.load(Ordering::SeqCst),
            requests_dropped: self.requests_dropped.load(Ordering::SeqCst),
            responses_received: self.responses_received.load(Ordering::SeqCst),
            total_bytes_downloaded: self.total_bytes_downloaded.load(Ordering::SeqCst),
            items_scraped: self.items_scraped.load(Ordering::SeqCst),
            items_processed: self.items_processed.load(Ordering::SeqCst),
            items_dropped_by_pipeline: self.items_dropped_by_pipeline.load(Ordering::SeqCst),
            parse_failures: self.parse_failures.load(Ordering::SeqCst),
            response_status_counts,
            elapsed_duration: self.start_time.elapsed(),
        }
    }

    pub(crate) fn increment_requests_enqueued(&self) {
        self.requests_enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_duplicate(&self) {
        self.requests_duplicate.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_dropped(&self) {
        self.requests_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_responses_received(&self) {
        self.responses_received.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_response_status(&self, status_code: u16) {
        *self.response_status_counts.entry(status_code).or_insert(0) += 1;
    }

    pub(crate) fn add_bytes_downloaded(&self, bytes: usize) {
        self.total_bytes_downloaded.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn add_items_scraped(&self, count: usize) {
        self.items_scraped.fetch_add(count, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_processed(&self) {
        self.items_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_dropped_by_pipeline(&self) {
        self.items_dropped_by_pipeline.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_parse_failures(&self) {
        self.parse_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn to_json_string(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Renders the counters as a Markdown report.
    pub fn to_markdown_string(&self) -> String {
        let snapshot = self.snapshot();
        let status_codes_output = snapshot
            .status_codes("\n", |code, count| format!("- **{}**: {}", code, count))
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            r#"# Crawl Statistics Report

- **Duration**: {}
- **Average Speed**: {:.2} req/s, {:.2} resp/s, {:.2} item/s

## Requests
| Metric     | Count |
|------------|-------|
| Enqueued   | {} |
| Duplicate  | {} |
| Sent       | {} |
| Succeeded  | {} |
| Failed     | {} |
| Dropped    | {} |

## Responses
| Metric     | Count |
|------------|-------|
| Received   | {} |
| Downloaded | {} |
| Parse failures | {} |

## Items
| Metric     | Count |
|------------|-------|
| Scraped    | {} |
| Processed  | {} |
| Dropped    | {} |

## Status Codes
{}
"#,
            snapshot.formatted_duration(),
            snapshot.per_second(snapshot.requests_sent),
            snapshot.per_second(snapshot.responses_received),
            snapshot.per_second(snapshot.items_scraped),
            snapshot.requests_enqueued,
            snapshot.requests_duplicate,
            snapshot.requests_sent,
            snapshot.requests_succeeded,
            snapshot.requests_failed,
            snapshot.requests_dropped,
            snapshot.responses_received,
            snapshot.formatted_bytes(),
            snapshot.parse_failures,
            snapshot.items_scraped,
            snapshot.items_processed,
            snapshot.items_dropped_by_pipeline,
            status_codes_output
        )
    }
}

impl Default for StatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StatCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {}", snapshot.formatted_duration())?;
        writeln!(
            f,
            "  speed    : req/s: {:.2}, resp/s: {:.2}, item/s: {:.2}",
            snapshot.per_second(snapshot.requests_sent),
            snapshot.per_second(snapshot.responses_received),
            snapshot.per_second(snapshot.items_scraped)
        )?;
        writeln!(
            f,
            "  requests : enqueued: {}, duplicate: {}, sent: {}, ok: {}, fail: {}, drop: {}",
            snapshot.requests_enqueued,
            snapshot.requests_duplicate,
            snapshot.requests_sent,
            snapshot.requests_succeeded,
            snapshot.requests_failed,
            snapshot.requests_dropped
        )?;
        writeln!(
            f,
            "  response : received: {}, downloaded: {}, parse failures: {}",
            snapshot.responses_received,
            snapshot.formatted_bytes(),
            snapshot.parse_failures
        )?;
        writeln!(
            f,
            "  items    : scraped: {}, processed: {}, dropped: {}",
            snapshot.items_scraped, snapshot.items_processed, snapshot.items_dropped_by_pipeline
        )?;

        let status_string = snapshot
            .status_codes(", ", |code, count| format!("{}: {}", code, count))
            .unwrap_or_else(|| "none".to_string());
        writeln!(f, "  status   : {}\n", status_string)
    }
}
