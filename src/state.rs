//! Work accounting for idle detection.
//!
//! Every unit of work is counted in exactly one place at any time: a request
//! sits in the scheduler's pending count until the scheduler hands it to the
//! downloader, where it becomes in flight. A downloaded page moves to
//! `parsing_responses` before `in_flight_requests` is released, and each
//! item enters `processing_items` before it is sent to the pipelines. Each
//! counter is incremented for the next stage before it is decremented for
//! the previous one, so the crawl can only look idle when it really is.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters of the engine's actors.
#[derive(Debug, Default)]
pub struct CrawlerState {
    /// Requests handed to the downloader and not yet parsed or failed.
    pub in_flight_requests: AtomicUsize,
    /// Responses queued for or being handled by `Spider::parse`.
    pub parsing_responses: AtomicUsize,
    /// Items queued for or travelling through the pipelines.
    pub processing_items: AtomicUsize,
}

impl CrawlerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True when no request, response or item is being worked on.
    pub fn is_idle(&self) -> bool {
        self.in_flight_requests.load(Ordering::SeqCst) == 0
            && self.parsing_responses.load(Ordering::SeqCst) == 0
            && self.processing_items.load(Ordering::SeqCst) == 0
    }
}
