//! # Scheduler Module
//!
//! The crawl frontier: a FIFO queue of pending requests plus in-run
//! de-duplication by request fingerprint.
//!
//! ## Overview
//!
//! Spiders and the engine push requests with `enqueue_request`. A background
//! loop pops them in order and feeds them to the downloader over a bounded
//! channel. A request whose fingerprint has already been enqueued during
//! this run is skipped; nothing is remembered across runs.
//!
//! Enqueueing is synchronous: the pending count is raised before
//! `enqueue_request` returns, so a parser that has just enqueued its
//! follow-up requests can never make the crawl look idle.
//!
//! ## Example
//!
//! ```rust,ignore
//! let state = CrawlerState::new();
//! let (scheduler, request_receiver) = Scheduler::new(state, 100);
//! scheduler.enqueue_request(Request::new(url, PageKind::Root))?;
//! ```

use crate::error::SpiderError;
use crate::request::Request;
use crate::state::CrawlerState;
use crossbeam::queue::SegQueue;
use kanal::{AsyncReceiver, AsyncSender, bounded_async};
use moka::sync::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::{debug, error, info, trace, warn};

const VISITED_CAPACITY: u64 = 100_000;
const MAX_PENDING_REQUESTS: usize = 100_000;

pub struct Scheduler<P> {
    request_queue: SegQueue<Request<P>>,
    visited_urls: Cache<String, ()>,
    wakeup: Notify,
    pending_requests: AtomicUsize,
    pub(crate) is_shutting_down: AtomicBool,
    max_pending_requests: usize,
}

impl<P> Scheduler<P>
where
    P: Send + 'static,
{
    /// Creates a scheduler and starts its dispatch loop.
    ///
    /// Returns the scheduler and the receiving end of the request channel the
    /// downloader reads from.
    pub fn new(
        state: Arc<CrawlerState>,
        channel_capacity: usize,
    ) -> (Arc<Self>, AsyncReceiver<Request<P>>) {
        let (tx_req_out, rx_req_out) = bounded_async(channel_capacity.max(1));

        let scheduler = Arc::new(Scheduler {
            request_queue: SegQueue::new(),
            visited_urls: Cache::builder().max_capacity(VISITED_CAPACITY).build(),
            wakeup: Notify::new(),
            pending_requests: AtomicUsize::new(0),
            is_shutting_down: AtomicBool::new(false),
            max_pending_requests: MAX_PENDING_REQUESTS,
        });

        let scheduler_clone = Arc::clone(&scheduler);
        tokio::spawn(async move {
            scheduler_clone.run_loop(state, tx_req_out).await;
        });

        (scheduler, rx_req_out)
    }

    async fn run_loop(&self, state: Arc<CrawlerState>, tx_req_out: AsyncSender<Request<P>>) {
        info!(
            "Scheduler run_loop started with max pending requests: {}",
            self.max_pending_requests
        );
        loop {
            if self.is_shutting_down.load(Ordering::SeqCst) {
                break;
            }

            let Some(request) = self.request_queue.pop() else {
                trace!("No pending requests, waiting for wakeup");
                self.wakeup.notified().await;
                continue;
            };

            trace!("Sending request to downloader: {}", request.url);
            // Count the request as in flight before it stops being pending.
            state.in_flight_requests.fetch_add(1, Ordering::SeqCst);
            self.pending_requests.fetch_sub(1, Ordering::SeqCst);

            if tx_req_out.send(request).await.is_err() {
                state.in_flight_requests.fetch_sub(1, Ordering::SeqCst);
                if !self.is_shutting_down.load(Ordering::SeqCst) {
                    error!("Downloader receiver dropped. Scheduler can no longer send requests.");
                }
                break;
            }
        }
        info!(
            "Scheduler run_loop finished with {} pending requests remaining.",
            self.pending_requests.load(Ordering::SeqCst)
        );
    }

    /// Adds a request to the frontier.
    ///
    /// Returns `Ok(false)` when the request was already seen in this run and
    /// was skipped.
    pub fn enqueue_request(&self, request: Request<P>) -> Result<bool, SpiderError> {
        if self.is_shutting_down.load(Ordering::SeqCst) {
            return Err(SpiderError::GeneralError(format!(
                "Scheduler is shutting down, request not enqueued: {}",
                request.url
            )));
        }

        let current_pending = self.pending_requests.load(Ordering::SeqCst);
        if current_pending >= self.max_pending_requests {
            warn!(
                "Maximum pending requests reached ({}), request dropped: {}",
                self.max_pending_requests, request.url
            );
            return Err(SpiderError::GeneralError(
                "Scheduler at maximum capacity, request dropped.".into(),
            ));
        }

        let fingerprint = request.fingerprint();
        let entry = self.visited_urls.entry(fingerprint).or_insert(());
        if !entry.is_fresh() {
            trace!("Request already seen, skipping: {}", request.url);
            return Ok(false);
        }

        trace!("Enqueuing request: {}", request.url);
        self.pending_requests.fetch_add(1, Ordering::SeqCst);
        self.request_queue.push(request);
        self.wakeup.notify_one();
        Ok(true)
    }

    /// Stops the dispatch loop. Requests still queued are discarded.
    pub fn shutdown(&self) {
        if self.is_shutting_down.swap(true, Ordering::SeqCst) {
            debug!("Scheduler already shutting down");
            return;
        }
        info!("Scheduler received shutdown signal.");
        self.wakeup.notify_one();
    }

    /// True if a request with this fingerprint was enqueued during this run.
    pub fn has_been_visited(&self, fingerprint: &str) -> bool {
        self.visited_urls.contains_key(fingerprint)
    }

    /// Number of requests waiting in the frontier.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending_requests.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.is_empty()
    }
}
