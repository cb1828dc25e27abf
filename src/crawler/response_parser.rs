//! # Response Parser Module
//!
//! The parser actor: a fixed pool of workers that take downloaded responses,
//! call `Spider::parse`, and distribute the output.
//!
//! ## Fault isolation
//!
//! Each response is parsed on its own. When `parse` returns an error, or
//! panics, the worker logs the fault, counts it in `parse_failures`, and
//! moves on to the next response. No records come from the faulty page and
//! no other branch of the crawl is affected.
//!
//! ## Output distribution
//!
//! Follow-up requests go to the scheduler before the response stops counting
//! as "parsing", and items enter the processing count before they are sent
//! to the item processor, so idle detection never sees a gap.

use crate::item::ParseOutput;
use crate::response::Response;
use crate::scheduler::Scheduler;
use crate::spider::Spider;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use futures_util::FutureExt;
use kanal::{AsyncReceiver, AsyncSender};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

pub fn spawn_parser_task<S>(
    scheduler: Arc<Scheduler<S::Page>>,
    spider: Arc<S>,
    state: Arc<CrawlerState>,
    res_rx: AsyncReceiver<Response<S::Page>>,
    item_tx: AsyncSender<S::Item>,
    parser_workers: usize,
    stats: Arc<StatCollector>,
) -> tokio::task::JoinHandle<()>
where
    S: Spider,
{
    tokio::spawn(async move {
        trace!("Response parser started with {} workers", parser_workers);
        let mut workers = JoinSet::new();

        for worker_id in 0..parser_workers {
            let res_rx = res_rx.clone();
            let spider = Arc::clone(&spider);
            let scheduler = Arc::clone(&scheduler);
            let item_tx = item_tx.clone();
            let state = Arc::clone(&state);
            let stats = Arc::clone(&stats);

            workers.spawn(async move {
                while let Ok(response) = res_rx.recv().await {
                    let url = response.url.clone();
                    debug!("Worker {} parsing response from {}", worker_id, url);
                    let start_time = Instant::now();

                    match AssertUnwindSafe(spider.parse(response)).catch_unwind().await {
                        Ok(Ok(outputs)) => {
                            process_crawl_outputs::<S>(
                                outputs, &scheduler, &item_tx, &state, &stats,
                            )
                            .await;
                        }
                        Ok(Err(e)) => {
                            stats.increment_parse_failures();
                            error!("Spider parsing error for {}: {}", url, e);
                        }
                        Err(_) => {
                            stats.increment_parse_failures();
                            error!("Spider panicked while parsing {}", url);
                        }
                    }

                    trace!("Parsed {} in {:?}", url, start_time.elapsed());
                    state.parsing_responses.fetch_sub(1, Ordering::SeqCst);
                }
                trace!("Parser worker {} finished", worker_id);
            });
        }
        drop(item_tx);

        while let Some(res) = workers.join_next().await {
            if let Err(e) = res {
                error!("A parsing worker task failed: {:?}", e);
            }
        }
        trace!("Response parser finished");
    })
}

pub async fn process_crawl_outputs<S>(
    outputs: ParseOutput<S::Item, S::Page>,
    scheduler: &Scheduler<S::Page>,
    item_tx: &AsyncSender<S::Item>,
    state: &CrawlerState,
    stats: &StatCollector,
) where
    S: Spider,
{
    let (items, requests) = outputs.into_parts();
    let items_len = items.len();
    let requests_len = requests.len();

    if requests_len == 0 && items_len == 0 {
        trace!("Spider output contained no requests or items");
        return;
    }
    debug!(
        "Processing {} requests and {} items from spider output.",
        requests_len, items_len
    );

    let mut request_error_total = 0;
    for request in requests {
        match scheduler.enqueue_request(request) {
            Ok(true) => stats.increment_requests_enqueued(),
            Ok(false) => stats.increment_requests_duplicate(),
            Err(e) => {
                if scheduler.is_shutting_down.load(Ordering::SeqCst) {
                    trace!("Scheduler is shutting down: {}", e);
                } else {
                    error!("Failed to enqueue request: {}", e);
                }
                request_error_total += 1;
            }
        }
    }
    if request_error_total > 0 {
        warn!(
            "Failed to enqueue {} of {} requests.",
            request_error_total, requests_len
        );
    }

    stats.add_items_scraped(items_len);
    let mut item_error_total = 0;
    for item in items {
        state.processing_items.fetch_add(1, Ordering::SeqCst);
        if item_tx.send(item).await.is_err() {
            state.processing_items.fetch_sub(1, Ordering::SeqCst);
            item_error_total += 1;
        }
    }
    if item_error_total > 0 {
        warn!(
            "Failed to send {} of {} scraped items, item channel closed.",
            item_error_total, items_len
        );
    }
}
