//! The downloader actor.
//!
//! Receives requests from the scheduler, runs them through the request
//! middlewares, downloads them with at most `max_concurrent_downloads` in
//! flight, runs the responses back through the middlewares, and forwards
//! successful (2xx) pages to the parser actor.
//!
//! A failed fetch (network error, timeout, non-2xx status) is logged and
//! counted; no `parse` call follows, so that branch of the crawl ends there.

use crate::Downloader;
use crate::crawler::SharedMiddlewareManager;
use crate::middleware::MiddlewareAction;
use crate::request::Request;
use crate::response::Response;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use kanal::{AsyncReceiver, AsyncSender};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

pub fn spawn_downloader_task<D, P>(
    req_rx: AsyncReceiver<Request<P>>,
    downloader: Arc<D>,
    middlewares: SharedMiddlewareManager<D::Client, P>,
    state: Arc<CrawlerState>,
    res_tx: AsyncSender<Response<P>>,
    max_concurrent_downloads: usize,
    stats: Arc<StatCollector>,
) -> tokio::task::JoinHandle<()>
where
    D: Downloader,
    P: Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent_downloads));

    tokio::spawn(async move {
        trace!(
            "Downloader task started with max_concurrent_downloads: {}",
            max_concurrent_downloads
        );
        let mut tasks = JoinSet::new();

        while let Ok(request) = req_rx.recv().await {
            trace!("Received request for URL: {}", request.url);

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Download semaphore closed, shutting down downloader task.");
                    state.in_flight_requests.fetch_sub(1, Ordering::SeqCst);
                    break;
                }
            };

            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!("A download task failed: {:?}", e);
                }
            }

            let downloader = Arc::clone(&downloader);
            let middlewares = middlewares.clone();
            let res_tx = res_tx.clone();
            let state = Arc::clone(&state);
            let stats = Arc::clone(&stats);

            tasks.spawn(async move {
                if let Some(response) = fetch(request, &downloader, &middlewares, &stats).await {
                    trace!("Sending response for URL: {}", response.url);
                    // Hand over to the parser before releasing the in-flight slot.
                    state.parsing_responses.fetch_add(1, Ordering::SeqCst);
                    if res_tx.send(response).await.is_err() {
                        error!("Response channel closed, cannot send response to parser.");
                        state.parsing_responses.fetch_sub(1, Ordering::SeqCst);
                    }
                }
                state.in_flight_requests.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            });
        }

        trace!("Waiting for active download tasks to complete");
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!("A download task failed: {:?}", e);
            }
        }
        trace!("Downloader task finished");
    })
}

async fn fetch<D, P>(
    request: Request<P>,
    downloader: &Arc<D>,
    middlewares: &SharedMiddlewareManager<D::Client, P>,
    stats: &Arc<StatCollector>,
) -> Option<Response<P>>
where
    D: Downloader,
    P: Send + Sync + 'static,
{
    let request_url = request.url.clone();

    let request = match middlewares.process_request(downloader.client(), request).await {
        Ok(MiddlewareAction::Continue(req)) => req,
        Ok(MiddlewareAction::Drop) => {
            debug!("Request dropped by middleware for URL: {}", request_url);
            stats.increment_requests_dropped();
            return None;
        }
        Err(e) => {
            error!("Request middleware error for URL {}: {}", request_url, e);
            stats.increment_requests_dropped();
            return None;
        }
    };

    trace!("Downloading request for URL: {}", request.url);
    stats.increment_requests_sent();
    let start_time = Instant::now();

    let response = match downloader.download(request).await {
        Ok(response) => response,
        Err(e) => {
            error!(
                "Download error for URL {} after {:?}: {}",
                request_url,
                start_time.elapsed(),
                e
            );
            stats.increment_requests_failed();
            return None;
        }
    };

    trace!(
        "Downloaded {} ({}) in {:?}",
        response.url,
        response.status,
        start_time.elapsed()
    );
    stats.increment_responses_received();
    stats.record_response_status(response.status.as_u16());
    stats.add_bytes_downloaded(response.body.len());

    if !response.status.is_success() {
        error!(
            "Ignoring response with status {} for URL: {}",
            response.status, request_url
        );
        stats.increment_requests_failed();
        return None;
    }
    stats.increment_requests_succeeded();

    match middlewares.process_response(response).await {
        Ok(MiddlewareAction::Continue(res)) => Some(res),
        Ok(MiddlewareAction::Drop) => {
            debug!("Response dropped by middleware for URL: {}", request_url);
            stats.increment_requests_dropped();
            None
        }
        Err(e) => {
            error!("Response middleware error for URL {}: {}", request_url, e);
            stats.increment_requests_dropped();
            None
        }
    }
}
