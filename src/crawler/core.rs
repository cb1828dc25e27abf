//! The `Crawler`: owns the scheduler, downloader, middlewares, spider and
//! pipelines, and runs a crawl from the spider's start requests until the
//! frontier is exhausted.
//!
//! Four long-running tasks do the work (scheduler loop, downloader, parser
//! pool, item processor). `start_crawl` seeds the frontier, waits until
//! every counter in `CrawlerState` and the scheduler reads zero (or Ctrl-C
//! arrives), then shuts the tasks down in pipeline order and closes the
//! item pipelines.

use super::{BoxedMiddleware, SharedPipelines};
use crate::Downloader;
use crate::error::SpiderError;
use crate::request::Request;
use crate::scheduler::Scheduler;
use crate::spider::Spider;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use futures_util::future::join_all;
use kanal::{AsyncReceiver, bounded_async};
use std::sync::{Arc, atomic::Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);
const IDLE_CONFIRM_DELAY: Duration = Duration::from_millis(50);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs one crawl of a spider. Built with `CrawlerBuilder`.
pub struct Crawler<S: Spider, D: Downloader> {
    scheduler: Arc<Scheduler<S::Page>>,
    req_rx: AsyncReceiver<Request<S::Page>>,
    state: Arc<CrawlerState>,
    stats: Arc<StatCollector>,
    downloader: Arc<D>,
    middlewares: Vec<BoxedMiddleware<D::Client, S::Page>>,
    spider: Arc<S>,
    item_pipelines: SharedPipelines<S::Item>,
    max_concurrent_downloads: usize,
    parser_workers: usize,
    max_concurrent_pipelines: usize,
    channel_capacity: usize,
}

impl<S, D> Crawler<S, D>
where
    S: Spider,
    D: Downloader,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        scheduler: Arc<Scheduler<S::Page>>,
        req_rx: AsyncReceiver<Request<S::Page>>,
        state: Arc<CrawlerState>,
        downloader: Arc<D>,
        middlewares: Vec<BoxedMiddleware<D::Client, S::Page>>,
        spider: S,
        item_pipelines: SharedPipelines<S::Item>,
        max_concurrent_downloads: usize,
        parser_workers: usize,
        max_concurrent_pipelines: usize,
        channel_capacity: usize,
        stats: Arc<StatCollector>,
    ) -> Self {
        Crawler {
            scheduler,
            req_rx,
            state,
            stats,
            downloader,
            middlewares,
            spider: Arc::new(spider),
            item_pipelines,
            max_concurrent_downloads,
            parser_workers,
            max_concurrent_pipelines,
            channel_capacity,
        }
    }

    /// Runs the crawl to completion.
    ///
    /// Fetch failures and parse faults are logged and counted, never
    /// returned; the crawl only ends early on Ctrl-C.
    pub async fn start_crawl(self) -> Result<(), SpiderError> {
        let Crawler {
            scheduler,
            req_rx,
            state,
            stats,
            downloader,
            middlewares,
            spider,
            item_pipelines,
            max_concurrent_downloads,
            parser_workers,
            max_concurrent_pipelines,
            channel_capacity,
        } = self;

        info!(
            "Crawler '{}' starting: max_concurrent_downloads={}, parser_workers={}, max_concurrent_pipelines={}",
            spider.name(),
            max_concurrent_downloads,
            parser_workers,
            max_concurrent_pipelines
        );

        let (res_tx, res_rx) = bounded_async(channel_capacity);
        let (item_tx, item_rx) = bounded_async(channel_capacity);

        trace!("Spawning downloader task");
        let downloader_task = super::spawn_downloader_task(
            req_rx,
            downloader,
            super::SharedMiddlewareManager::new(middlewares),
            Arc::clone(&state),
            res_tx.clone(),
            max_concurrent_downloads,
            Arc::clone(&stats),
        );

        trace!("Spawning parser task");
        let parser_task = super::spawn_parser_task::<S>(
            Arc::clone(&scheduler),
            Arc::clone(&spider),
            Arc::clone(&state),
            res_rx,
            item_tx.clone(),
            parser_workers,
            Arc::clone(&stats),
        );

        trace!("Spawning item processor task");
        let item_processor_task = super::spawn_item_processor_task(
            Arc::clone(&state),
            item_rx,
            Arc::clone(&item_pipelines),
            max_concurrent_pipelines,
            Arc::clone(&stats),
        );

        enqueue_start_requests(spider.as_ref(), &scheduler, &stats);

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, initiating graceful shutdown.");
            }
            _ = wait_until_idle(&scheduler, &state) => {
                info!("Crawl has become idle, initiating shutdown.");
            }
        };

        trace!("Closing communication channels");
        drop(res_tx);
        drop(item_tx);
        scheduler.shutdown();

        let mut task_set = tokio::task::JoinSet::new();
        task_set.spawn(downloader_task);
        task_set.spawn(parser_task);
        task_set.spawn(item_processor_task);

        let joined = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while let Some(result) = task_set.join_next().await {
                match result {
                    Ok(Err(e)) => error!("Task failed during shutdown: {}", e),
                    Err(e) => error!("Task failed during shutdown: {}", e),
                    Ok(Ok(())) => trace!("Task completed during shutdown"),
                }
            }
        })
        .await;

        if joined.is_err() {
            warn!(
                "Tasks did not complete within {}s, aborting remaining tasks.",
                SHUTDOWN_TIMEOUT.as_secs()
            );
            task_set.abort_all();
        }

        info!("Closing item pipelines...");
        let closing = join_all(item_pipelines.iter().map(|p| p.close())).await;
        for (pipeline, result) in item_pipelines.iter().zip(closing) {
            if let Err(e) = result {
                error!("Failed to close pipeline '{}': {}", pipeline.name(), e);
            }
        }
        debug!("All item pipelines closed");

        info!(
            "Crawl finished. requests_enqueued={}, requests_succeeded={}, items_scraped={}, parse_failures={}",
            stats.requests_enqueued.load(Ordering::SeqCst),
            stats.requests_succeeded.load(Ordering::SeqCst),
            stats.items_scraped.load(Ordering::SeqCst),
            stats.parse_failures.load(Ordering::SeqCst)
        );
        info!("{}", stats);
        Ok(())
    }

    /// The statistics collector of this crawl, readable during and after it.
    pub fn get_stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.stats)
    }
}

fn enqueue_start_requests<S: Spider>(
    spider: &S,
    scheduler: &Scheduler<S::Page>,
    stats: &StatCollector,
) {
    let requests = match spider.start_requests() {
        Ok(requests) => requests,
        Err(e) => {
            error!("Failed to create start requests: {}", e);
            return;
        }
    };

    for mut request in requests {
        request.url.set_fragment(None);
        match scheduler.enqueue_request(request) {
            Ok(true) => stats.increment_requests_enqueued(),
            Ok(false) => stats.increment_requests_duplicate(),
            Err(e) => error!("Failed to enqueue initial request: {}", e),
        }
    }
}

async fn wait_until_idle<P: Send + 'static>(scheduler: &Scheduler<P>, state: &CrawlerState) {
    loop {
        if scheduler.is_idle() && state.is_idle() {
            tokio::time::sleep(IDLE_CONFIRM_DELAY).await;
            if scheduler.is_idle() && state.is_idle() {
                return;
            }
        }
        tokio::time::sleep(IDLE_POLL_INTERVAL).await;
    }
}
