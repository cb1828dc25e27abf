//! The item processor actor.
//!
//! Every scraped item passes through the pipelines in registration order.
//! Up to `max_concurrent_pipelines` items are in the pipelines at once.

use crate::item::ScrapedItem;
use crate::pipeline::Pipeline;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use kanal::AsyncReceiver;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

pub(crate) type SharedPipelines<I> = Arc<Vec<Box<dyn Pipeline<I>>>>;

pub fn spawn_item_processor_task<I>(
    state: Arc<CrawlerState>,
    item_rx: AsyncReceiver<I>,
    pipelines: SharedPipelines<I>,
    max_concurrent_pipelines: usize,
    stats: Arc<StatCollector>,
) -> tokio::task::JoinHandle<()>
where
    I: ScrapedItem,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent_pipelines));

    trace!(
        "Starting item processor with max_concurrent_pipelines: {}",
        max_concurrent_pipelines
    );
    tokio::spawn(async move {
        let mut tasks = JoinSet::new();

        while let Ok(item) = item_rx.recv().await {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed, shutting down item processor actor.");
                    state.processing_items.fetch_sub(1, Ordering::SeqCst);
                    break;
                }
            };

            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!("An item processing task failed: {:?}", e);
                }
            }

            let state = Arc::clone(&state);
            let pipelines = Arc::clone(&pipelines);
            let stats = Arc::clone(&stats);

            tasks.spawn(async move {
                if run_pipelines(item, &pipelines, &stats).await {
                    stats.increment_items_processed();
                }
                state.processing_items.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            });
        }

        trace!("Waiting for active item processing tasks to complete");
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!("An item processing task failed: {:?}", e);
            }
        }
        trace!("Item processor finished");
    })
}

/// Returns `true` when the item made it through every pipeline.
async fn run_pipelines<I: ScrapedItem>(
    item: I,
    pipelines: &[Box<dyn Pipeline<I>>],
    stats: &StatCollector,
) -> bool {
    let mut current = item;
    for pipeline in pipelines {
        match pipeline.process_item(current).await {
            Ok(Some(next)) => current = next,
            Ok(None) => {
                debug!("Pipeline '{}' dropped item", pipeline.name());
                stats.increment_items_dropped_by_pipeline();
                return false;
            }
            Err(e) => {
                error!("Pipeline '{}' error: {}", pipeline.name(), e);
                stats.increment_items_dropped_by_pipeline();
                return false;
            }
        }
    }
    true
}
