//! # Pipeline Module
//!
//! Item pipelines receive every scraped item after `parse`, in registration
//! order. A pipeline may pass the item on, transform it, or drop it by
//! returning `Ok(None)`. Exporters are pipelines that write items out and
//! pass them through unchanged.

pub mod console_writer;
pub mod csv_exporter;
pub mod jsonl_writer;

use crate::error::PipelineError;
use crate::item::ScrapedItem;
use async_trait::async_trait;

pub use console_writer::ConsoleWriterPipeline;
pub use csv_exporter::CsvExporterPipeline;
pub use jsonl_writer::JsonLinesWriterPipeline;

/// A stage every scraped item passes through.
#[async_trait]
pub trait Pipeline<I: ScrapedItem>: Send + Sync + 'static {
    /// Name used in log lines and pipeline statistics.
    fn name(&self) -> &str;

    /// Processes one item. `Ok(None)` drops it.
    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError>;

    /// Called once when the crawl ends, after the last item.
    async fn close(&self) -> Result<(), PipelineError> {
        Ok(())
    }
}
