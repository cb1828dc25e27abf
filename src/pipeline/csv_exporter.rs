//! CSV export of scraped items.
//!
//! Columns follow the item's field declaration order. The header row is
//! written with the first item, so an empty crawl produces an empty file.

use super::Pipeline;
use crate::error::PipelineError;
use crate::item::ScrapedItem;
use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct CsvExporterPipeline {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvExporterPipeline {
    /// Creates (or truncates) the CSV file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let writer = csv::Writer::from_path(&path)?;
        info!("Writing CSV records to {:?}", path);
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }
}

#[async_trait]
impl<I: ScrapedItem> Pipeline<I> for CsvExporterPipeline {
    fn name(&self) -> &str {
        "CsvExporterPipeline"
    }

    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError> {
        self.writer.lock().await.serialize(&item)?;
        Ok(Some(item))
    }

    async fn close(&self) -> Result<(), PipelineError> {
        self.writer.lock().await.flush()?;
        debug!("Flushed CSV export {:?}", self.path);
        Ok(())
    }
}
