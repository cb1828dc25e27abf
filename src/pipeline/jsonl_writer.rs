use super::Pipeline;
use crate::error::PipelineError;
use crate::item::ScrapedItem;
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Writes every item as one JSON object per line.
pub struct JsonLinesWriterPipeline {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesWriterPipeline {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        info!("Writing JSON Lines records to {:?}", path);
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

#[async_trait]
impl<I: ScrapedItem> Pipeline<I> for JsonLinesWriterPipeline {
    fn name(&self) -> &str {
        "JsonLinesWriterPipeline"
    }

    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError> {
        let line = serde_json::to_string(&item)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(Some(item))
    }

    async fn close(&self) -> Result<(), PipelineError> {
        self.writer.lock().await.flush()?;
        debug!("Flushed JSON Lines export {:?}", self.path);
        Ok(())
    }
}
