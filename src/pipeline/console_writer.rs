use super::Pipeline;
use crate::error::PipelineError;
use crate::item::ScrapedItem;
use async_trait::async_trait;

/// Prints every item to stdout as one line of JSON.
#[derive(Debug, Default)]
pub struct ConsoleWriterPipeline;

impl ConsoleWriterPipeline {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<I: ScrapedItem> Pipeline<I> for ConsoleWriterPipeline {
    fn name(&self) -> &str {
        "ConsoleWriterPipeline"
    }

    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError> {
        println!("{}", serde_json::to_string(&item)?);
        Ok(Some(item))
    }
}
