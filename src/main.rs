//! Command-line entry point: crawls the urparts.com catalogue and writes
//! every part record to a file.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use urparts_crawler::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Jsonl,
}

#[derive(Debug, Parser)]
#[command(name = "urparts-crawler", version, about = "Crawl the urparts.com parts catalogue")]
struct Cli {
    /// File the part records are written to.
    #[arg(short, long, default_value = "urparts_crawled_data.csv")]
    output: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Maximum number of concurrent downloads.
    #[arg(short, long, default_value_t = 16)]
    concurrency: usize,

    /// Number of parser workers (defaults to the CPU count, between 4 and 16).
    #[arg(short, long)]
    parsers: Option<usize>,

    /// Also print every record to stdout as JSON.
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut builder = CrawlerBuilder::new(UrpartsSpider::new())?
        .max_concurrent_downloads(cli.concurrency);
    if let Some(parsers) = cli.parsers {
        builder = builder.max_parser_workers(parsers);
    }

    builder = match cli.format {
        Format::Csv => builder.add_pipeline(CsvExporterPipeline::create(&cli.output)?),
        Format::Jsonl => builder.add_pipeline(JsonLinesWriterPipeline::create(&cli.output)?),
    };
    if cli.stdout {
        builder = builder.add_pipeline(ConsoleWriterPipeline::new());
    }

    let crawler = builder.build().await?;
    info!("Writing records to {}", cli.output.display());
    crawler.start_crawl().await?;
    Ok(())
}
