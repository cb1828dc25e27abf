//! # Error Module
//!
//! Error types shared by the crawl engine, the pipelines and the spider.
//!
//! `SpiderError` is what every engine component and `Spider::parse` return.
//! `PipelineError` is raised by item pipelines and converts into
//! `SpiderError` so pipeline failures can travel through the same paths.

use thiserror::Error;

/// Errors raised while building or running a crawl.
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("{0}")]
    GeneralError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("HTTP request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A model page whose breadcrumb trail is too short to hold the
    /// manufacturer, category and model names.
    #[error("Breadcrumb on {url} has {found} nodes, expected at least {expected}")]
    BreadcrumbTooShort {
        url: String,
        found: usize,
        expected: usize,
    },

    #[error("Pipeline error: {0}")]
    PipelineError(#[from] PipelineError),
}

/// Errors raised by item pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
