//! # Crawler Module
//!
//! The engine that drives a crawl.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler ──requests──▶ Downloader ──responses──▶ Parser pool ──items──▶ Item processor
//!     ▲                   (middlewares)                   │                  (pipelines)
//!     └──────────────────── follow-up requests ───────────┘
//! ```
//!
//! Each arrow is a bounded `kanal` channel and each box runs in its own Tokio
//! task. The `Crawler` wires them together and decides when the crawl is over.
//!
//! ## Internal Components
//!
//! - `spawn_downloader_task`: downloads requests through the middleware chain
//! - `spawn_parser_task`: runs `Spider::parse` on a fixed pool of workers
//! - `spawn_item_processor_task`: pushes items through the pipelines
//! - `SharedMiddlewareManager`: the middleware chain shared by download tasks

mod core;
mod item_processor;
mod middleware_manager;
mod request_handler;
mod response_parser;

pub use self::core::Crawler;
pub(crate) use item_processor::{SharedPipelines, spawn_item_processor_task};
pub(crate) use middleware_manager::{BoxedMiddleware, SharedMiddlewareManager};
pub(crate) use request_handler::spawn_downloader_task;
pub(crate) use response_parser::spawn_parser_task;
