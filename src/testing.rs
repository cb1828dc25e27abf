//! Test doubles: a downloader serving canned pages, a pipeline that keeps
//! every item, a local HTTP server that redirects off its own host, and HTML
//! builders for the catalogue templates.

use crate::downloader::Downloader;
use crate::error::{PipelineError, SpiderError};
use crate::item::ScrapedItem;
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// HTTP server on `127.0.0.1` that answers every request addressed to that
/// host with `302 Location: http://localhost:<port>/offsite`. Requests that
/// arrive for `localhost` get `200 OK` and are counted as offsite hits.
pub(crate) struct RedirectServer {
    port: u16,
    offsite_hits: Arc<AtomicUsize>,
}

impl RedirectServer {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let offsite_hits = Arc::new(AtomicUsize::new(0));

        let hits = Arc::clone(&offsite_hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let hits = Arc::clone(&hits);
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let read = socket.read(&mut buf).await.unwrap_or(0);
                    let head = String::from_utf8_lossy(&buf[..read]).to_ascii_lowercase();

                    let reply = if head.contains("\r\nhost: localhost") {
                        hits.fetch_add(1, Ordering::SeqCst);
                        let body = "<html><body>offsite</body></html>";
                        format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        )
                    } else {
                        format!(
                            "HTTP/1.1 302 Found\r\nLocation: http://localhost:{port}/offsite\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        )
                    };
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { port, offsite_hits }
    }

    /// A URL on the server's own (allowed) host.
    pub(crate) fn onsite_url(&self, path: &str) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}{}", self.port, path)).unwrap()
    }

    /// Requests that reached the server under the `localhost` host name.
    pub(crate) fn offsite_hits(&self) -> usize {
        self.offsite_hits.load(Ordering::SeqCst)
    }
}

/// Serves pages from memory. Unknown URLs answer `404 Not Found`.
#[derive(Debug, Default)]
pub(crate) struct StaticDownloader {
    pages: HashMap<String, (StatusCode, String)>,
}

impl StaticDownloader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, url: &str, body: String) -> Self {
        self.status_page(url, StatusCode::OK, body)
    }

    pub(crate) fn status_page(mut self, url: &str, status: StatusCode, body: String) -> Self {
        self.pages.insert(url.to_string(), (status, body));
        self
    }
}

#[async_trait]
impl Downloader for StaticDownloader {
    type Client = ();

    fn client(&self) -> &Self::Client {
        &()
    }

    async fn download<P>(&self, request: Request<P>) -> Result<Response<P>, SpiderError>
    where
        P: Send + 'static,
    {
        let (status, body) = self
            .pages
            .get(request.url.as_str())
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, String::new()));
        Ok(Response::new(request, status, body))
    }
}

/// Keeps a copy of every item it sees. Clones share the same store.
#[derive(Debug)]
pub(crate) struct CollectingPipeline<I> {
    items: Arc<Mutex<Vec<I>>>,
}

impl<I> CollectingPipeline<I> {
    pub(crate) fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<I: Clone> CollectingPipeline<I> {
    pub(crate) fn items(&self) -> Vec<I> {
        self.items.lock().unwrap().clone()
    }
}

impl<I> Clone for CollectingPipeline<I> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

#[async_trait]
impl<I: ScrapedItem> Pipeline<I> for CollectingPipeline<I> {
    fn name(&self) -> &str {
        "CollectingPipeline"
    }

    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError> {
        self.items.lock().unwrap().push(item.clone());
        Ok(Some(item))
    }
}

/// HTML shaped like the urparts.com catalogue templates.
pub(crate) mod fixtures {
    fn anchors(hrefs: &[&str]) -> String {
        hrefs
            .iter()
            .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
            .collect()
    }

    /// Root or manufacturer page linking to `hrefs`.
    pub(crate) fn listing_page(hrefs: &[&str]) -> String {
        format!(
            r#"<html><body><div id="content"><div><div><ul>{}</ul></div></div></div></body></html>"#,
            anchors(hrefs)
        )
    }

    /// Category page whose model list (second container) links to `hrefs`.
    pub(crate) fn category_page(hrefs: &[&str]) -> String {
        format!(
            r#"<html><body><div id="content"><div><div><p>Models</p></div><div><ul>{}</ul></div></div></div></body></html>"#,
            anchors(hrefs)
        )
    }

    pub(crate) fn full_breadcrumb<'a>(
        manufacturer: &'a str,
        category: &'a str,
        model: &'a str,
    ) -> [&'a str; 6] {
        ["Home", "Catalogue", "Parts", manufacturer, category, model]
    }

    /// Model page with the given breadcrumb trail and `(part, category)`
    /// entries.
    pub(crate) fn model_page(breadcrumb: &[&str], parts: &[(&str, &str)]) -> String {
        let trail: String = breadcrumb
            .iter()
            .map(|name| format!(r#"<a href="/">{name}</a>"#))
            .collect();
        let items: String = parts
            .iter()
            .map(|(part, category)| {
                format!(r#"<li><a href="/part">{part}<span>{category}</span></a></li>"#)
            })
            .collect();
        format!(
            r#"<html><body><div id="path">{trail}</div><div id="content"><div><div><div><ul>{items}</ul></div></div></div></div></body></html>"#
        )
    }
}
