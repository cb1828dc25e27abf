//! # Downloader Module
//!
//! The `Downloader` trait is the seam between the engine and the network.
//! `ReqwestClientDownloader` is the default implementation; tests plug in
//! their own to serve canned pages.

use crate::error::SpiderError;
use crate::middleware::OffsiteMiddleware;
use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, trace};

const MAX_REDIRECTS: usize = 10;

/// Fetches requests and turns them into responses.
#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    /// The underlying client, handed to middlewares.
    type Client: Send + Sync + Clone + 'static;

    fn client(&self) -> &Self::Client;

    /// Downloads `request`. A non-2xx status is still a successful download;
    /// the engine decides what to do with it.
    async fn download<P>(&self, request: Request<P>) -> Result<Response<P>, SpiderError>
    where
        P: Send + 'static;
}

/// Settings for the default HTTP client.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Hosts redirects may lead to, with the same matching rules as
    /// `OffsiteMiddleware`. Empty allows every host.
    pub allowed_domains: Vec<String>,
}

impl DownloaderConfig {
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        DownloaderConfig {
            timeout: Duration::from_secs(30),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            allowed_domains: Vec::new(),
        }
    }
}

/// A `Downloader` backed by `reqwest`.
///
/// Redirects are followed only while they stay on the allowed domains. A
/// redirect to any other host is not fetched; the 3xx response itself is
/// returned and the engine treats it as a failed fetch.
#[derive(Debug, Clone)]
pub struct ReqwestClientDownloader {
    client: reqwest::Client,
}

impl ReqwestClientDownloader {
    pub fn new(config: DownloaderConfig) -> Result<Self, SpiderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .redirect(redirect_policy(OffsiteMiddleware::new(config.allowed_domains)))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

fn redirect_policy(offsite: OffsiteMiddleware) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if offsite.is_allowed(attempt.url()) {
            attempt.follow()
        } else {
            debug!("Not following offsite redirect to {}", attempt.url());
            attempt.stop()
        }
    })
}

#[async_trait]
impl Downloader for ReqwestClientDownloader {
    type Client = reqwest::Client;

    fn client(&self) -> &Self::Client {
        &self.client
    }

    async fn download<P>(&self, request: Request<P>) -> Result<Response<P>, SpiderError>
    where
        P: Send + 'static,
    {
        trace!("GET {}", request.url);
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .send()
            .await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(request, status, body)
            .with_url(final_url)
            .with_headers(headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RedirectServer;
    use reqwest::StatusCode;

    fn downloader(allowed: &[&str]) -> ReqwestClientDownloader {
        let config = DownloaderConfig::default().with_allowed_domains(allowed.iter().copied());
        ReqwestClientDownloader::new(config).unwrap()
    }

    #[tokio::test]
    async fn does_not_follow_redirects_off_the_allow_list() {
        let server = RedirectServer::start().await;
        let request = Request::new(server.onsite_url("/"), ());

        let response = downloader(&["127.0.0.1"]).download(request).await.unwrap();

        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.url.host_str(), Some("127.0.0.1"));
        assert_eq!(server.offsite_hits(), 0);
    }

    #[tokio::test]
    async fn follows_redirects_that_stay_on_the_allow_list() {
        let server = RedirectServer::start().await;
        let request = Request::new(server.onsite_url("/"), ());

        let response = downloader(&["127.0.0.1", "localhost"])
            .download(request)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.url.host_str(), Some("localhost"));
        assert_eq!(server.offsite_hits(), 1);
    }

    #[tokio::test]
    async fn follows_any_redirect_without_an_allow_list() {
        let server = RedirectServer::start().await;
        let request = Request::new(server.onsite_url("/"), ());

        let response = downloader(&[]).download(request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(server.offsite_hits(), 1);
    }

    #[test]
    fn invalid_client_settings_are_reported() {
        let config = DownloaderConfig {
            user_agent: "bad\nagent".to_string(),
            ..DownloaderConfig::default()
        };
        assert!(ReqwestClientDownloader::new(config).is_err());
    }
}
