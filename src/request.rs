//! # Request Module
//!
//! A `Request` is one scheduled fetch: the URL to download plus the routing
//! tag that tells the spider which handler should parse the response.

use reqwest::Method;
use url::Url;

/// A fetch scheduled by a spider.
///
/// `P` is the spider's page routing tag (see `Spider::Page`). It travels
/// with the request through the engine and comes back on the `Response`.
#[derive(Debug, Clone)]
pub struct Request<P> {
    pub url: Url,
    pub method: Method,
    pub page: P,
}

impl<P> Request<P> {
    /// Creates a `GET` request for `url`, routed to `page`.
    pub fn new(url: Url, page: P) -> Self {
        Request {
            url,
            method: Method::GET,
            page,
        }
    }

    /// Identity used by the scheduler to skip requests already seen in
    /// this run. The fragment never reaches the server, so it is ignored.
    pub fn fingerprint(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method, url)
    }
}
