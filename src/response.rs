//! # Response Module
//!
//! A `Response` is a fetched page handed to the spider. It keeps the request
//! that produced it so the spider can route on the request's page tag, and
//! it parses its body into an HTML document for selector-based extraction.

use crate::request::Request;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use scraper::Html;
use std::borrow::Cow;
use url::Url;

/// A downloaded page.
#[derive(Debug, Clone)]
pub struct Response<P> {
    /// Final URL after redirects. Relative links resolve against it.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    request: Request<P>,
}

impl<P> Response<P> {
    /// Creates a response for `request` whose final URL is the request's URL.
    pub fn new(request: Request<P>, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Response {
            url: request.url.clone(),
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            request,
        }
    }

    /// Replaces the final URL, e.g. after the client followed a redirect.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The request this response answers.
    pub fn request_from_response(&self) -> &Request<P> {
        &self.request
    }

    /// The routing tag of the originating request.
    pub fn page(&self) -> &P {
        &self.request.page
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parses the body as an HTML document.
    ///
    /// `Html` is not `Send`; keep it out of scope across `.await` points.
    pub fn to_html(&self) -> Html {
        Html::parse_document(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn parses_body_as_html() {
        let request = Request::new(Url::parse("https://example.com/").unwrap(), ());
        let response = Response::new(request, StatusCode::OK, "<p id=\"x\">hello</p>");
        let html = response.to_html();
        let selector = Selector::parse("#x").unwrap();
        let text: String = html.select(&selector).flat_map(|e| e.text()).collect();
        assert_eq!(text, "hello");
    }

    #[test]
    fn redirect_url_replaces_request_url() {
        let request = Request::new(Url::parse("http://example.com/a").unwrap(), 7u8);
        let response = Response::new(request, StatusCode::OK, "")
            .with_url(Url::parse("https://example.com/b").unwrap());
        assert_eq!(response.url.as_str(), "https://example.com/b");
        assert_eq!(response.request_from_response().url.as_str(), "http://example.com/a");
        assert_eq!(*response.page(), 7);
    }
}
