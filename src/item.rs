//! # Item Module
//!
//! Scraped items and the `ParseOutput` container a spider returns from
//! `parse`.

use crate::request::Request;
use serde::Serialize;
use std::fmt::Debug;

/// Marker for values a spider can emit as scraped data.
///
/// Anything serializable, cloneable and thread-safe qualifies, so plain
/// `#[derive(Serialize)]` structs work without extra boilerplate.
pub trait ScrapedItem: Serialize + Debug + Clone + Send + Sync + 'static {}

impl<T> ScrapedItem for T where T: Serialize + Debug + Clone + Send + Sync + 'static {}

/// The items and follow-up requests produced by one `parse` call.
#[derive(Debug)]
pub struct ParseOutput<I, P> {
    items: Vec<I>,
    requests: Vec<Request<P>>,
}

impl<I, P> ParseOutput<I, P> {
    pub fn new() -> Self {
        ParseOutput {
            items: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: I) {
        self.items.push(item);
    }

    pub fn add_items(&mut self, items: impl IntoIterator<Item = I>) {
        self.items.extend(items);
    }

    pub fn add_request(&mut self, request: Request<P>) {
        self.requests.push(request);
    }

    pub fn add_requests(&mut self, requests: impl IntoIterator<Item = Request<P>>) {
        self.requests.extend(requests);
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn requests(&self) -> &[Request<P>] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.requests.is_empty()
    }

    /// Splits the output into its items and requests.
    pub fn into_parts(self) -> (Vec<I>, Vec<Request<P>>) {
        (self.items, self.requests)
    }
}

impl<I, P> Default for ParseOutput<I, P> {
    fn default() -> Self {
        Self::new()
    }
}
