//! Runs requests and responses through the registered middlewares.
//!
//! Middlewares take `&mut self`, so the chain sits behind one async mutex
//! shared by every download task. The lock is held for one pass of the
//! chain, never across a download.

use crate::error::SpiderError;
use crate::middleware::{Middleware, MiddlewareAction};
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::trace;

pub(crate) type BoxedMiddleware<C, P> = Box<dyn Middleware<C, P> + Send + Sync>;

/// The ordered middleware chain.
pub struct MiddlewareManager<C, P> {
    middlewares: Vec<BoxedMiddleware<C, P>>,
}

impl<C, P> MiddlewareManager<C, P>
where
    C: Send + Sync + 'static,
    P: Send + 'static,
{
    pub fn new(middlewares: Vec<BoxedMiddleware<C, P>>) -> Self {
        Self { middlewares }
    }

    /// Passes a request through every middleware in registration order.
    pub async fn process_request(
        &mut self,
        client: &C,
        request: Request<P>,
    ) -> Result<MiddlewareAction<Request<P>>, SpiderError> {
        let mut current_request = request;

        for middleware in self.middlewares.iter_mut() {
            match middleware.process_request(client, current_request).await? {
                MiddlewareAction::Continue(req) => current_request = req,
                MiddlewareAction::Drop => {
                    trace!("Request dropped by {}", middleware.name());
                    return Ok(MiddlewareAction::Drop);
                }
            }
        }

        Ok(MiddlewareAction::Continue(current_request))
    }

    /// Passes a response through every middleware in reverse order.
    pub async fn process_response(
        &mut self,
        response: Response<P>,
    ) -> Result<MiddlewareAction<Response<P>>, SpiderError> {
        let mut current_response = response;

        for middleware in self.middlewares.iter_mut().rev() {
            match middleware.process_response(current_response).await? {
                MiddlewareAction::Continue(res) => current_response = res,
                MiddlewareAction::Drop => {
                    trace!("Response dropped by {}", middleware.name());
                    return Ok(MiddlewareAction::Drop);
                }
            }
        }

        Ok(MiddlewareAction::Continue(current_response))
    }
}

/// A cloneable handle on one `MiddlewareManager`.
pub struct SharedMiddlewareManager<C, P> {
    manager: Arc<Mutex<MiddlewareManager<C, P>>>,
}

impl<C, P> SharedMiddlewareManager<C, P>
where
    C: Send + Sync + 'static,
    P: Send + 'static,
{
    pub fn new(middlewares: Vec<BoxedMiddleware<C, P>>) -> Self {
        Self {
            manager: Arc::new(Mutex::new(MiddlewareManager::new(middlewares))),
        }
    }

    pub async fn process_request(
        &self,
        client: &C,
        request: Request<P>,
    ) -> Result<MiddlewareAction<Request<P>>, SpiderError> {
        self.manager
            .lock()
            .await
            .process_request(client, request)
            .await
    }

    pub async fn process_response(
        &self,
        response: Response<P>,
    ) -> Result<MiddlewareAction<Response<P>>, SpiderError> {
        self.manager.lock().await.process_response(response).await
    }
}

impl<C, P> Clone for SharedMiddlewareManager<C, P> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::OffsiteMiddleware;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use url::Url;

    struct Tagger(&'static str);

    #[async_trait]
    impl Middleware<(), Vec<&'static str>> for Tagger {
        fn name(&self) -> &str {
            self.0
        }

        async fn process_request(
            &mut self,
            _client: &(),
            mut request: Request<Vec<&'static str>>,
        ) -> Result<MiddlewareAction<Request<Vec<&'static str>>>, SpiderError> {
            request.page.push(self.0);
            Ok(MiddlewareAction::Continue(request))
        }
    }

    type Chain = BoxedMiddleware<(), Vec<&'static str>>;

    fn request(url: &str) -> Request<Vec<&'static str>> {
        Request::new(Url::parse(url).unwrap(), Vec::new())
    }

    #[tokio::test]
    async fn requests_run_in_registration_order() {
        let manager = SharedMiddlewareManager::new(vec![
            Box::new(Tagger("first")) as Chain,
            Box::new(Tagger("second")),
        ]);
        let action = manager
            .process_request(&(), request("https://example.com/"))
            .await
            .unwrap();
        match action {
            MiddlewareAction::Continue(req) => assert_eq!(req.page, vec!["first", "second"]),
            MiddlewareAction::Drop => panic!("request should not be dropped"),
        }
    }

    #[tokio::test]
    async fn drop_stops_the_chain() {
        let manager = SharedMiddlewareManager::new(vec![
            Box::new(OffsiteMiddleware::new(["urparts.com"])) as Chain,
            Box::new(Tagger("after")),
        ]);
        let action = manager
            .process_request(&(), request("https://example.com/"))
            .await
            .unwrap();
        assert!(matches!(action, MiddlewareAction::Drop));
    }

    #[tokio::test]
    async fn responses_pass_through_by_default() {
        let manager = SharedMiddlewareManager::new(vec![Box::new(Tagger("only")) as Chain]);
        let response = Response::new(request("https://example.com/"), StatusCode::OK, "body");
        let action = manager.process_response(response).await.unwrap();
        assert!(matches!(action, MiddlewareAction::Continue(_)));
    }
}
