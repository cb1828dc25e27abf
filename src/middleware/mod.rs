//! # Middleware Module
//!
//! Request and response hooks that run around every download.
//!
//! Request middlewares run in registration order before the download; response
//! middlewares run in reverse order afterwards. Any of them may stop a
//! request or response from travelling further by returning
//! `MiddlewareAction::Drop`.

pub mod offsite;

use crate::error::SpiderError;
use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;

pub use offsite::OffsiteMiddleware;

/// What the engine should do after a middleware has seen a request or response.
#[derive(Debug)]
pub enum MiddlewareAction<T> {
    /// Hand the (possibly modified) value to the next stage.
    Continue(T),
    /// Stop processing this value.
    Drop,
}

/// A hook around the download of every request.
#[async_trait]
pub trait Middleware<C, P>: Send + Sync
where
    C: Send + Sync + 'static,
    P: Send + 'static,
{
    /// Name used in log lines.
    fn name(&self) -> &str;

    async fn process_request(
        &mut self,
        _client: &C,
        request: Request<P>,
    ) -> Result<MiddlewareAction<Request<P>>, SpiderError> {
        Ok(MiddlewareAction::Continue(request))
    }

    async fn process_response(
        &mut self,
        response: Response<P>,
    ) -> Result<MiddlewareAction<Response<P>>, SpiderError> {
        Ok(MiddlewareAction::Continue(response))
    }
}
