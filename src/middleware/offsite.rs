//! Filters out requests whose host is not on the spider's allow-list.

use super::{Middleware, MiddlewareAction};
use crate::error::SpiderError;
use crate::request::Request;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Drops requests for hosts outside `allowed_domains`.
///
/// A host passes when it equals an allowed domain or is a subdomain of one,
/// so `urparts.com` admits `www.urparts.com`. An empty list admits every host.
#[derive(Debug, Clone, Default)]
pub struct OffsiteMiddleware {
    allowed_domains: Vec<String>,
}

impl OffsiteMiddleware {
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.into().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn is_allowed(&self, url: &Url) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.allowed_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

#[async_trait]
impl<C, P> Middleware<C, P> for OffsiteMiddleware
where
    C: Send + Sync + 'static,
    P: Send + 'static,
{
    fn name(&self) -> &str {
        "OffsiteMiddleware"
    }

    async fn process_request(
        &mut self,
        _client: &C,
        request: Request<P>,
    ) -> Result<MiddlewareAction<Request<P>>, SpiderError> {
        if self.is_allowed(&request.url) {
            Ok(MiddlewareAction::Continue(request))
        } else {
            debug!("Filtered offsite request to {}", request.url);
            Ok(MiddlewareAction::Drop)
        }
    }
}
