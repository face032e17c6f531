//! Header-stripping relay
//!
//! One relay operation per intercepted request: Filter decides eligibility,
//! Fetcher re-issues the request to the origin, the Cookie Bridge syncs both
//! directions, and the Rewriter strips forbidden headers and repackages the
//! response. Any disqualification or failure along the path resolves to
//! pass-through, so a broken relay never blocks a page load — it only loses
//! the header-stripping benefit for that one request.

pub mod cookies;
pub mod fetcher;
pub mod filter;
pub mod rewriter;

pub use cookies::{CookieBridge, CookieStore, MemoryCookieStore};
pub use fetcher::RelayFetcher;
pub use filter::RequestFilter;
pub use rewriter::ResponseRewriter;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::settings::RelayConfig;
use crate::error::Result;
use crate::models::{InterceptedRequest, RelayLog, RelayOutcome, RelayResponse};
use crate::utils::duration_to_ms;

/// Outcome handed back to the embedding engine's interception hook.
pub enum InterceptOutcome {
    /// Substitute this response for the engine's own fetch.
    Response(RelayResponse),
    /// Sentinel: let the engine handle the request normally.
    PassThrough,
}

impl InterceptOutcome {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, InterceptOutcome::PassThrough)
    }
}

/// Request-interception hook consumed by the embedding browser engine.
///
/// An injected strategy rather than an engine subclass: the engine calls
/// [`intercept`](Self::intercept) on each request from one of its worker
/// invocations and either substitutes the returned response or falls back to
/// its default handling.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, request: &InterceptedRequest) -> InterceptOutcome;
}

/// The relay core: stateless per request, safe to share across concurrent
/// interceptions. The only cross-request state is the cookie store, whose
/// concurrency discipline is its own.
pub struct HeaderStrippingRelay {
    filter: RequestFilter,
    fetcher: RelayFetcher,
    bridge: CookieBridge,
    rewriter: ResponseRewriter,
}

impl HeaderStrippingRelay {
    pub fn new(config: RelayConfig, store: Arc<dyn CookieStore>) -> Result<Self> {
        Ok(Self {
            filter: RequestFilter::new(config.filter),
            fetcher: RelayFetcher::new(&config.fetch)?,
            bridge: CookieBridge::new(store),
            rewriter: ResponseRewriter::new(config.rewrite),
        })
    }

    /// Run the full relay path for one intercepted request.
    ///
    /// Every error kind, without exception, resolves to pass-through; no
    /// error is surfaced to the caller and nothing is retried.
    pub async fn relay(&self, request: &InterceptedRequest) -> InterceptOutcome {
        let started = Instant::now();

        if !self.filter.should_relay(request) {
            debug!("⏭️  Pass-through (ineligible): {} {}", request.method, request.url);
            self.log_outcome(request, RelayOutcome::PassThrough, None, Some("ineligible"), started);
            return InterceptOutcome::PassThrough;
        }

        let cookie_header = self.bridge.outbound_cookies(&request.url);

        let origin = match self.fetcher.fetch(request, cookie_header.as_deref()).await {
            Ok(origin) => origin,
            Err(err) => {
                warn!("❌ Relay fetch failed, falling back: {} ({})", request.url, err);
                self.log_outcome(
                    request,
                    RelayOutcome::PassThrough,
                    None,
                    Some(&err.to_string()),
                    started,
                );
                return InterceptOutcome::PassThrough;
            }
        };

        self.bridge.apply_response_cookies(&request.url, &origin);

        let status_code = origin.status_code;
        match self.rewriter.build(origin) {
            Ok(response) => {
                debug!(
                    "✅ Relayed {} {} ({} in {}ms)",
                    request.method,
                    request.url,
                    status_code,
                    duration_to_ms(started.elapsed())
                );
                self.log_outcome(request, RelayOutcome::Relayed, Some(status_code), None, started);
                InterceptOutcome::Response(response)
            }
            Err(err) => {
                warn!("❌ Relay rewrite failed, falling back: {} ({})", request.url, err);
                self.log_outcome(
                    request,
                    RelayOutcome::PassThrough,
                    Some(status_code),
                    Some(&err.to_string()),
                    started,
                );
                InterceptOutcome::PassThrough
            }
        }
    }

    fn log_outcome(
        &self,
        request: &InterceptedRequest,
        outcome: RelayOutcome,
        status_code: Option<u16>,
        reason: Option<&str>,
        started: Instant,
    ) {
        let mut entry = RelayLog::new(
            request.method.clone(),
            request.url.clone(),
            outcome,
            duration_to_ms(started.elapsed()),
        );
        entry.status_code = status_code;
        entry.reason = reason.map(|reason| reason.to_string());
        crate::log_relay_transaction!(&entry);
    }
}

#[async_trait]
impl RequestInterceptor for HeaderStrippingRelay {
    async fn intercept(&self, request: &InterceptedRequest) -> InterceptOutcome {
        self.relay(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn relay() -> HeaderStrippingRelay {
        HeaderStrippingRelay::new(RelayConfig::default(), Arc::new(MemoryCookieStore::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ineligible_request_passes_through_without_fetching() {
        // A local-content URL never reaches the network, so this is safe
        // even with no server listening.
        let request = InterceptedRequest::new(
            "GET",
            "capacitor://localhost/index.html",
            HashMap::new(),
        );
        assert!(relay().relay(&request).await.is_pass_through());
    }

    #[tokio::test]
    async fn test_sub_resource_request_passes_through() {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "text/css,*/*;q=0.1".to_string());
        let request = InterceptedRequest::new("GET", "https://example.com/site.css", headers);
        assert!(relay().relay(&request).await.is_pass_through());
    }

    #[tokio::test]
    async fn test_interceptor_trait_object_dispatch() {
        let interceptor: Arc<dyn RequestInterceptor> = Arc::new(relay());
        let request = InterceptedRequest::new("GET", "file:///page.html", HashMap::new());
        assert!(interceptor.intercept(&request).await.is_pass_through());
    }
}
