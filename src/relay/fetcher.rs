//! Outbound relay fetch
//!
//! Re-issues an intercepted document request to its origin, mirroring
//! method, headers and cookies. One fetch per request, no retries; every
//! network-level failure is a [`FetchError`] the orchestrator maps to
//! pass-through.

use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING, COOKIE};
use reqwest::Method;
use tracing::{debug, trace};

use crate::config::settings::FetchConfig;
use crate::error::{Error, FetchError, Result};
use crate::models::{BodyStream, InterceptedRequest, RawOriginResponse};

/// Outbound HTTP(S) transport for the relay.
///
/// Holds one shared client with connection pooling; the per-request
/// timeouts and redirect policy come from [`FetchConfig`].
pub struct RelayFetcher {
    client: reqwest::Client,
}

impl RelayFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build outbound client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch `request.url` with `request.method`, forwarding the intercepted
    /// headers and the bridged cookie header.
    pub async fn fetch(
        &self,
        request: &InterceptedRequest,
        cookie_header: Option<&str>,
    ) -> std::result::Result<RawOriginResponse, FetchError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| FetchError::Network(format!("Invalid method '{}': {}", request.method, e)))?;

        let headers = build_outbound_headers(request, cookie_header);

        debug!("🌐 Relaying {} {}", request.method, request.url);

        let response = self
            .client
            .request(method, &request.url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        let status_code = status.as_u16();
        // The origin's reason phrase is not exposed by the transport; the
        // canonical one is what the embedding surface gets, "OK" when the
        // code has none.
        let status_message = status
            .canonical_reason()
            .filter(|reason| !reason.is_empty())
            .unwrap_or("OK")
            .to_string();

        let mut origin_headers = Vec::new();
        for (name, value) in response.headers().iter() {
            match value.to_str() {
                Ok(value) => origin_headers.push((name.to_string(), value.to_string())),
                Err(_) => trace!("Skipping non-UTF-8 response header: {}", name),
            }
        }

        trace!(
            "Origin answered {} with {} headers",
            status_code,
            origin_headers.len()
        );

        // One stream regardless of status; error bodies (>= 400) flow
        // through it just like success bodies.
        let body: BodyStream = Box::pin(response.bytes_stream().map_err(FetchError::from));

        Ok(RawOriginResponse::new(
            status_code,
            status_message,
            origin_headers,
            body,
        ))
    }
}

/// Copy every intercepted request header except Accept-Encoding, then force
/// identity encoding.
///
/// Requesting compressed content would let the transport auto-decompress the
/// body while Content-Encoding stays on the headers, and the embedding
/// surface would then decompress a second time. Identity sidesteps that
/// entire bug class.
fn build_outbound_headers(
    request: &InterceptedRequest,
    cookie_header: Option<&str>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in &request.headers {
        if name.eq_ignore_ascii_case("accept-encoding") {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        } else {
            trace!("Skipping invalid request header: {}", name);
        }
    }

    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    // Cookies bridged from the embedding surface's store win over any
    // Cookie header the surface forwarded itself
    if let Some(cookies) = cookie_header.filter(|cookies| !cookies.is_empty()) {
        if let Ok(value) = HeaderValue::from_str(cookies) {
            headers.insert(COOKIE, value);
        }
    }

    headers
}
