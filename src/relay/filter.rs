//! Request eligibility filter
//!
//! Decides, per intercepted request, whether the relay should act or whether
//! the request should pass through to the engine's own handling unmodified.
//! Only top-level document navigations over plain http(s) to external hosts
//! qualify; sub-resource fetches keep their normal caching and performance
//! behavior by never entering the relay.

use tracing::trace;

use crate::config::settings::FilterConfig;
use crate::models::InterceptedRequest;
use crate::utils::{is_web_scheme, parse_url};

/// Pure per-request eligibility decision. Total: unparsable or missing
/// inputs resolve to "not eligible", never to a panic.
pub struct RequestFilter {
    config: FilterConfig,
}

impl RequestFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Whether the relay should handle this request at all.
    pub fn should_relay(&self, request: &InterceptedRequest) -> bool {
        let url = match parse_url(&request.url) {
            Ok(url) => url,
            Err(_) => {
                trace!("Unparsable URL, not eligible: {}", request.url);
                return false;
            }
        };

        // The host shell's private scheme serves the surface's own content
        if self
            .config
            .local_schemes
            .iter()
            .any(|scheme| url.scheme().eq_ignore_ascii_case(scheme))
        {
            return false;
        }

        if !is_web_scheme(&url) {
            return false;
        }

        // Never intercept the embedding surface's own local content
        match url.host_str() {
            Some(host) => {
                if self
                    .config
                    .local_hosts
                    .iter()
                    .any(|local| host.eq_ignore_ascii_case(local))
                {
                    return false;
                }
            }
            None => return false,
        }

        // Only document requests are affected by anti-framing headers;
        // the Accept header is the navigation signal.
        match request.header("Accept") {
            Some(accept) => accept.contains("text/html"),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn document_headers() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            "Accept".to_string(),
            "text/html,application/xhtml+xml,*/*".to_string(),
        );
        headers
    }

    fn filter() -> RequestFilter {
        RequestFilter::new(FilterConfig::default())
    }

    #[test]
    fn test_document_request_to_external_host_is_eligible() {
        let request =
            InterceptedRequest::new("GET", "https://example.com/watch", document_headers());
        assert!(filter().should_relay(&request));

        let request = InterceptedRequest::new("GET", "http://example.com/", document_headers());
        assert!(filter().should_relay(&request));
    }

    #[test]
    fn test_non_web_schemes_are_not_eligible() {
        for url in [
            "capacitor://localhost/index.html",
            "file:///tmp/page.html",
            "data:text/html,hi",
            "about:blank",
            "//example.com/scheme-relative",
            "not a url at all",
        ] {
            let request = InterceptedRequest::new("GET", url, document_headers());
            assert!(!filter().should_relay(&request), "should reject {}", url);
        }
    }

    #[test]
    fn test_local_hosts_are_not_eligible() {
        for url in [
            "http://localhost:5173/",
            "http://127.0.0.1/index.html",
            "https://LOCALHOST/app",
        ] {
            let request = InterceptedRequest::new("GET", url, document_headers());
            assert!(!filter().should_relay(&request), "should reject {}", url);
        }
    }

    #[test]
    fn test_subdomain_of_localhost_is_external() {
        let request =
            InterceptedRequest::new("GET", "https://localhost.example.com/", document_headers());
        assert!(filter().should_relay(&request));
    }

    #[test]
    fn test_sub_resource_requests_pass_through() {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "image/avif,image/webp,*/*".to_string());
        let request = InterceptedRequest::new("GET", "https://example.com/logo.png", headers);
        assert!(!filter().should_relay(&request));
    }

    #[test]
    fn test_missing_accept_header_is_not_eligible() {
        let request = InterceptedRequest::new("GET", "https://example.com/", HashMap::new());
        assert!(!filter().should_relay(&request));
    }

    #[test]
    fn test_accept_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("accept".to_string(), "text/html,*/*".to_string());
        let request = InterceptedRequest::new("GET", "https://example.com/", headers);
        assert!(filter().should_relay(&request));
    }
}
