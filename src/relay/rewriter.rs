//! Response rewriting
//!
//! Rebuilds an origin response for the embedding surface: drops the
//! anti-framing headers the relay exists to remove, drops the transport
//! headers the identity-encoding fetch invalidated, collapses multi-value
//! headers to their first value, and resolves MIME type and charset. The
//! body passes through untouched.

use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::config::settings::RewriteConfig;
use crate::error::FetchError;
use crate::models::{RawOriginResponse, RelayResponse};

/// Deterministic, stateless header/metadata rewriter.
pub struct ResponseRewriter {
    config: RewriteConfig,
    stripped: HashSet<String>,
}

impl ResponseRewriter {
    pub fn new(config: RewriteConfig) -> Self {
        let stripped = config
            .stripped_headers
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        Self { config, stripped }
    }

    /// Whether `name` belongs to the strip set, regardless of casing.
    pub fn is_stripped(&self, name: &str) -> bool {
        self.stripped.contains(&name.to_ascii_lowercase())
    }

    /// Build the relayed response. The only failure mode is a missing body
    /// stream, which the caller maps to pass-through.
    pub fn build(&self, mut origin: RawOriginResponse) -> Result<RelayResponse, FetchError> {
        let body = origin.take_body()?;

        let headers = self.filter_headers(&origin.headers);
        let (mime_type, charset) = self.parse_content_type(origin.first_header("content-type"));

        trace!(
            "Rewrote response: {} -> {} headers, mime={}, charset={}",
            origin.headers.len(),
            headers.len(),
            mime_type,
            charset
        );

        Ok(RelayResponse {
            mime_type,
            charset,
            status_code: origin.status_code,
            status_message: origin.status_message,
            headers,
            body,
        })
    }

    /// Exclude-by-predicate header transform: strip-set members are dropped,
    /// and for repeated names (case-insensitive) only the first value
    /// survives. Idempotent.
    pub fn filter_headers(&self, headers: &[(String, String)]) -> HashMap<String, String> {
        let mut filtered = HashMap::new();
        let mut seen = HashSet::new();

        for (name, value) in headers {
            let lower = name.to_ascii_lowercase();
            if self.stripped.contains(&lower) {
                continue;
            }
            if seen.insert(lower) {
                filtered.insert(name.clone(), value.clone());
            }
        }

        filtered
    }

    /// Split `Content-Type` on `;`: first segment is the MIME type, the rest
    /// is scanned for a `charset=` parameter (case-insensitive key, value
    /// may be quoted). Missing pieces fall back to the configured defaults.
    fn parse_content_type(&self, content_type: Option<&str>) -> (String, String) {
        let mut mime_type = self.config.default_mime_type.clone();
        let mut charset = self.config.default_charset.clone();

        if let Some(raw) = content_type {
            let mut segments = raw.split(';');

            if let Some(first) = segments.next() {
                let first = first.trim();
                if !first.is_empty() {
                    mime_type = first.to_string();
                }
            }

            for segment in segments {
                if let Some((key, value)) = segment.split_once('=') {
                    if key.trim().eq_ignore_ascii_case("charset") {
                        let value = value.trim().trim_matches('"').trim();
                        if !value.is_empty() {
                            charset = value.to_string();
                        }
                    }
                }
            }
        }

        (mime_type, charset)
    }
}
