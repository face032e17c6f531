use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::FetchError;

/// Streamed response body handed to the embedding surface.
///
/// The relay never buffers or re-encodes the body; it is consumed exactly
/// once by whoever receives the [`RelayResponse`].
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// A request intercepted from the embedding browser surface.
///
/// Supplied per call by the engine's interception hook and never mutated by
/// the relay. Header lookup is case-insensitive via [`Self::header`].
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
}

impl InterceptedRequest {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response captured from the origin before rewriting.
///
/// Headers keep the origin's order and duplicates (Set-Cookie in particular
/// arrives as repeated entries). The body stream can be taken exactly once.
pub struct RawOriginResponse {
    pub status_code: u16,
    pub status_message: String,
    pub headers: Vec<(String, String)>,
    body: Option<BodyStream>,
}

impl std::fmt::Debug for RawOriginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawOriginResponse")
            .field("status_code", &self.status_code)
            .field("status_message", &self.status_message)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

impl RawOriginResponse {
    pub fn new(
        status_code: u16,
        status_message: impl Into<String>,
        headers: Vec<(String, String)>,
        body: BodyStream,
    ) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
            headers,
            body: Some(body),
        }
    }

    /// Construct a response that never had an obtainable body.
    ///
    /// [`Self::take_body`] on such a response reports [`FetchError::NoBody`],
    /// which the relay maps to pass-through.
    pub fn without_body(
        status_code: u16,
        status_message: impl Into<String>,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
            headers,
            body: None,
        }
    }

    /// Take ownership of the body stream. Fails if the stream was absent or
    /// already taken.
    pub fn take_body(&mut self) -> Result<BodyStream, FetchError> {
        self.body.take().ok_or(FetchError::NoBody)
    }

    /// First value for `name`, compared case-insensitively.
    pub fn first_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All values for `name` in origin order, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Rewritten response returned to the embedding surface in place of its own
/// fetch. Ownership transfers to the surface, which consumes the body once.
pub struct RelayResponse {
    pub mime_type: String,
    pub charset: String,
    pub status_code: u16,
    pub status_message: String,
    pub headers: HashMap<String, String>,
    pub body: BodyStream,
}

/// How a single intercepted request was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayOutcome {
    /// The relay substituted its own rewritten response.
    Relayed,
    /// The request was handed back to the engine's default handling.
    PassThrough,
}

// Per-request transaction record for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayLog {
    pub method: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: RelayOutcome,
    /// Origin status code when a fetch completed, relayed or not.
    pub status_code: Option<u16>,
    /// Why the request fell through, when it did.
    pub reason: Option<String>,
    pub duration_ms: u64,
}

impl RelayLog {
    pub fn new(method: String, url: String, outcome: RelayOutcome, duration_ms: u64) -> Self {
        Self {
            method,
            url,
            timestamp: crate::utils::now(),
            outcome,
            status_code: None,
            reason: None,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "text/html".to_string());
        let request = InterceptedRequest::new("GET", "https://example.com/", headers);

        assert_eq!(request.header("accept"), Some("text/html"));
        assert_eq!(request.header("ACCEPT"), Some("text/html"));
        assert_eq!(request.header("Accept-Encoding"), None);
    }

    #[test]
    fn test_take_body_fails_when_absent() {
        let mut origin = RawOriginResponse::without_body(200, "OK", vec![]);
        assert!(matches!(origin.take_body(), Err(FetchError::NoBody)));
    }

    #[test]
    fn test_take_body_is_one_shot() {
        let stream: BodyStream = Box::pin(futures::stream::empty());
        let mut origin = RawOriginResponse::new(200, "OK", vec![], stream);
        assert!(origin.take_body().is_ok());
        assert!(matches!(origin.take_body(), Err(FetchError::NoBody)));
    }

    #[test]
    fn test_header_values_preserve_origin_order() {
        let origin = RawOriginResponse::without_body(
            200,
            "OK",
            vec![
                ("Set-Cookie".to_string(), "a=1".to_string()),
                ("Content-Type".to_string(), "text/html".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
        );

        let cookies: Vec<&str> = origin.header_values("set-cookie").collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(origin.first_header("content-type"), Some("text/html"));
    }
}
