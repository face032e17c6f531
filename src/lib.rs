//! Header-Stripping Relay - an embedded forward-proxy core
//!
//! This library intercepts document-level HTTP(S) requests from an embedding
//! browser surface, re-issues them to the origin, and rewrites the response
//! so that content normally forbidden from being framed (X-Frame-Options /
//! Content-Security-Policy) can be displayed inside an embedding container.
//! Requests the relay cannot or should not handle pass through to the
//! engine's default handling, silently.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod relay;
pub mod utils;

// Re-export commonly used items
pub use config::settings::{FetchConfig, FilterConfig, RelayConfig, RewriteConfig};
pub use error::{Error, FetchError, Result};
pub use logging::{init_logger, init_logger_with_env, init_logger_with_level};
pub use models::{
    BodyStream, InterceptedRequest, RawOriginResponse, RelayLog, RelayOutcome, RelayResponse,
};
pub use relay::{
    CookieBridge, CookieStore, HeaderStrippingRelay, InterceptOutcome, MemoryCookieStore,
    RelayFetcher, RequestFilter, RequestInterceptor, ResponseRewriter,
};
