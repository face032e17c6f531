//! Utility functions for the relay

pub mod http;
pub mod time;
pub mod url;

pub use http::*;
pub use time::*;
pub use url::*;
