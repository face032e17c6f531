//! Relay configuration module

pub mod settings;

pub use settings::{FetchConfig, FilterConfig, RelayConfig, RewriteConfig};
