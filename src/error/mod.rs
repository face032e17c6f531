//! Error handling module for the relay

use thiserror::Error;

/// Reasons a single outbound relay fetch can fail.
///
/// Every variant resolves to pass-through at the orchestrator; none of them
/// is retried or surfaced to the embedding engine.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Origin response carried no readable body")]
    NoBody,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Custom error type for the relay crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type for the relay crate
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Unknown(err.to_string())
    }
}
