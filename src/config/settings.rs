//! Relay configuration settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for the header-stripping relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Log level configuration
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Outbound fetch configuration
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Request eligibility configuration
    #[serde(default)]
    pub filter: FilterConfig,

    /// Response rewriting configuration
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

/// Outbound fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds for the whole response
    pub read_timeout_secs: u64,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,
}

/// Request eligibility configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Hosts that serve the embedding surface's own content, never relayed
    pub local_hosts: Vec<String>,

    /// Private schemes the host shell serves local content from
    pub local_schemes: Vec<String>,
}

/// Response rewriting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Header names removed from every relayed response.
    ///
    /// The anti-framing headers are the point of the relay; the transport
    /// headers (content-encoding, content-length, transfer-encoding) are
    /// invalidated by the fetcher's identity-encoding behavior and must not
    /// reach the embedding surface.
    pub stripped_headers: Vec<String>,

    /// MIME type used when the origin sends no usable Content-Type
    pub default_mime_type: String,

    /// Charset used when the origin's Content-Type names none
    pub default_charset: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            fetch: FetchConfig::default(),
            filter: FilterConfig::default(),
            rewrite: RewriteConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            read_timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            local_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            local_schemes: vec!["capacitor".to_string()],
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            stripped_headers: vec![
                "x-frame-options".to_string(),
                "content-security-policy".to_string(),
                "frame-options".to_string(),
                "content-encoding".to_string(),
                "content-length".to_string(),
                "transfer-encoding".to_string(),
            ],
            default_mime_type: "text/html".to_string(),
            default_charset: "UTF-8".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl RelayConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: RelayConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load configuration from `relay.yml` if present, falling back to
    /// defaults, with environment variable overrides applied on top
    pub fn load_config() -> Result<Self> {
        let config_path = "relay.yml";

        let mut config = if Path::new(config_path).exists() {
            Self::from_yaml_file(config_path)?
        } else {
            Self::default()
        };

        if let Ok(log_level) = std::env::var("RUST_LOG") {
            config.log_level = log_level;
        }

        if let Ok(timeout) = std::env::var("RELAY_CONNECT_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                config.fetch.connect_timeout_secs = timeout;
            }
        }

        if let Ok(timeout) = std::env::var("RELAY_READ_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                config.fetch.read_timeout_secs = timeout;
            }
        }

        Ok(config)
    }
}
