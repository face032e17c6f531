use crate::models::RelayLog;
use anyhow::Result;
use log::LevelFilter;
use std::sync::Once;
use tracing::{debug, Level};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Initialize the global logger with production-grade configuration
/// This should be called once at the start of the host application
pub fn init_logger() {
    INIT.call_once(|| {
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .pretty()
            .init();

        // Initialize LogTracer to bridge log events to tracing (after subscriber is set up)
        if let Err(e) = LogTracer::init() {
            eprintln!("Warning: Failed to initialize LogTracer: {:?}", e);
        }

        log::set_max_level(LevelFilter::Debug);
    });
}

/// Initialize logger with a fixed maximum level
pub fn init_logger_with_level(level: Level) {
    INIT.call_once(|| {
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .pretty()
            .init();

        if let Err(e) = LogTracer::init() {
            eprintln!("Warning: Failed to initialize LogTracer: {:?}", e);
        }

        log::set_max_level(match level {
            Level::ERROR => LevelFilter::Error,
            Level::WARN => LevelFilter::Warn,
            Level::INFO => LevelFilter::Info,
            Level::DEBUG => LevelFilter::Debug,
            Level::TRACE => LevelFilter::Trace,
        });
    });
}

/// Initialize logger with environment variable support
/// Uses RUST_LOG environment variable for configuration
pub fn init_logger_with_env() {
    INIT.call_once(|| {
        let level = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string())
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::Info);

        log::set_max_level(level);

        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .pretty()
            .init();

        if let Err(e) = LogTracer::init() {
            eprintln!("Warning: Failed to initialize LogTracer: {:?}", e);
        }
    });
}

/// Log a relay transaction record at debug level
pub fn log_transaction(log_entry: &RelayLog) -> Result<()> {
    let log_message = serde_json::to_string(log_entry)?;
    debug!("TRANSACTION: {}", log_message);
    Ok(())
}

/// Convenience macro for logging relay transactions
#[macro_export]
macro_rules! log_relay_transaction {
    ($log_entry:expr) => {
        if let Err(e) = $crate::logging::log_transaction($log_entry) {
            eprintln!("Failed to log transaction: {}", e);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelayOutcome;

    #[test]
    fn test_log_transaction_serializes() {
        let entry = RelayLog::new(
            "GET".to_string(),
            "https://example.com/".to_string(),
            RelayOutcome::PassThrough,
            12,
        );
        assert!(log_transaction(&entry).is_ok());
    }
}
