//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; binaries and test harnesses that
//! embed the pipeline call [`init_tracing`] once at startup.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber
///
/// `RUST_LOG` wins over the configured level when set. Returns an error instead
/// of panicking if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::Config(format!("invalid log level '{}': {}", config.level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Config(format!("tracing already initialized: {}", e)))
}
