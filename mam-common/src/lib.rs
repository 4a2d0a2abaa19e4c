//! # mam-common
//!
//! Shared code for the mam-naming crates:
//! - Error and Result types
//! - TOML configuration loading and resolution
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LoggingConfig, NamingConfig, NamingConfigResolver};
pub use error::{Error, Result};
