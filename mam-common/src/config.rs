//! Configuration loading for the naming pipeline
//!
//! Resolution priority:
//! 1. `MAM_NAMING_CONFIG` environment variable (path to a TOML file)
//! 2. `<config_dir>/mam-naming/config.toml`
//! 3. Compiled defaults
//!
//! A missing TOML file is not fatal: a warning is logged and defaults are used.
//! A TOML file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tracker path budget (folder + "/" + file, in characters)
pub const DEFAULT_PATH_BUDGET: usize = 225;

/// Extension for generated file names
pub const DEFAULT_FILE_EXTENSION: &str = "m4b";

/// Smallest budget accepted by [`NamingConfig::validate`]
pub const MIN_PATH_BUDGET: usize = 64;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MAM_NAMING_CONFIG";

/// Environment variable overriding the path budget
pub const BUDGET_ENV: &str = "MAM_PATH_BUDGET";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. "info", "mam_naming=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_budget() -> usize {
    DEFAULT_PATH_BUDGET
}

fn default_extension() -> String {
    DEFAULT_FILE_EXTENSION.to_string()
}

/// Naming configuration (TOML file contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Hard maximum of folder name + separator + file name, in characters
    #[serde(default = "default_budget")]
    pub budget: usize,

    /// Extension appended to generated file names (without the dot)
    #[serde(default = "default_extension")]
    pub file_extension: String,

    /// Path to the JSON rule document
    #[serde(default)]
    pub rules_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_PATH_BUDGET,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            rules_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl NamingConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: NamingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.budget < MIN_PATH_BUDGET {
            return Err(Error::Config(format!(
                "budget {} is below the minimum of {}",
                self.budget, MIN_PATH_BUDGET
            )));
        }

        let ext = self.file_extension.trim();
        if ext.is_empty() {
            return Err(Error::Config("file_extension must not be empty".to_string()));
        }
        if ext.contains(['/', '\\', '.']) || ext.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "file_extension '{}' must be a bare extension such as \"m4b\"",
                self.file_extension
            )));
        }

        Ok(())
    }

    /// File extension without leading dot, lowercased
    pub fn normalized_extension(&self) -> String {
        self.file_extension.trim().trim_start_matches('.').to_lowercase()
    }
}

/// Resolves the effective [`NamingConfig`] from env, user config dir, and defaults
pub struct NamingConfigResolver {
    user_config_path: Option<PathBuf>,
}

impl NamingConfigResolver {
    /// Resolver using the platform config directory
    pub fn new() -> Self {
        Self {
            user_config_path: dirs::config_dir().map(|d| d.join("mam-naming").join("config.toml")),
        }
    }

    /// Resolver with an explicit fallback config path (tests, embedded use)
    pub fn with_user_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            user_config_path: Some(path.into()),
        }
    }

    /// Resolve the config file path, if any candidate exists
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            warn!(
                path = %path.display(),
                "{} points to a missing file, ignoring",
                CONFIG_PATH_ENV
            );
        }

        self.user_config_path
            .as_ref()
            .filter(|p| p.exists())
            .cloned()
    }

    /// Resolve the effective configuration
    ///
    /// Missing files degrade to defaults; unreadable or invalid files are errors.
    pub fn resolve(&self) -> Result<NamingConfig> {
        let mut config = match self.config_path() {
            Some(path) => {
                info!(path = %path.display(), "Loading naming config");
                NamingConfig::load_file(&path)?
            }
            None => {
                warn!("No naming config file found, using compiled defaults");
                NamingConfig::default()
            }
        };

        if let Ok(raw) = std::env::var(BUDGET_ENV) {
            let budget = raw.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("{} must be a positive integer, got '{}'", BUDGET_ENV, raw))
            })?;
            debug!(budget, "Budget overridden from environment");
            config.budget = budget;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for NamingConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NamingConfig::default();
        assert_eq!(config.budget, 225);
        assert_eq!(config.file_extension, "m4b");
        assert!(config.rules_path.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = NamingConfig::from_toml_str("budget = 200\n").unwrap();
        assert_eq!(config.budget, 200);
        assert_eq!(config.file_extension, "m4b");
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            budget = 180
            file_extension = "mp3"
            rules_path = "/etc/mam/rules.json"

            [logging]
            level = "mam_naming=debug"
        "#;
        let config = NamingConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.budget, 180);
        assert_eq!(config.file_extension, "mp3");
        assert_eq!(config.rules_path, Some(PathBuf::from("/etc/mam/rules.json")));
        assert_eq!(config.logging.level, "mam_naming=debug");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = NamingConfig::from_toml_str("budgte = 200\n");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_budget_below_minimum_rejected() {
        let result = NamingConfig::from_toml_str("budget = 10\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_extension_validation() {
        for bad in ["", "  ", "m4b/x", ".m4b", "m 4b"] {
            let config = NamingConfig {
                file_extension: bad.to_string(),
                ..NamingConfig::default()
            };
            assert!(config.validate().is_err(), "extension {:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_normalized_extension() {
        let config = NamingConfig {
            file_extension: " M4B ".to_string(),
            ..NamingConfig::default()
        };
        assert_eq!(config.normalized_extension(), "m4b");
    }
}
