//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve log level and log directory from `MINDMAP_LOG_LEVEL` /
//!   `MINDMAP_LOG_DIR`.
//! - Start engine logging once per process when a directory is configured.

use mindmap_core::{default_log_level, init_logging, LoggingError};
use std::path::PathBuf;

pub const LOG_LEVEL_ENV: &str = "MINDMAP_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "MINDMAP_LOG_DIR";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ApiConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    /// Starts logging when a directory is configured.
    ///
    /// Returns `Ok(false)` when logging is off. Repeating the call with the
    /// same settings is a no-op.
    ///
    /// # Errors
    /// - Any `LoggingError` from the engine logger setup.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match &self.log_dir {
            Some(log_dir) => init_logging(&self.log_level, log_dir).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ApiConfig::from_lookup(|key| match key {
            LOG_LEVEL_ENV => Some("   ".to_string()),
            LOG_DIR_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config, ApiConfig::default());
    }

    #[test]
    fn values_are_trimmed() {
        let config = ApiConfig::from_lookup(|key| match key {
            LOG_LEVEL_ENV => Some(" warn ".to_string()),
            LOG_DIR_ENV => Some(" /var/log/mindmap ".to_string()),
            _ => None,
        });
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/mindmap")));
    }

    #[test]
    fn logging_stays_off_without_directory() {
        assert_eq!(ApiConfig::default().init_logging(), Ok(false));
    }
}
