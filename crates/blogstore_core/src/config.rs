//! Runtime configuration for embedding the store.
//!
//! # Responsibility
//! - Collect database and logging settings in one place.
//! - Read overrides from `BLOGSTORE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "BLOGSTORE_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "BLOGSTORE_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "BLOGSTORE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BLOGSTORE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "blogstore.sqlite3";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "`{key}` must be a non-negative integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Store settings with defaults suitable for local use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub busy_timeout_ms: u64,
    /// Overrides the build-mode default level when set.
    pub log_level: Option<String>,
    /// File logging stays off unless a directory is provided.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Builds a config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = non_blank(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(raw) = non_blank(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw.clone(),
            })?;
        }
        config.log_level = non_blank(ENV_LOG_LEVEL);
        config.log_dir = non_blank(ENV_LOG_DIR).map(PathBuf::from);

        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, ENV_BUSY_TIMEOUT_MS, ENV_DB_PATH, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_keys_keep_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn overrides_are_applied() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/tmp/blog.db"),
            (ENV_BUSY_TIMEOUT_MS, " 250 "),
            (ENV_LOG_DIR, "/tmp/logs"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/blog.db"));
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[(ENV_BUSY_TIMEOUT_MS, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: ENV_BUSY_TIMEOUT_MS,
                ..
            }
        ));
    }
}
