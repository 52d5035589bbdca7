//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Path value that selects an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

const DEFAULT_DB_PATH: &str = "./data/genai-audit.db";
const DEFAULT_LOG_FILTER: &str = "info";

/// Where the audit store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A local database file, created on first open.
    File(PathBuf),
    /// A throwaway in-memory database.
    Memory,
}

/// Store configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::File(PathBuf::from(DEFAULT_DB_PATH)),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl StoreConfig {
    /// Build config from `GENAI_AUDIT_DB_PATH` and `GENAI_AUDIT_LOG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let location = match lookup("GENAI_AUDIT_DB_PATH") {
            None => StoreLocation::File(PathBuf::from(DEFAULT_DB_PATH)),
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: "GENAI_AUDIT_DB_PATH".into(),
                    message: "must not be empty".into(),
                });
            }
            Some(path) if path == MEMORY_PATH => StoreLocation::Memory,
            Some(path) => StoreLocation::File(PathBuf::from(path)),
        };

        let log_filter = lookup("GENAI_AUDIT_LOG")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            location,
            log_filter,
        })
    }
}
