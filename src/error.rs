//! Error types for the audit store.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
///
/// Store failures surface unchanged through these variants; nothing is
/// retried or translated into a domain error.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DatabaseError {
    /// Classify a failed statement. SQLite reports key and uniqueness
    /// violations through the error text only.
    pub(crate) fn from_statement(context: &str, err: libsql::Error) -> Self {
        let text = err.to_string();
        if text.contains("UNIQUE constraint failed")
            || text.contains("PRIMARY KEY")
            || text.contains("NOT NULL constraint failed")
        {
            Self::Constraint(format!("{context}: {text}"))
        } else {
            Self::Query(format!("{context}: {text}"))
        }
    }
}

/// Result type alias for the audit store.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_wraps_into_top_level() {
        let err: Error = ConfigError::InvalidValue {
            key: "GENAI_AUDIT_DB_PATH".into(),
            message: "must not be empty".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid configuration value for GENAI_AUDIT_DB_PATH: must not be empty"
        );
    }

    #[test]
    fn database_error_display() {
        let err = DatabaseError::Constraint("add_model: UNIQUE constraint failed".into());
        assert_eq!(
            err.to_string(),
            "Constraint violation: add_model: UNIQUE constraint failed"
        );
    }
}
