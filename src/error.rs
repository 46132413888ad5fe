//! Error types for the calendar storage crate.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, 7=config, ...)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use thiserror::Error;

/// Result type alias for calendar operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    DatabaseError,
    ConnectivityError,

    // Not Found (exit 3)
    EventNotFound,

    // Validation (exit 4)
    EventIsEmpty,
    InvalidArgument,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ConnectivityError => "CONNECTIVITY_ERROR",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::EventIsEmpty => "EVENT_IS_EMPTY",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::DatabaseError | Self::ConnectivityError => 2,
            Self::EventNotFound => 3,
            Self::EventIsEmpty | Self::InvalidArgument => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the caller may succeed by retrying with corrected input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EventIsEmpty | Self::InvalidArgument | Self::ConnectivityError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors returned by the storage backends and their collaborators.
#[derive(Error, Debug)]
pub enum Error {
    #[error("event not found: {id}")]
    EventNotFound { id: i64 },

    #[error("event is empty")]
    EventIsEmpty,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::EventNotFound { .. } => ErrorCode::EventNotFound,
            Self::EventIsEmpty => ErrorCode::EventIsEmpty,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) | Self::Settings(_) => ErrorCode::ConfigError,
            Self::Connectivity(_) => ErrorCode::ConnectivityError,
            Self::Database(_) | Self::Pool(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether this is the shared "event not found" outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound { .. })
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::EventNotFound { id } => Some(format!(
                "No event with ID '{id}'. Use `calendar event list` to see stored events."
            )),
            Self::EventIsEmpty => Some(
                "Provide at least a title, a time span or an owner for the event.".to_string(),
            ),
            Self::Config(msg) if msg.contains("workmode") => Some(
                "Valid workmodes: memory, sqlite. Set `database.workmode` or CALENDAR_DATABASE__WORKMODE."
                    .to_string(),
            ),
            Self::Config(msg) if msg.contains("DSN") => Some(
                "Set `database.sqlite.dsn`, or both `database.sqlite.dir` and `database.sqlite.name`."
                    .to_string(),
            ),
            Self::Connectivity(_) => {
                Some("Check that the database file is reachable and writable.".to_string())
            }
            Self::InvalidArgument(msg) if msg.contains("timestamp") => Some(
                "Timestamps use RFC 3339, e.g. 2025-09-15T10:00:00+02:00".to_string(),
            ),
            _ => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_exit_3() {
        let err = Error::EventNotFound { id: 42 };
        assert_eq!(err.error_code(), ErrorCode::EventNotFound);
        assert_eq!(err.exit_code(), 3);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "event not found: 42");
    }

    #[test]
    fn test_database_errors_share_category() {
        let err = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.error_code(), ErrorCode::DatabaseError);
        assert_eq!(err.exit_code(), 2);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let json = Error::Config("workmode must be 'sqlite', got 'memory'".into())
            .to_structured_json();
        assert_eq!(json["error"]["code"], "CONFIG_ERROR");
        assert_eq!(json["error"]["exit_code"], 7);
        assert!(json["error"]["hint"].as_str().unwrap().contains("memory, sqlite"));
    }

    #[test]
    fn test_structured_json_without_hint() {
        let json = Error::Other("boom".into()).to_structured_json();
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
        assert!(json["error"].get("hint").is_none());
    }
}
