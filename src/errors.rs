//! Unified error type for the submission engine.
//!
//! Precondition failures (`BadRequest`, `Forbidden`) surface immediately to the caller.
//! Validation problems are never errors; they travel as `ValidationResult` values.

use thiserror::Error;

/// All errors produced by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller violated a precondition (wrong weekday, inactive center, locked window).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable reason
        message: String,
    },

    /// The authorization collaborator refused the requested capability.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable reason
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// An input value could not be cast to the field's declared type.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidField {
        /// Field name from the domain schema
        field: String,
        /// Description of the casting problem
        message: String,
    },

    /// Strict parsing met a field the schema does not declare.
    #[error("Unknown field '{field}'")]
    UnknownField {
        /// Offending input key
        field: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Notification delivery failed.
    #[error("Notification error: {message}")]
    Notification {
        /// Human-readable reason
        message: String,
    },

    /// Error bubbled up from the entity store.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::InvalidField`].
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
