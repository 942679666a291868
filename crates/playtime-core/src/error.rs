//! Error types for playtime.

use crate::ids::IdError;

/// Result type for playtime core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in playtime core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A field failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The timezone name is not a known IANA zone.
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
