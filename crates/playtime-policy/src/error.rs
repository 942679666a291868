//! Error types for policy evaluation.

use playtime_core::StoryId;
use playtime_store::StoreError;

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur while evaluating access or recording a heartbeat.
///
/// Storage failures are hard errors: a heartbeat that could not be recorded
/// must not report "continue".
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The story does not exist.
    #[error("story not found: {0}")]
    StoryNotFound(StoryId),

    /// The heartbeat payload is malformed.
    #[error("invalid heartbeat: {0}")]
    InvalidHeartbeat(String),

    /// Storage error.
    #[error(transparent)]
    Store(#[from] StoreError),
}
