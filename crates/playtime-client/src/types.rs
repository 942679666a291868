//! Request and response types for the playtime client.

use serde::{Deserialize, Serialize};

use playtime_core::{BlockKind, PlaybackPosition, StoryId};

/// Heartbeat request body.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatRequest {
    /// The story being played.
    pub story_id: StoryId,
    /// Position within the chapter, in seconds.
    pub current_time: f64,
    /// Zero-based chapter index.
    pub current_chapter_index: u32,
    /// Whole seconds played since the last acknowledged heartbeat.
    pub increment_seconds: u64,
    /// Whether the player is playing.
    pub is_playing: bool,
}

impl HeartbeatRequest {
    /// Build a request from a player position.
    #[must_use]
    pub fn new(story_id: StoryId, position: PlaybackPosition, increment_seconds: u64) -> Self {
        Self {
            story_id,
            current_time: position.current_time,
            current_chapter_index: position.current_chapter_index,
            increment_seconds,
            is_playing: position.is_playing,
        }
    }
}

/// Access verdict returned by heartbeats and pre-flight checks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// Whether playback must stop.
    pub limit_reached: bool,
    /// Block reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Presentation category of the block.
    #[serde(default)]
    pub kind: Option<BlockKind>,
    /// Child-facing message.
    #[serde(default)]
    pub message: Option<String>,
    /// Where to navigate when blocked.
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Heartbeat response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeartbeatResponse {
    /// The verdict.
    #[serde(flatten)]
    pub access: AccessResponse,
    /// Times this story has been started.
    #[serde(default)]
    pub play_count: u32,
    /// Seconds the server appended to the ledger.
    #[serde(default)]
    pub recorded_seconds: u64,
}

/// API error response structure.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
}
