//! Heartbeat and pre-flight access handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use playtime_core::{message_for_reason, BlockKind, PlaybackPosition, StoryId, Verdict};
use playtime_policy::Heartbeat;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Heartbeat request from the player.
#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    /// The story being played.
    pub story_id: StoryId,
    /// Position within the chapter, in seconds.
    pub current_time: f64,
    /// Zero-based chapter index.
    #[serde(default)]
    pub current_chapter_index: u32,
    /// Whole seconds played since the previous heartbeat.
    #[serde(default)]
    pub increment_seconds: u64,
    /// Whether the player is playing.
    pub is_playing: bool,
}

impl From<HeartbeatRequest> for Heartbeat {
    fn from(req: HeartbeatRequest) -> Self {
        Self {
            story_id: req.story_id,
            position: PlaybackPosition {
                current_time: req.current_time,
                current_chapter_index: req.current_chapter_index,
                is_playing: req.is_playing,
            },
            increment_seconds: req.increment_seconds,
        }
    }
}

/// Access verdict as seen by the player.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    /// Always true; failures are reported as errors.
    pub success: bool,
    /// Whether playback must stop.
    pub limit_reached: bool,
    /// Block reason string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Presentation category of the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlockKind>,
    /// Child-facing message for the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Where the player should navigate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl AccessResponse {
    fn new(state: &AppState, verdict: &Verdict) -> Self {
        match verdict.reason() {
            None => Self {
                success: true,
                limit_reached: false,
                reason: None,
                kind: None,
                message: None,
                redirect: None,
            },
            Some(reason) => {
                let reason_str = reason.to_string();
                Self {
                    success: true,
                    limit_reached: true,
                    kind: Some(reason.kind()),
                    message: Some(message_for_reason(&reason_str).to_string()),
                    redirect: Some(state.times_up_redirect(&reason_str)),
                    reason: Some(reason_str),
                }
            }
        }
    }
}

/// Heartbeat response.
#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    /// The verdict.
    #[serde(flatten)]
    pub access: AccessResponse,
    /// Times this story has been started.
    pub play_count: u32,
    /// Seconds appended to the ledger by this heartbeat.
    pub recorded_seconds: u64,
}

/// Record a heartbeat and return whether playback may continue.
///
/// The work runs on a blocking task that finishes even if the client
/// disconnects, so no played seconds are lost.
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let heartbeat = Heartbeat::from(body);
    let orchestrator = state.orchestrator.clone();
    let user_id = auth.user_id;

    let outcome = tokio::task::spawn_blocking(move || {
        orchestrator.record_heartbeat(user_id, &heartbeat, Utc::now())
    })
    .await??;

    Ok(Json(HeartbeatResponse {
        access: AccessResponse::new(&state, &outcome.verdict),
        play_count: outcome.progress.play_count,
        recorded_seconds: outcome.recorded.map_or(0, |e| e.seconds_played),
    }))
}

/// Pre-flight check when a story is opened. Writes nothing.
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(story_id): Path<StoryId>,
) -> Result<Json<AccessResponse>, ApiError> {
    let orchestrator = state.orchestrator.clone();
    let verdict = tokio::task::spawn_blocking(move || {
        orchestrator.check_access(auth.user_id, &story_id, Utc::now())
    })
    .await??;

    Ok(Json(AccessResponse::new(&state, &verdict)))
}
