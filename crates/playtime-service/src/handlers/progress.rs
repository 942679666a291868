//! Resume position and currently-playing handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use playtime_core::{StoryId, StoryProgress};
use playtime_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Stories with recent playing heartbeats.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    /// Active progress records.
    pub active: Vec<StoryProgress>,
    /// The liveness window used.
    pub window_seconds: u64,
}

/// Get the caller's progress on a story.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(story_id): Path<StoryId>,
) -> Result<Json<StoryProgress>, ApiError> {
    state
        .store
        .get_progress(&auth.user_id, &story_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no progress for story {story_id}")))
}

/// List what the caller is playing right now.
pub async fn activity(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ActivityResponse>, ApiError> {
    let window_seconds = state.config.active_window_seconds;
    let orchestrator = state.orchestrator.clone();
    let active = tokio::task::spawn_blocking(move || {
        orchestrator.active_stories(&auth.user_id, Utc::now(), window_seconds)
    })
    .await??;

    Ok(Json(ActivityResponse {
        active,
        window_seconds,
    }))
}
