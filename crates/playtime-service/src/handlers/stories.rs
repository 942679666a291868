//! Story metadata handlers.
//!
//! Stories are registered by the ingestion pipeline with a service key and
//! read by players.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use playtime_core::{Story, StoryId, StoryType, StoryWithTags, Tag, TagId};
use playtime_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Story registration request.
#[derive(Debug, Deserialize)]
pub struct PutStoryRequest {
    /// Display title.
    pub title: String,
    /// Content type.
    pub story_type: StoryType,
    /// Attached tags, in display order.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

/// Story with resolved tags.
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    /// Story ID.
    pub id: StoryId,
    /// Display title.
    pub title: String,
    /// Content type.
    pub story_type: StoryType,
    /// Resolved tags.
    pub tags: Vec<Tag>,
    /// Last metadata write.
    pub updated_at: String,
}

impl From<StoryWithTags> for StoryResponse {
    fn from(s: StoryWithTags) -> Self {
        Self {
            id: s.story.id,
            title: s.story.title,
            story_type: s.story.story_type,
            tags: s.tags,
            updated_at: s.story.updated_at.to_rfc3339(),
        }
    }
}

/// Create or replace a story's metadata.
pub async fn put_story(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
    Path(story_id): Path<StoryId>,
    ApiJson(body): ApiJson<PutStoryRequest>,
) -> Result<Json<StoryResponse>, ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }
    for tag_id in &body.tag_ids {
        if state.store.get_tag(tag_id)?.is_none() {
            return Err(ApiError::BadRequest(format!("unknown tag: {tag_id}")));
        }
    }

    let story = Story::new(story_id, body.title, body.story_type).with_tags(body.tag_ids);
    state.store.put_story(&story)?;

    tracing::info!(
        story_id = %story_id,
        service = %service.service_name,
        story_type = %story.story_type,
        tags = story.tag_ids.len(),
        "Story registered"
    );

    let resolved = state
        .store
        .get_story_with_tags(&story_id)?
        .ok_or_else(|| ApiError::Internal(format!("story {story_id} vanished after write")))?;
    Ok(Json(resolved.into()))
}

/// Get a story with its tags.
pub async fn get_story(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(story_id): Path<StoryId>,
) -> Result<Json<StoryResponse>, ApiError> {
    let story = state
        .store
        .get_story_with_tags(&story_id)?
        .ok_or_else(|| ApiError::NotFound(format!("story not found: {story_id}")))?;
    Ok(Json(story.into()))
}
