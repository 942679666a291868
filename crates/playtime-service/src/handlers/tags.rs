//! Tag handlers (service key).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use playtime_core::{Tag, TagId, DEFAULT_INTERVAL_SECONDS};
use playtime_store::Store;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

/// Tag write request.
#[derive(Debug, Deserialize)]
pub struct PutTagRequest {
    /// Display name.
    pub name: String,
    /// Whether the tag unlocks its stories.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Shared limit across the tag's stories.
    #[serde(default)]
    pub limit_seconds: Option<u64>,
    /// Window for `limit_seconds`.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Restricted hours start (local hour).
    #[serde(default)]
    pub restricted_hours_start: Option<u8>,
    /// Restricted hours end (local hour, exclusive).
    #[serde(default)]
    pub restricted_hours_end: Option<u8>,
}

/// Create or replace a tag.
pub async fn put_tag(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
    Path(tag_id): Path<TagId>,
    ApiJson(body): ApiJson<PutTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    let tag = Tag {
        id: tag_id,
        name: body.name,
        enabled: body.enabled,
        limit_seconds: body.limit_seconds,
        interval_seconds: body.interval_seconds,
        restricted_hours_start: body.restricted_hours_start,
        restricted_hours_end: body.restricted_hours_end,
    };
    tag.validate()?;
    state.store.put_tag(&tag)?;

    tracing::info!(
        tag_id = %tag_id,
        service = %service.service_name,
        enabled = tag.enabled,
        "Tag saved"
    );

    Ok(Json(tag))
}

/// Get a tag.
pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    _service: ServiceAuth,
    Path(tag_id): Path<TagId>,
) -> Result<Json<Tag>, ApiError> {
    state
        .store
        .get_tag(&tag_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("tag not found: {tag_id}")))
}
