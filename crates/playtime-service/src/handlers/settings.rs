//! Parent settings handlers.
//!
//! Once settings exist, changing them requires the current PIN in the
//! `x-parent-pin` header. The PIN digest is never returned.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use playtime_core::settings::{DEFAULT_MAX_CHAPTERS, DEFAULT_MAX_VOLUME};
use playtime_core::{
    validate_pin, ParentSettings, StoryType, TypeLimits, DEFAULT_INTERVAL_SECONDS,
    DEFAULT_TIME_ZONE,
};
use playtime_store::Store;

use crate::auth::AuthUser;
use crate::crypto::{hash_pin, verify_pin};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Header carrying the current parent PIN.
pub const PARENT_PIN_HEADER: &str = "x-parent-pin";

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_max_volume() -> u8 {
    DEFAULT_MAX_VOLUME
}

fn default_max_chapters() -> u32 {
    DEFAULT_MAX_CHAPTERS
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

/// Settings write request. Replaces the whole record.
#[derive(Debug, Deserialize)]
pub struct PutSettingsRequest {
    /// New 4-digit PIN.
    pub pin: String,
    /// IANA timezone.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Maximum volume, 0–100.
    #[serde(default = "default_max_volume")]
    pub max_volume: u8,
    /// Chapters played back to back.
    #[serde(default = "default_max_chapters")]
    pub max_chapters_to_play: u32,
    /// Show seek/skip controls.
    #[serde(default)]
    pub show_full_controls: bool,
    /// Global limit.
    #[serde(default)]
    pub global_limit_seconds: Option<u64>,
    /// Global window.
    #[serde(default = "default_interval")]
    pub global_interval_seconds: u64,
    /// Per-content-type limits keyed by type name.
    #[serde(default)]
    pub type_limits: BTreeMap<StoryType, TypeLimits>,
}

/// Settings as returned to the parent UI.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    /// IANA timezone.
    pub time_zone: String,
    /// Maximum volume.
    pub max_volume: u8,
    /// Chapters played back to back.
    pub max_chapters_to_play: u32,
    /// Show seek/skip controls.
    pub show_full_controls: bool,
    /// Global limit.
    pub global_limit_seconds: Option<u64>,
    /// Global window.
    pub global_interval_seconds: u64,
    /// Per-content-type limits.
    pub type_limits: BTreeMap<StoryType, TypeLimits>,
    /// Last write.
    pub updated_at: String,
}

impl From<&ParentSettings> for SettingsResponse {
    fn from(s: &ParentSettings) -> Self {
        Self {
            time_zone: s.time_zone.clone(),
            max_volume: s.max_volume,
            max_chapters_to_play: s.max_chapters_to_play,
            show_full_controls: s.show_full_controls,
            global_limit_seconds: s.global_limit_seconds,
            global_interval_seconds: s.global_interval_seconds,
            type_limits: s.type_limits.clone(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// PIN check request.
#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    /// The PIN to check.
    pub pin: String,
}

/// PIN check result.
#[derive(Debug, Serialize)]
pub struct VerifyPinResponse {
    /// Whether the PIN matches.
    pub valid: bool,
}

/// Get the caller's parent settings.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state
        .store
        .get_settings(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("parent settings not configured".into()))?;
    Ok(Json(SettingsResponse::from(&settings)))
}

/// Create or replace the caller's parent settings.
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    headers: HeaderMap,
    ApiJson(body): ApiJson<PutSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if let Some(existing) = state.store.get_settings(&auth.user_id)? {
        let current_pin = headers
            .get(PARENT_PIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Forbidden("parent PIN required".into()))?;

        if !verify_pin(
            &state.config.pin_secret,
            &auth.user_id,
            current_pin,
            &existing.pin_hash,
        )? {
            tracing::warn!(user_id = %auth.user_id, "Settings change with wrong PIN");
            return Err(ApiError::Forbidden("incorrect parent PIN".into()));
        }
    }

    validate_pin(&body.pin)?;

    let settings = ParentSettings {
        user_id: auth.user_id,
        pin_hash: hash_pin(&state.config.pin_secret, &auth.user_id, &body.pin)?,
        time_zone: body.time_zone,
        max_volume: body.max_volume,
        max_chapters_to_play: body.max_chapters_to_play,
        show_full_controls: body.show_full_controls,
        global_limit_seconds: body.global_limit_seconds,
        global_interval_seconds: body.global_interval_seconds,
        type_limits: body.type_limits,
        updated_at: Utc::now(),
    };
    settings.validate()?;
    state.store.put_settings(&settings)?;

    tracing::info!(
        user_id = %auth.user_id,
        global_limit = ?settings.global_limit_seconds,
        time_zone = %settings.time_zone,
        "Parent settings saved"
    );

    Ok(Json(SettingsResponse::from(&settings)))
}

/// Check a parent PIN.
pub async fn verify_parent_pin(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<VerifyPinRequest>,
) -> Result<Json<VerifyPinResponse>, ApiError> {
    let settings = state
        .store
        .get_settings(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("parent settings not configured".into()))?;

    let valid = verify_pin(
        &state.config.pin_secret,
        &auth.user_id,
        &body.pin,
        &settings.pin_hash,
    )?;

    Ok(Json(VerifyPinResponse { valid }))
}
