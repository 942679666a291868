//! Usage summary handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use playtime_core::StoryType;
use playtime_policy::LimitUsage;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Usage in one window.
#[derive(Debug, Serialize)]
pub struct LimitUsageResponse {
    /// Seconds played in the window.
    pub used_seconds: u64,
    /// Configured limit.
    pub limit_seconds: Option<u64>,
    /// Seconds left, when limited.
    pub remaining_seconds: Option<u64>,
    /// Window length.
    pub interval_seconds: u64,
}

impl From<LimitUsage> for LimitUsageResponse {
    fn from(u: LimitUsage) -> Self {
        Self {
            used_seconds: u.used_seconds,
            limit_seconds: u.limit_seconds,
            remaining_seconds: u.remaining_seconds(),
            interval_seconds: u.interval_seconds,
        }
    }
}

/// Usage summary response.
#[derive(Debug, Serialize)]
pub struct UsageSummaryResponse {
    /// Across all stories.
    pub global: LimitUsageResponse,
    /// Per content type.
    pub by_type: BTreeMap<StoryType, LimitUsageResponse>,
}

/// Summarize the caller's usage against their limits.
pub async fn usage_summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UsageSummaryResponse>, ApiError> {
    let orchestrator = state.orchestrator.clone();
    let summary =
        tokio::task::spawn_blocking(move || orchestrator.usage_summary(&auth.user_id, Utc::now()))
            .await??;

    Ok(Json(UsageSummaryResponse {
        global: summary.global.into(),
        by_type: summary
            .by_type
            .into_iter()
            .map(|(ty, usage)| (ty, usage.into()))
            .collect(),
    }))
}
