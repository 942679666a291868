//! Usage totals against configured limits.

use chrono::{DateTime, Utc};

use playtime_core::{window_start, StoryType, UsageScope, UserId, DEFAULT_INTERVAL_SECONDS};
use playtime_store::Store;

use crate::error::Result;

/// Seconds used in one window next to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitUsage {
    /// Seconds played since the window start.
    pub used_seconds: u64,
    /// The configured limit, if any.
    pub limit_seconds: Option<u64>,
    /// Window length.
    pub interval_seconds: u64,
}

impl LimitUsage {
    /// Seconds left before the limit, if one is set.
    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u64> {
        self.limit_seconds
            .map(|limit| limit.saturating_sub(self.used_seconds))
    }
}

/// A user's usage across the global and content-type windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSummary {
    /// Across all stories.
    pub global: LimitUsage,
    /// Per content type, in [`StoryType::ALL`] order.
    pub by_type: Vec<(StoryType, LimitUsage)>,
}

/// Compute a user's summary at `now`. Users without settings get
/// unlimited entries over the default window.
pub(crate) fn summarize(
    store: &dyn Store,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<UsageSummary> {
    let settings = store.get_settings(user_id)?;

    let (global_limit, global_interval) = settings.as_ref().map_or(
        (None, DEFAULT_INTERVAL_SECONDS),
        |s| (s.global_limit_seconds, s.global_interval_seconds),
    );
    let global = LimitUsage {
        used_seconds: store.sum_usage_since(
            user_id,
            UsageScope::AllStories,
            window_start(now, global_interval),
        )?,
        limit_seconds: global_limit,
        interval_seconds: global_interval,
    };

    let mut by_type = Vec::with_capacity(StoryType::ALL.len());
    for story_type in StoryType::ALL {
        let limits = settings
            .as_ref()
            .map(|s| s.limits_for(story_type))
            .unwrap_or_default();
        let used_seconds = store.sum_usage_since(
            user_id,
            UsageScope::ContentType(story_type),
            window_start(now, limits.interval_seconds),
        )?;
        by_type.push((
            story_type,
            LimitUsage {
                used_seconds,
                limit_seconds: limits.limit_seconds,
                interval_seconds: limits.interval_seconds,
            },
        ));
    }

    Ok(UsageSummary { global, by_type })
}
