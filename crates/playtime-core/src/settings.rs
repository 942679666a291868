//! Parent-configured settings.
//!
//! A user without a `ParentSettings` record has no restrictions at all. The
//! per-content-type limits are kept as a lookup keyed by [`StoryType`], each
//! entry a uniform [`TypeLimits`] record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::story::StoryType;
use crate::{UserId, DEFAULT_INTERVAL_SECONDS};

/// Default timezone for hour-of-day checks.
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Default maximum playback volume (percent).
pub const DEFAULT_MAX_VOLUME: u8 = 100;

/// Default number of chapters played back to back.
pub const DEFAULT_MAX_CHAPTERS: u32 = 1;

/// Limits applying to one content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLimits {
    /// Maximum seconds per window for stories of this type.
    pub limit_seconds: Option<u64>,

    /// Length of the trailing usage window.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,

    /// Local hour (0–23) at which the restricted period starts.
    pub restricted_start: Option<u8>,

    /// Local hour (0–23) at which the restricted period ends (exclusive).
    pub restricted_end: Option<u8>,
}

impl Default for TypeLimits {
    fn default() -> Self {
        Self {
            limit_seconds: None,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            restricted_start: None,
            restricted_end: None,
        }
    }
}

impl TypeLimits {
    /// Whether any limit or restriction is populated.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.limit_seconds.is_some()
            || self.restricted_start.is_some()
            || self.restricted_end.is_some()
    }
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

/// Settings a parent configures for a child profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentSettings {
    /// The child profile these settings apply to.
    pub user_id: UserId,

    /// HMAC digest of the 4-digit parent PIN (hex).
    pub pin_hash: String,

    /// IANA timezone used for restricted-hours checks.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Maximum playback volume, 0–100.
    pub max_volume: u8,

    /// Chapters the player may run back to back.
    pub max_chapters_to_play: u32,

    /// Whether the player shows seek/skip controls.
    pub show_full_controls: bool,

    /// Maximum seconds of play per global window.
    pub global_limit_seconds: Option<u64>,

    /// Length of the global window.
    #[serde(default = "default_interval")]
    pub global_interval_seconds: u64,

    /// Per-content-type limits.
    #[serde(default)]
    pub type_limits: BTreeMap<StoryType, TypeLimits>,

    /// When the settings were last written.
    pub updated_at: DateTime<Utc>,
}

impl ParentSettings {
    /// Create unrestricted settings for a user.
    #[must_use]
    pub fn new(user_id: UserId, pin_hash: impl Into<String>) -> Self {
        Self {
            user_id,
            pin_hash: pin_hash.into(),
            time_zone: default_time_zone(),
            max_volume: DEFAULT_MAX_VOLUME,
            max_chapters_to_play: DEFAULT_MAX_CHAPTERS,
            show_full_controls: false,
            global_limit_seconds: None,
            global_interval_seconds: DEFAULT_INTERVAL_SECONDS,
            type_limits: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Limits for a content type; unconfigured types get an empty record.
    #[must_use]
    pub fn limits_for(&self, story_type: StoryType) -> TypeLimits {
        self.type_limits.get(&story_type).cloned().unwrap_or_default()
    }

    /// Set the global limit.
    #[must_use]
    pub fn with_global_limit(mut self, limit_seconds: u64, interval_seconds: u64) -> Self {
        self.global_limit_seconds = Some(limit_seconds);
        self.global_interval_seconds = interval_seconds;
        self
    }

    /// Set limits for a content type.
    #[must_use]
    pub fn with_type_limits(mut self, story_type: StoryType, limits: TypeLimits) -> Self {
        self.type_limits.insert(story_type, limits);
        self
    }

    /// Set the timezone.
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Validate every configured field.
    ///
    /// The timezone must parse here, even though evaluation tolerates a bad
    /// one, so misconfiguration is caught at write time.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first invalid field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_volume > 100 {
            return Err(CoreError::Validation(
                "max_volume must be between 0 and 100".into(),
            ));
        }
        if self.max_chapters_to_play == 0 {
            return Err(CoreError::Validation(
                "max_chapters_to_play must be positive".into(),
            ));
        }
        if self.time_zone.parse::<chrono_tz::Tz>().is_err() {
            return Err(CoreError::Validation(format!(
                "unknown time zone: {}",
                self.time_zone
            )));
        }
        validate_limit(self.global_limit_seconds, self.global_interval_seconds)?;
        for limits in self.type_limits.values() {
            validate_limit(limits.limit_seconds, limits.interval_seconds)?;
            validate_hour(limits.restricted_start)?;
            validate_hour(limits.restricted_end)?;
        }
        Ok(())
    }
}

/// Check that a PIN is exactly four ASCII digits.
///
/// # Errors
///
/// Returns `CoreError::Validation` otherwise.
pub fn validate_pin(pin: &str) -> Result<(), CoreError> {
    if pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::Validation("PIN must be exactly 4 digits".into()))
    }
}

pub(crate) fn validate_limit(limit: Option<u64>, interval: u64) -> Result<(), CoreError> {
    if limit == Some(0) {
        return Err(CoreError::Validation("limit must be positive".into()));
    }
    if interval == 0 {
        return Err(CoreError::Validation("interval must be positive".into()));
    }
    Ok(())
}

pub(crate) fn validate_hour(hour: Option<u8>) -> Result<(), CoreError> {
    match hour {
        Some(h) if h > 23 => Err(CoreError::Validation(format!(
            "hour must be between 0 and 23, got {h}"
        ))),
        _ => Ok(()),
    }
}
