//! Story and tag metadata.
//!
//! Stories and tags are produced by the ingestion pipeline and are read-only
//! to the policy engine. Tags are the sole enablement gate for a story: a
//! story with no tags, or with only disabled tags, is never playable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::{StoryId, TagId, DEFAULT_INTERVAL_SECONDS};

/// The kind of content a story is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryType {
    /// Narrated audio, possibly split into chapters.
    Audiobook,
    /// Picture book read aloud page by page.
    Readaloud,
}

impl StoryType {
    /// All content types, in a stable order.
    pub const ALL: [Self; 2] = [Self::Audiobook, Self::Readaloud];

    /// Get the type name as used in API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audiobook => "audiobook",
            Self::Readaloud => "readaloud",
        }
    }

    /// Get the display name used in block reasons ("Audiobook", "Readaloud").
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Audiobook => "Audiobook",
            Self::Readaloud => "Readaloud",
        }
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audiobook" => Ok(Self::Audiobook),
            "readaloud" => Ok(Self::Readaloud),
            other => Err(CoreError::Validation(format!("unknown story type: {other}"))),
        }
    }
}

/// Story metadata as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Story id.
    pub id: StoryId,

    /// Human-readable title.
    pub title: String,

    /// Content type, which selects the per-type parent limits.
    pub story_type: StoryType,

    /// Attached tags, in insertion order.
    pub tag_ids: Vec<TagId>,

    /// When the metadata was last written.
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Create story metadata with no tags.
    #[must_use]
    pub fn new(id: StoryId, title: impl Into<String>, story_type: StoryType) -> Self {
        Self {
            id,
            title: title.into(),
            story_type,
            tag_ids: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Attach tags, keeping the given order.
    #[must_use]
    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }
}

/// A tag with its own enablement flag, usage limit and restricted hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag id.
    pub id: TagId,

    /// Display name, surfaced in "Time Limit ({name})" reasons.
    pub name: String,

    /// Whether stories carrying this tag are unlocked.
    pub enabled: bool,

    /// Maximum seconds of play per window across all stories with this tag.
    pub limit_seconds: Option<u64>,

    /// Length of the trailing usage window.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,

    /// Local hour (0–23) at which the restricted period starts.
    pub restricted_hours_start: Option<u8>,

    /// Local hour (0–23) at which the restricted period ends (exclusive).
    pub restricted_hours_end: Option<u8>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

impl Tag {
    /// Create an enabled tag with no limits.
    #[must_use]
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            limit_seconds: None,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            restricted_hours_start: None,
            restricted_hours_end: None,
        }
    }

    /// Set the enabled flag.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set a usage limit over a window.
    #[must_use]
    pub fn with_limit(mut self, limit_seconds: u64, interval_seconds: u64) -> Self {
        self.limit_seconds = Some(limit_seconds);
        self.interval_seconds = interval_seconds;
        self
    }

    /// Set restricted hours.
    #[must_use]
    pub fn with_restricted_hours(mut self, start: u8, end: u8) -> Self {
        self.restricted_hours_start = Some(start);
        self.restricted_hours_end = Some(end);
        self
    }

    /// Validate field ranges.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` when the name is empty, an hour is
    /// outside 0–23, or the limit/interval is zero.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("tag name must not be empty".into()));
        }
        crate::settings::validate_limit(self.limit_seconds, self.interval_seconds)?;
        crate::settings::validate_hour(self.restricted_hours_start)?;
        crate::settings::validate_hour(self.restricted_hours_end)
    }
}

/// A story together with its resolved tags, as the rule evaluators see it.
///
/// Tags that were attached but no longer exist are dropped when resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryWithTags {
    /// The story metadata.
    pub story: Story,

    /// Resolved tags in the story's order.
    pub tags: Vec<Tag>,
}

impl StoryWithTags {
    /// Story id shortcut.
    #[must_use]
    pub fn id(&self) -> StoryId {
        self.story.id
    }

    /// Content type shortcut.
    #[must_use]
    pub fn story_type(&self) -> StoryType {
        self.story.story_type
    }
}
