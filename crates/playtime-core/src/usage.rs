//! Usage ledger entries and playback progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::story::StoryType;
use crate::{StoryId, TagId, UsageEventId, UserId};

/// Seconds of playback recorded by one heartbeat.
///
/// Events are immutable once written and are summed over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Time-ordered event id.
    pub id: UsageEventId,

    /// The child who played.
    pub user_id: UserId,

    /// What was played.
    pub story_id: StoryId,

    /// Seconds played since the previous heartbeat.
    pub seconds_played: u64,

    /// When the heartbeat was recorded.
    pub created_at: DateTime<Utc>,
}

impl UsageEvent {
    /// Create an event recorded at `at`.
    #[must_use]
    pub fn new(user_id: UserId, story_id: StoryId, seconds_played: u64, at: DateTime<Utc>) -> Self {
        Self {
            id: UsageEventId::generate_at(at),
            user_id,
            story_id,
            seconds_played,
            created_at: at,
        }
    }
}

/// Which stories a usage sum covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageScope {
    /// Every story the user played.
    AllStories,
    /// Stories of one content type.
    ContentType(StoryType),
    /// Stories currently carrying a tag.
    Tag(TagId),
}

/// Resume state for one user and story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryProgress {
    /// The child.
    pub user_id: UserId,

    /// The story.
    pub story_id: StoryId,

    /// Playback position within the current chapter, in seconds.
    pub current_time: f64,

    /// Zero-based chapter index.
    pub current_chapter_index: u32,

    /// Whether the player reported itself as playing.
    pub is_playing: bool,

    /// How many times playback was started.
    pub play_count: u32,

    /// Last write time, read by the "currently playing" view.
    pub updated_at: DateTime<Utc>,
}

impl StoryProgress {
    /// Apply a heartbeat to the previous progress record, if any.
    ///
    /// `play_count` increases when playback moves from not playing (or no
    /// record) to playing.
    #[must_use]
    pub fn advance(
        previous: Option<&Self>,
        user_id: UserId,
        story_id: StoryId,
        position: PlaybackPosition,
        at: DateTime<Utc>,
    ) -> Self {
        let was_playing = previous.is_some_and(|p| p.is_playing);
        let play_count = previous.map_or(0, |p| p.play_count);
        let play_count = if position.is_playing && !was_playing {
            play_count.saturating_add(1)
        } else {
            play_count
        };

        Self {
            user_id,
            story_id,
            current_time: position.current_time,
            current_chapter_index: position.current_chapter_index,
            is_playing: position.is_playing,
            play_count,
            updated_at: at,
        }
    }

    /// Whether this record shows active playback within `window_seconds` of `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>, window_seconds: u64) -> bool {
        let window = chrono::Duration::seconds(i64::try_from(window_seconds).unwrap_or(i64::MAX));
        self.is_playing && now.signed_duration_since(self.updated_at) <= window
    }
}

/// Player position reported by a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    /// Position within the chapter, in seconds.
    pub current_time: f64,
    /// Zero-based chapter index.
    pub current_chapter_index: u32,
    /// Whether the player is playing.
    pub is_playing: bool,
}
