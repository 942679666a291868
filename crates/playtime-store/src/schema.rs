//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Story metadata, keyed by `story_id`.
    pub const STORIES: &str = "stories";

    /// Tags, keyed by `tag_id`.
    pub const TAGS: &str = "tags";

    /// Index: stories by tag, keyed by `tag_id || story_id`.
    /// Value is empty (index only).
    pub const STORIES_BY_TAG: &str = "stories_by_tag";

    /// Parent settings, keyed by `user_id`.
    pub const PARENT_SETTINGS: &str = "parent_settings";

    /// Usage ledger, keyed by `user_id || usage_event_id` (ULID, time-ordered).
    pub const USAGE_EVENTS: &str = "usage_events";

    /// Resume state, keyed by `user_id || story_id`.
    pub const STORY_PROGRESS: &str = "story_progress";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::STORIES,
        cf::TAGS,
        cf::STORIES_BY_TAG,
        cf::PARENT_SETTINGS,
        cf::USAGE_EVENTS,
        cf::STORY_PROGRESS,
    ]
}
