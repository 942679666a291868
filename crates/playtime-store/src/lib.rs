//! Storage layer for playtime.
//!
//! This crate provides persistent storage for story metadata, tags, parent
//! settings, the usage ledger and playback progress.
//!
//! # Backends
//!
//! - [`RocksStore`] (feature `rocksdb-backend`, on by default) keeps each
//!   record kind in its own column family.
//! - [`MemoryStore`] keeps everything in process memory, for tests and local
//!   runs without libclang.
//!
//! # Usage ledger
//!
//! The ledger is append-only. Sums are computed as a read + reduce over the
//! events of one user since the window start, so every sum reflects all
//! appends committed before the read.
//!
//! # Example
//!
//! ```no_run
//! use playtime_store::{MemoryStore, Store};
//! use playtime_core::{StoryId, UserId, UsageScope};
//!
//! let store = MemoryStore::new();
//! let user_id = UserId::generate();
//! let now = chrono::Utc::now();
//!
//! store.record_usage(user_id, StoryId::generate(), 30, now).unwrap();
//! let since = now - chrono::Duration::hours(1);
//! let total = store.sum_usage_since(&user_id, UsageScope::AllStories, since).unwrap();
//! assert_eq!(total, 30);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use playtime_core::{
    ParentSettings, Story, StoryId, StoryProgress, StoryType, StoryWithTags, Tag, TagId,
    UsageEvent, UsageScope, UserId,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Story & Tag Operations
    // =========================================================================

    /// Insert or update story metadata.
    ///
    /// This also maintains the tag → story index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_story(&self, story: &Story) -> Result<()>;

    /// Get story metadata by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_story(&self, story_id: &StoryId) -> Result<Option<Story>>;

    /// Insert or update a tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_tag(&self, tag: &Tag) -> Result<()>;

    /// Get a tag by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_tag(&self, tag_id: &TagId) -> Result<Option<Tag>>;

    /// List the stories currently carrying a tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn stories_with_tag(&self, tag_id: &TagId) -> Result<Vec<StoryId>>;

    // =========================================================================
    // Parent Settings Operations
    // =========================================================================

    /// Insert or update a user's parent settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_settings(&self, settings: &ParentSettings) -> Result<()>;

    /// Get a user's parent settings. `None` means no restrictions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_settings(&self, user_id: &UserId) -> Result<Option<ParentSettings>>;

    // =========================================================================
    // Usage Ledger Operations
    // =========================================================================

    /// Append an immutable usage event.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn append_usage(&self, event: &UsageEvent) -> Result<()>;

    /// List a user's events with `created_at` strictly after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn usage_events_since(&self, user_id: &UserId, since: DateTime<Utc>)
        -> Result<Vec<UsageEvent>>;

    // =========================================================================
    // Progress Operations
    // =========================================================================

    /// Insert or update playback progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_progress(&self, progress: &StoryProgress) -> Result<()>;

    /// Get progress for a user and story.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_progress(&self, user_id: &UserId, story_id: &StoryId) -> Result<Option<StoryProgress>>;

    /// List all progress records of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_progress(&self, user_id: &UserId) -> Result<Vec<StoryProgress>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Load a story with its tags resolved, in the story's tag order.
    ///
    /// Tag ids that no longer resolve are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_story_with_tags(&self, story_id: &StoryId) -> Result<Option<StoryWithTags>> {
        let Some(story) = self.get_story(story_id)? else {
            return Ok(None);
        };

        let mut tags = Vec::with_capacity(story.tag_ids.len());
        for tag_id in &story.tag_ids {
            match self.get_tag(tag_id)? {
                Some(tag) => tags.push(tag),
                None => tracing::warn!(
                    story_id = %story_id,
                    tag_id = %tag_id,
                    "Story references a missing tag"
                ),
            }
        }

        Ok(Some(StoryWithTags { story, tags }))
    }

    /// Record seconds played. Zero seconds is a no-op and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn record_usage(
        &self,
        user_id: UserId,
        story_id: StoryId,
        seconds: u64,
        at: DateTime<Utc>,
    ) -> Result<Option<UsageEvent>> {
        if seconds == 0 {
            return Ok(None);
        }
        let event = UsageEvent::new(user_id, story_id, seconds, at);
        self.append_usage(&event)?;
        Ok(Some(event))
    }

    /// Sum the seconds a user played within `scope` after `since`.
    ///
    /// Content-type and tag scopes use the stories' current metadata. Events
    /// for stories that no longer exist count only toward `AllStories`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn sum_usage_since(
        &self,
        user_id: &UserId,
        scope: UsageScope,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let events = self.usage_events_since(user_id, since)?;

        let total = match scope {
            UsageScope::AllStories => events
                .iter()
                .fold(0u64, |acc, e| acc.saturating_add(e.seconds_played)),
            UsageScope::ContentType(story_type) => {
                let mut types: HashMap<StoryId, Option<StoryType>> = HashMap::new();
                let mut total = 0u64;
                for event in &events {
                    let ty = match types.get(&event.story_id) {
                        Some(ty) => *ty,
                        None => {
                            let ty = self.get_story(&event.story_id)?.map(|s| s.story_type);
                            types.insert(event.story_id, ty);
                            ty
                        }
                    };
                    if ty == Some(story_type) {
                        total = total.saturating_add(event.seconds_played);
                    }
                }
                total
            }
            UsageScope::Tag(tag_id) => {
                let stories: HashSet<StoryId> =
                    self.stories_with_tag(&tag_id)?.into_iter().collect();
                events
                    .iter()
                    .filter(|e| stories.contains(&e.story_id))
                    .fold(0u64, |acc, e| acc.saturating_add(e.seconds_played))
            }
        };

        Ok(total)
    }
}
