//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use playtime_core::{
    ParentSettings, Story, StoryId, StoryProgress, Tag, TagId, UsageEvent, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Put a single serialized record.
    fn put<T: serde::Serialize>(&self, cf_name: &str, key: Vec<u8>, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let value = Self::serialize(value)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Get a single deserialized record.
    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: Vec<u8>) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Collect `(key, value)` pairs from `start` while keys share `prefix`.
    fn scan_prefix(
        &self,
        cf_name: &str,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(start, Direction::Forward));

        let mut items = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            items.push((key, value));
        }
        Ok(items)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Story & Tag Operations
    // =========================================================================

    fn put_story(&self, story: &Story) -> Result<()> {
        let cf_stories = self.cf(cf::STORIES)?;
        let cf_by_tag = self.cf(cf::STORIES_BY_TAG)?;

        let previous_tags: HashSet<TagId> = self
            .get_story(&story.id)?
            .map(|s| s.tag_ids.into_iter().collect())
            .unwrap_or_default();
        let current_tags: HashSet<TagId> = story.tag_ids.iter().copied().collect();

        let mut batch = WriteBatch::default();
        for removed in previous_tags.difference(&current_tags) {
            batch.delete_cf(&cf_by_tag, keys::tag_story_key(removed, &story.id));
        }
        for tag_id in &current_tags {
            batch.put_cf(&cf_by_tag, keys::tag_story_key(tag_id, &story.id), []); // Index entry (empty value)
        }
        batch.put_cf(&cf_stories, keys::story_key(&story.id), Self::serialize(story)?);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_story(&self, story_id: &StoryId) -> Result<Option<Story>> {
        self.get(cf::STORIES, keys::story_key(story_id))
    }

    fn put_tag(&self, tag: &Tag) -> Result<()> {
        self.put(cf::TAGS, keys::tag_key(&tag.id), tag)
    }

    fn get_tag(&self, tag_id: &TagId) -> Result<Option<Tag>> {
        self.get(cf::TAGS, keys::tag_key(tag_id))
    }

    fn stories_with_tag(&self, tag_id: &TagId) -> Result<Vec<StoryId>> {
        let prefix = keys::tag_key(tag_id);

        Ok(self
            .scan_prefix(cf::STORIES_BY_TAG, &prefix, &prefix)?
            .iter()
            .filter_map(|(key, _)| keys::story_id_from_tag_key(key))
            .collect())
    }

    // =========================================================================
    // Parent Settings Operations
    // =========================================================================

    fn put_settings(&self, settings: &ParentSettings) -> Result<()> {
        self.put(cf::PARENT_SETTINGS, keys::settings_key(&settings.user_id), settings)
    }

    fn get_settings(&self, user_id: &UserId) -> Result<Option<ParentSettings>> {
        self.get(cf::PARENT_SETTINGS, keys::settings_key(user_id))
    }

    // =========================================================================
    // Usage Ledger Operations
    // =========================================================================

    fn append_usage(&self, event: &UsageEvent) -> Result<()> {
        self.put(
            cf::USAGE_EVENTS,
            keys::usage_key(&event.user_id, &event.id),
            event,
        )
    }

    fn usage_events_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<UsageEvent>> {
        let prefix = keys::user_prefix(user_id);
        let start = keys::usage_scan_start(user_id, since);

        let mut events = Vec::new();
        for (_, value) in self.scan_prefix(cf::USAGE_EVENTS, &prefix, &start)? {
            let event: UsageEvent = Self::deserialize(&value)?;
            // Keys only resolve to the millisecond.
            if event.created_at > since {
                events.push(event);
            }
        }
        Ok(events)
    }

    // =========================================================================
    // Progress Operations
    // =========================================================================

    fn put_progress(&self, progress: &StoryProgress) -> Result<()> {
        self.put(
            cf::STORY_PROGRESS,
            keys::progress_key(&progress.user_id, &progress.story_id),
            progress,
        )
    }

    fn get_progress(&self, user_id: &UserId, story_id: &StoryId) -> Result<Option<StoryProgress>> {
        self.get(cf::STORY_PROGRESS, keys::progress_key(user_id, story_id))
    }

    fn list_progress(&self, user_id: &UserId) -> Result<Vec<StoryProgress>> {
        let prefix = keys::user_prefix(user_id);

        self.scan_prefix(cf::STORY_PROGRESS, &prefix, &prefix)?
            .iter()
            .map(|(_, value)| Self::deserialize(value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use playtime_core::{StoryType, UsageScope};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, h, m, s).unwrap()
    }

    #[test]
    fn story_and_tag_crud() {
        let (store, _dir) = create_test_store();
        let tag = Tag::new(TagId::generate(), "Animals").with_limit(1200, 86_400);
        store.put_tag(&tag).unwrap();

        let story = Story::new(StoryId::generate(), "The Fox", StoryType::Readaloud)
            .with_tags([tag.id]);
        store.put_story(&story).unwrap();

        assert_eq!(store.get_tag(&tag.id).unwrap(), Some(tag.clone()));
        assert_eq!(store.get_story(&story.id).unwrap(), Some(story.clone()));
        assert!(store.get_story(&StoryId::generate()).unwrap().is_none());

        let loaded = store.get_story_with_tags(&story.id).unwrap().unwrap();
        assert_eq!(loaded.tags, vec![tag]);
    }

    #[test]
    fn retagging_a_story_updates_the_index() {
        let (store, _dir) = create_test_store();
        let (a, b) = (TagId::generate(), TagId::generate());
        let story = Story::new(StoryId::generate(), "Tale", StoryType::Audiobook).with_tags([a]);
        store.put_story(&story).unwrap();
        assert_eq!(store.stories_with_tag(&a).unwrap(), vec![story.id]);

        let story = story.with_tags([b]);
        store.put_story(&story).unwrap();
        assert!(store.stories_with_tag(&a).unwrap().is_empty());
        assert_eq!(store.stories_with_tag(&b).unwrap(), vec![story.id]);
    }

    #[test]
    fn ledger_scan_starts_at_window() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let other_user = UserId::generate();
        let story_id = StoryId::generate();

        store.record_usage(user_id, story_id, 10, at(8, 0, 0)).unwrap();
        store.record_usage(user_id, story_id, 20, at(9, 0, 0)).unwrap();
        store.record_usage(user_id, story_id, 30, at(9, 30, 0)).unwrap();
        store.record_usage(other_user, story_id, 99, at(9, 30, 0)).unwrap();

        let events = store.usage_events_since(&user_id, at(8, 30, 0)).unwrap();
        let seconds: Vec<u64> = events.iter().map(|e| e.seconds_played).collect();
        assert_eq!(seconds, [20, 30]);

        // Window start equal to an event's time excludes it.
        let total = store
            .sum_usage_since(&user_id, UsageScope::AllStories, at(9, 0, 0))
            .unwrap();
        assert_eq!(total, 30);
    }

    #[test]
    fn repeated_appends_sum_exactly() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let story_id = StoryId::generate();

        for i in 0..12 {
            store.record_usage(user_id, story_id, 5, at(10, 0, i)).unwrap();
        }

        let total = store
            .sum_usage_since(&user_id, UsageScope::AllStories, at(9, 0, 0))
            .unwrap();
        assert_eq!(total, 60);
    }

    #[test]
    fn settings_and_progress_round_trip() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        assert!(store.get_settings(&user_id).unwrap().is_none());

        let settings = ParentSettings::new(user_id, "digest")
            .with_time_zone("Europe/Berlin")
            .with_global_limit(3600, 86_400);
        store.put_settings(&settings).unwrap();
        assert_eq!(store.get_settings(&user_id).unwrap(), Some(settings));

        let progress = StoryProgress {
            user_id,
            story_id: StoryId::generate(),
            current_time: 12.5,
            current_chapter_index: 1,
            is_playing: true,
            play_count: 3,
            updated_at: at(7, 0, 0),
        };
        store.put_progress(&progress).unwrap();
        assert_eq!(
            store.get_progress(&user_id, &progress.story_id).unwrap(),
            Some(progress.clone())
        );
        assert_eq!(store.list_progress(&user_id).unwrap(), vec![progress]);
        assert!(store.list_progress(&UserId::generate()).unwrap().is_empty());
    }
}
