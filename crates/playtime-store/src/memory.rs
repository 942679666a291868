//! In-memory storage implementation.
//!
//! `MemoryStore` keeps every table behind a single `RwLock`. It has the same
//! semantics as `RocksStore` and is used by tests and by service builds
//! without the `rocksdb-backend` feature.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use playtime_core::{
    ParentSettings, Story, StoryId, StoryProgress, Tag, TagId, UsageEvent, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Default)]
struct Tables {
    stories: HashMap<StoryId, Story>,
    tags: HashMap<TagId, Tag>,
    settings: HashMap<UserId, ParentSettings>,
    usage: HashMap<UserId, Vec<UsageEvent>>,
    progress: HashMap<(UserId, StoryId), StoryProgress>,
}

/// Process-local storage implementation.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn put_story(&self, story: &Story) -> Result<()> {
        self.write()?.stories.insert(story.id, story.clone());
        Ok(())
    }

    fn get_story(&self, story_id: &StoryId) -> Result<Option<Story>> {
        Ok(self.read()?.stories.get(story_id).cloned())
    }

    fn put_tag(&self, tag: &Tag) -> Result<()> {
        self.write()?.tags.insert(tag.id, tag.clone());
        Ok(())
    }

    fn get_tag(&self, tag_id: &TagId) -> Result<Option<Tag>> {
        Ok(self.read()?.tags.get(tag_id).cloned())
    }

    fn stories_with_tag(&self, tag_id: &TagId) -> Result<Vec<StoryId>> {
        let tables = self.read()?;
        let mut ids: Vec<StoryId> = tables
            .stories
            .values()
            .filter(|s| s.tag_ids.contains(tag_id))
            .map(|s| s.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn put_settings(&self, settings: &ParentSettings) -> Result<()> {
        self.write()?
            .settings
            .insert(settings.user_id, settings.clone());
        Ok(())
    }

    fn get_settings(&self, user_id: &UserId) -> Result<Option<ParentSettings>> {
        Ok(self.read()?.settings.get(user_id).cloned())
    }

    fn append_usage(&self, event: &UsageEvent) -> Result<()> {
        self.write()?
            .usage
            .entry(event.user_id)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    fn usage_events_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<UsageEvent>> {
        let tables = self.read()?;
        let mut events: Vec<UsageEvent> = tables
            .usage
            .get(user_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.created_at > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        events.sort_by_key(|e| e.id);
        Ok(events)
    }

    fn put_progress(&self, progress: &StoryProgress) -> Result<()> {
        self.write()?
            .progress
            .insert((progress.user_id, progress.story_id), progress.clone());
        Ok(())
    }

    fn get_progress(&self, user_id: &UserId, story_id: &StoryId) -> Result<Option<StoryProgress>> {
        Ok(self.read()?.progress.get(&(*user_id, *story_id)).cloned())
    }

    fn list_progress(&self, user_id: &UserId) -> Result<Vec<StoryProgress>> {
        let tables = self.read()?;
        let mut records: Vec<StoryProgress> = tables
            .progress
            .values()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect();
        records.sort_by_key(|p| p.story_id);
        Ok(records)
    }
}
