//! Key encoding utilities for `RocksDB`.
//!
//! All ids are 16 bytes; compound keys concatenate them so that a prefix scan
//! over the leading id lists every record belonging to it.

use chrono::{DateTime, Utc};
use playtime_core::{StoryId, TagId, UsageEventId, UserId};

/// Create a story key from a story ID.
#[must_use]
pub fn story_key(story_id: &StoryId) -> Vec<u8> {
    story_id.as_bytes().to_vec()
}

/// Create a tag key from a tag ID.
#[must_use]
pub fn tag_key(tag_id: &TagId) -> Vec<u8> {
    tag_id.as_bytes().to_vec()
}

/// Create a tag-story index key.
///
/// Format: `tag_id (16 bytes) || story_id (16 bytes)`
#[must_use]
pub fn tag_story_key(tag_id: &TagId, story_id: &StoryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(tag_id.as_bytes());
    key.extend_from_slice(story_id.as_bytes());
    key
}

/// Extract the story ID from a tag-story index key.
///
/// Returns `None` if the key is not 32 bytes long.
#[must_use]
pub fn story_id_from_tag_key(key: &[u8]) -> Option<StoryId> {
    let bytes: [u8; 16] = key.get(16..32)?.try_into().ok()?;
    Some(StoryId::from_bytes(bytes))
}

/// Create a settings key from a user ID.
#[must_use]
pub fn settings_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a usage ledger key.
///
/// Format: `user_id (16 bytes) || event_id (16 bytes)`
///
/// Since event ids are ULIDs stamped with the event time, a user's events are
/// sorted by time.
#[must_use]
pub fn usage_key(user_id: &UserId, event_id: &UsageEventId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&event_id.to_bytes());
    key
}

/// First ledger key that can hold an event recorded at or after `since`.
#[must_use]
pub fn usage_scan_start(user_id: &UserId, since: DateTime<Utc>) -> Vec<u8> {
    usage_key(user_id, &UsageEventId::lower_bound(since))
}

/// Create a prefix for iterating everything stored under a user.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a progress key.
///
/// Format: `user_id (16 bytes) || story_id (16 bytes)`
#[must_use]
pub fn progress_key(user_id: &UserId, story_id: &StoryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(story_id.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tag_story_key_round_trips_story_id() {
        let tag_id = TagId::generate();
        let story_id = StoryId::generate();
        let key = tag_story_key(&tag_id, &story_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], tag_id.as_bytes());
        assert_eq!(story_id_from_tag_key(&key), Some(story_id));
        assert_eq!(story_id_from_tag_key(&key[..20]), None);
    }

    #[test]
    fn usage_keys_sort_by_time_within_user() {
        let user_id = UserId::generate();
        let t0 = Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::seconds(5);

        let k0 = usage_key(&user_id, &UsageEventId::generate_at(t0));
        let k1 = usage_key(&user_id, &UsageEventId::generate_at(t1));
        assert!(k0 < k1);
        assert!(usage_scan_start(&user_id, t1) > k0);
        assert!(usage_scan_start(&user_id, t1) <= k1);
        assert!(k0.starts_with(&user_prefix(&user_id)));
    }
}
