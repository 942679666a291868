//! Tag enablement, restricted hours and shared time limits.

use playtime_core::{is_within_restricted_hours, window_start, BlockReason, UsageScope, Verdict};
use playtime_store::Store;

use super::{EvaluationContext, Rule};
use crate::error::Result;

/// Gates a story on its tags.
///
/// Tags are checked in the story's order and the first blocking tag wins.
/// Restricted hours and limits apply to every attached tag, enabled or not.
/// Only once no tag blocks does the rule require at least one enabled tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagRule;

impl Rule for TagRule {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn evaluate(&self, store: &dyn Store, ctx: &EvaluationContext<'_>) -> Result<Verdict> {
        let mut any_enabled = false;

        for tag in &ctx.story.tags {
            any_enabled |= tag.enabled;

            if is_within_restricted_hours(
                ctx.now,
                &ctx.settings.time_zone,
                tag.restricted_hours_start,
                tag.restricted_hours_end,
            ) {
                return Ok(Verdict::Block(BlockReason::TagRestrictedHours));
            }

            if let Some(limit) = tag.limit_seconds {
                let since = window_start(ctx.now, tag.interval_seconds);
                let used = store.sum_usage_since(&ctx.user_id, UsageScope::Tag(tag.id), since)?;

                tracing::debug!(tag_id = %tag.id, used, limit, "Tag usage");

                if used >= limit {
                    return Ok(Verdict::Block(BlockReason::TagTimeLimit {
                        tag_name: tag.name.clone(),
                    }));
                }
            }
        }

        if ctx.story.tags.is_empty() {
            Ok(Verdict::Block(BlockReason::NoTagsAssigned))
        } else if !any_enabled {
            Ok(Verdict::Block(BlockReason::Restricted))
        } else {
            Ok(Verdict::Pass)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{settings, story, utc_hour};
    use playtime_core::{Story, StoryId, StoryType, Tag, TagId, UserId};
    use playtime_store::MemoryStore;

    fn eval(store: &MemoryStore, user_id: UserId, story: &playtime_core::StoryWithTags, hour: u32) -> Verdict {
        let settings = settings(user_id);
        let ctx = EvaluationContext {
            user_id,
            story,
            settings: &settings,
            now: utc_hour(hour),
        };
        TagRule.evaluate(store, &ctx).unwrap()
    }

    #[test]
    fn untagged_story_is_locked() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let story = story(&store, StoryType::Audiobook, &[]);

        assert_eq!(
            eval(&store, user_id, &story, 12),
            Verdict::Block(BlockReason::NoTagsAssigned)
        );
    }

    #[test]
    fn only_disabled_tags_is_restricted() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let tag = Tag::new(TagId::generate(), "Bedtime").enabled(false);
        let story = story(&store, StoryType::Audiobook, &[tag]);

        assert_eq!(
            eval(&store, user_id, &story, 12),
            Verdict::Block(BlockReason::Restricted)
        );
    }

    #[test]
    fn one_enabled_tag_unlocks() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let off = Tag::new(TagId::generate(), "Scary").enabled(false);
        let on = Tag::new(TagId::generate(), "Animals");
        let story = story(&store, StoryType::Readaloud, &[off, on]);

        assert_eq!(eval(&store, user_id, &story, 12), Verdict::Pass);
    }

    #[test]
    fn tag_limit_wins_over_missing_enablement() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let off = Tag::new(TagId::generate(), "Scary").enabled(false);
        let dino = Tag::new(TagId::generate(), "Dinosaurs").with_limit(300, 86_400);
        let story = story(&store, StoryType::Audiobook, &[off, dino]);

        store.record_usage(user_id, story.id(), 300, utc_hour(8)).unwrap();

        let verdict = eval(&store, user_id, &story, 12);
        assert_eq!(
            verdict,
            Verdict::Block(BlockReason::TagTimeLimit {
                tag_name: "Dinosaurs".into()
            })
        );
        assert_eq!(verdict.reason().unwrap().to_string(), "Time Limit (Dinosaurs)");
    }

    #[test]
    fn tag_limit_is_shared_across_stories() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let tag = Tag::new(TagId::generate(), "Songs").with_limit(120, 86_400);
        let first = story(&store, StoryType::Audiobook, &[tag.clone()]);

        let second = Story::new(StoryId::generate(), "Other", StoryType::Readaloud)
            .with_tags([tag.id]);
        store.put_story(&second).unwrap();
        store.record_usage(user_id, second.id, 120, utc_hour(8)).unwrap();

        assert!(matches!(
            eval(&store, user_id, &first, 12),
            Verdict::Block(BlockReason::TagTimeLimit { .. })
        ));
    }

    #[test]
    fn restricted_hours_checked_per_tag_in_order() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let night = Tag::new(TagId::generate(), "Lively").with_restricted_hours(20, 8);
        let limited = Tag::new(TagId::generate(), "Short").with_limit(1, 86_400);
        let story = story(&store, StoryType::Audiobook, &[night, limited]);
        store.record_usage(user_id, story.id(), 5, utc_hour(1)).unwrap();

        assert_eq!(
            eval(&store, user_id, &story, 2),
            Verdict::Block(BlockReason::TagRestrictedHours)
        );
        assert_eq!(
            eval(&store, user_id, &story, 12),
            Verdict::Block(BlockReason::TagTimeLimit {
                tag_name: "Short".into()
            })
        );
    }
}
