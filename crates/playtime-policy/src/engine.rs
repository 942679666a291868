//! Rule composition.

use chrono::{DateTime, Utc};

use playtime_core::{StoryType, StoryWithTags, UserId, Verdict};
use playtime_store::Store;

use crate::error::Result;
use crate::rules::{ContentTypeRule, EvaluationContext, GlobalRule, Rule, TagRule};

/// Runs access rules in a fixed precedence order and stops at the first block.
pub struct PolicyEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl PolicyEngine {
    /// The standard order: global limit, then the content-type rules, then tags.
    #[must_use]
    pub fn standard() -> Self {
        let mut rules: Vec<Box<dyn Rule>> = vec![Box::new(GlobalRule)];
        for story_type in StoryType::ALL {
            rules.push(Box::new(ContentTypeRule::new(story_type)));
        }
        rules.push(Box::new(TagRule));
        Self::new(rules)
    }

    /// Create an engine with a custom rule list.
    #[must_use]
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Rule names in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate every rule in order, returning the first block.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule fails to read the usage ledger.
    pub fn evaluate(&self, store: &dyn Store, ctx: &EvaluationContext<'_>) -> Result<Verdict> {
        for rule in &self.rules {
            let verdict = rule.evaluate(store, ctx)?;
            if let Verdict::Block(reason) = &verdict {
                tracing::info!(
                    user_id = %ctx.user_id,
                    story_id = %ctx.story.id(),
                    rule = rule.name(),
                    reason = %reason,
                    "Access blocked"
                );
                return Ok(verdict);
            }
        }
        Ok(Verdict::Pass)
    }

    /// Judge a story for a user, loading the user's parent settings.
    ///
    /// Users without parent settings are unrestricted.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage read fails.
    pub fn check_access(
        &self,
        store: &dyn Store,
        user_id: UserId,
        story: &StoryWithTags,
        now: DateTime<Utc>,
    ) -> Result<Verdict> {
        let Some(settings) = store.get_settings(&user_id)? else {
            tracing::debug!(user_id = %user_id, "No parent settings, access unrestricted");
            return Ok(Verdict::Pass);
        };

        let ctx = EvaluationContext {
            user_id,
            story,
            settings: &settings,
            now,
        };
        self.evaluate(store, &ctx)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("rules", &self.rule_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{settings, story, utc_hour};
    use playtime_core::{BlockReason, Tag, TagId, TypeLimits};
    use playtime_store::MemoryStore;

    #[test]
    fn standard_order() {
        assert_eq!(
            PolicyEngine::standard().rule_names(),
            [
                "global",
                "content_type:audiobook",
                "content_type:readaloud",
                "tag"
            ]
        );
    }

    #[test]
    fn no_settings_means_unrestricted() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        // Even an untagged story passes.
        let story = story(&store, StoryType::Audiobook, &[]);

        let verdict = PolicyEngine::standard()
            .check_access(&store, user_id, &story, utc_hour(23))
            .unwrap();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn global_limit_wins_over_everything() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let story = story(&store, StoryType::Audiobook, &[]);
        store
            .put_settings(
                &settings(user_id)
                    .with_global_limit(60, 86_400)
                    .with_type_limits(
                        StoryType::Audiobook,
                        TypeLimits {
                            limit_seconds: Some(10),
                            ..TypeLimits::default()
                        },
                    ),
            )
            .unwrap();
        store.record_usage(user_id, story.id(), 60, utc_hour(9)).unwrap();

        let verdict = PolicyEngine::standard()
            .check_access(&store, user_id, &story, utc_hour(10))
            .unwrap();
        assert_eq!(verdict, Verdict::Block(BlockReason::GlobalTimeLimit));
    }

    #[test]
    fn untagged_story_blocks_when_limits_pass() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let story = story(&store, StoryType::Readaloud, &[]);
        store
            .put_settings(&settings(user_id).with_global_limit(3_600, 86_400))
            .unwrap();

        let verdict = PolicyEngine::standard()
            .check_access(&store, user_id, &story, utc_hour(10))
            .unwrap();
        assert_eq!(verdict, Verdict::Block(BlockReason::NoTagsAssigned));
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let tag = Tag::new(TagId::generate(), "Animals").with_limit(100, 86_400);
        let story = story(&store, StoryType::Audiobook, &[tag]);
        store.put_settings(&settings(user_id)).unwrap();
        store.record_usage(user_id, story.id(), 99, utc_hour(9)).unwrap();

        let engine = PolicyEngine::standard();
        let first = engine.check_access(&store, user_id, &story, utc_hour(10)).unwrap();
        let second = engine.check_access(&store, user_id, &story, utc_hour(10)).unwrap();
        assert_eq!(first, Verdict::Pass);
        assert_eq!(first, second);
    }

    #[test]
    fn custom_rule_lists_are_respected() {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        let story = story(&store, StoryType::Audiobook, &[]);
        store.put_settings(&settings(user_id)).unwrap();

        let engine = PolicyEngine::new(vec![Box::new(GlobalRule)]);
        assert_eq!(
            engine.check_access(&store, user_id, &story, utc_hour(10)).unwrap(),
            Verdict::Pass
        );
    }
}
