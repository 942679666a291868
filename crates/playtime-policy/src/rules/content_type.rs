//! Per-content-type restricted hours and time limits.

use playtime_core::{
    is_within_restricted_hours, window_start, BlockReason, StoryType, UsageScope, Verdict,
};
use playtime_store::Store;

use super::{EvaluationContext, Rule};
use crate::error::Result;

/// Applies the parent's limits for one content type.
///
/// Stories of other types pass. Restricted hours are checked before usage.
#[derive(Debug, Clone, Copy)]
pub struct ContentTypeRule {
    story_type: StoryType,
}

impl ContentTypeRule {
    /// Create the rule for a content type.
    #[must_use]
    pub const fn new(story_type: StoryType) -> Self {
        Self { story_type }
    }

    /// The content type this rule applies to.
    #[must_use]
    pub const fn story_type(&self) -> StoryType {
        self.story_type
    }
}

impl Rule for ContentTypeRule {
    fn name(&self) -> &'static str {
        match self.story_type {
            StoryType::Audiobook => "content_type:audiobook",
            StoryType::Readaloud => "content_type:readaloud",
        }
    }

    fn evaluate(&self, store: &dyn Store, ctx: &EvaluationContext<'_>) -> Result<Verdict> {
        if ctx.story.story_type() != self.story_type {
            return Ok(Verdict::Pass);
        }

        let limits = ctx.settings.limits_for(self.story_type);

        if is_within_restricted_hours(
            ctx.now,
            &ctx.settings.time_zone,
            limits.restricted_start,
            limits.restricted_end,
        ) {
            return Ok(Verdict::Block(BlockReason::ContentTypeRestrictedHours(
                self.story_type,
            )));
        }

        let Some(limit) = limits.limit_seconds else {
            return Ok(Verdict::Pass);
        };

        let since = window_start(ctx.now, limits.interval_seconds);
        let used = store.sum_usage_since(
            &ctx.user_id,
            UsageScope::ContentType(self.story_type),
            since,
        )?;

        if used >= limit {
            Ok(Verdict::Block(BlockReason::ContentTypeTimeLimit(
                self.story_type,
            )))
        } else {
            Ok(Verdict::Pass)
        }
    }
}
