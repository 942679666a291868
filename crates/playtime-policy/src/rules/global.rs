//! Global time limit across all stories.

use playtime_core::{window_start, BlockReason, UsageScope, Verdict};
use playtime_store::Store;

use super::{EvaluationContext, Rule};
use crate::error::Result;

/// Blocks once total play in the global window reaches the global limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalRule;

impl Rule for GlobalRule {
    fn name(&self) -> &'static str {
        "global"
    }

    fn evaluate(&self, store: &dyn Store, ctx: &EvaluationContext<'_>) -> Result<Verdict> {
        let Some(limit) = ctx.settings.global_limit_seconds else {
            return Ok(Verdict::Pass);
        };

        let since = window_start(ctx.now, ctx.settings.global_interval_seconds);
        let used = store.sum_usage_since(&ctx.user_id, UsageScope::AllStories, since)?;

        tracing::debug!(user_id = %ctx.user_id, used, limit, "Global usage");

        if used >= limit {
            Ok(Verdict::Block(BlockReason::GlobalTimeLimit))
        } else {
            Ok(Verdict::Pass)
        }
    }
}
