//! Rule evaluators.
//!
//! Each rule looks at one category of constraint and either passes or blocks
//! with a reason. Rules read the usage ledger through the store at call time;
//! they never cache sums, so a heartbeat's own append is always visible.

mod content_type;
mod global;
mod tag;

pub use content_type::ContentTypeRule;
pub use global::GlobalRule;
pub use tag::TagRule;

use chrono::{DateTime, Utc};

use playtime_core::{ParentSettings, StoryWithTags, UserId, Verdict};
use playtime_store::Store;

use crate::error::Result;

/// Everything a rule needs to judge one story for one user.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// The child requesting playback.
    pub user_id: UserId,
    /// The story with its resolved tags.
    pub story: &'a StoryWithTags,
    /// The child's parent settings.
    pub settings: &'a ParentSettings,
    /// Evaluation instant.
    pub now: DateTime<Utc>,
}

/// A single access rule.
pub trait Rule: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Judge the story in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the usage ledger fails.
    fn evaluate(&self, store: &dyn Store, ctx: &EvaluationContext<'_>) -> Result<Verdict>;
}
