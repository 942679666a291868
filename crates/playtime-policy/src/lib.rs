//! Usage policy evaluation for playtime.
//!
//! On every playback heartbeat the [`PlaybackOrchestrator`] records progress
//! and usage, then asks the [`PolicyEngine`] whether the child may keep
//! listening. The engine runs its rules in a fixed order and stops at the
//! first block:
//!
//! 1. [`GlobalRule`]: total play across all stories.
//! 2. [`ContentTypeRule`]: restricted hours and limits per content type.
//! 3. [`TagRule`]: per-tag restricted hours and limits, then enablement.
//!
//! Missing parent settings mean no restrictions. Timezone problems fail open.
//! Storage failures are errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod rules;
pub mod summary;

pub use engine::PolicyEngine;
pub use error::{PolicyError, Result};
pub use orchestrator::{Heartbeat, HeartbeatOutcome, PlaybackOrchestrator};
pub use rules::{ContentTypeRule, EvaluationContext, GlobalRule, Rule, TagRule};
pub use summary::{LimitUsage, UsageSummary};
