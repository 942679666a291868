//! Heartbeat orchestration.
//!
//! One heartbeat upserts the story's progress, appends the played seconds to
//! the ledger and then evaluates the rules. Evaluation reads the ledger after
//! the append, so a heartbeat that crosses a limit is blocked by its own
//! increment.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use playtime_core::{
    PlaybackPosition, StoryId, StoryProgress, StoryWithTags, UsageEvent, UserId, Verdict,
};
use playtime_store::Store;

use crate::engine::PolicyEngine;
use crate::error::{PolicyError, Result};
use crate::summary::{self, UsageSummary};

/// A playback heartbeat from the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heartbeat {
    /// The story being played.
    pub story_id: StoryId,
    /// Reported player position.
    pub position: PlaybackPosition,
    /// Whole seconds played since the previous heartbeat.
    pub increment_seconds: u64,
}

impl Heartbeat {
    fn validate(&self) -> Result<()> {
        let t = self.position.current_time;
        if !t.is_finite() || t < 0.0 {
            return Err(PolicyError::InvalidHeartbeat(
                "current_time must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// What a heartbeat produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatOutcome {
    /// Whether playback may continue.
    pub verdict: Verdict,
    /// The progress record as written.
    pub progress: StoryProgress,
    /// The ledger entry, if any seconds were played.
    pub recorded: Option<UsageEvent>,
}

/// Entry point for heartbeats and pre-flight access checks.
#[derive(Clone)]
pub struct PlaybackOrchestrator {
    store: Arc<dyn Store>,
    engine: Arc<PolicyEngine>,
}

impl PlaybackOrchestrator {
    /// Create an orchestrator with the standard rule order.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_engine(store, PolicyEngine::standard())
    }

    /// Create an orchestrator with a custom engine.
    #[must_use]
    pub fn with_engine(store: Arc<dyn Store>, engine: PolicyEngine) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
        }
    }

    /// Record a heartbeat and judge whether playback may continue.
    ///
    /// Progress is written regardless of the verdict.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeartbeat` or `StoryNotFound` before anything is
    /// written, and a store error if a write or read fails.
    pub fn record_heartbeat(
        &self,
        user_id: UserId,
        heartbeat: &Heartbeat,
        now: DateTime<Utc>,
    ) -> Result<HeartbeatOutcome> {
        heartbeat.validate()?;
        let story = self.load_story(&heartbeat.story_id)?;

        let previous = self.store.get_progress(&user_id, &heartbeat.story_id)?;
        let progress = StoryProgress::advance(
            previous.as_ref(),
            user_id,
            heartbeat.story_id,
            heartbeat.position,
            now,
        );
        self.store.put_progress(&progress)?;

        let recorded = self.store.record_usage(
            user_id,
            heartbeat.story_id,
            heartbeat.increment_seconds,
            now,
        )?;

        tracing::debug!(
            user_id = %user_id,
            story_id = %heartbeat.story_id,
            increment_seconds = heartbeat.increment_seconds,
            is_playing = heartbeat.position.is_playing,
            "Heartbeat recorded"
        );

        let verdict = self
            .engine
            .check_access(self.store.as_ref(), user_id, &story, now)?;

        Ok(HeartbeatOutcome {
            verdict,
            progress,
            recorded,
        })
    }

    /// Judge a story before playback starts. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `StoryNotFound` if the story does not exist, or a store error.
    pub fn check_access(
        &self,
        user_id: UserId,
        story_id: &StoryId,
        now: DateTime<Utc>,
    ) -> Result<Verdict> {
        let story = self.load_story(story_id)?;
        self.engine
            .check_access(self.store.as_ref(), user_id, &story, now)
    }

    /// Stories the user is currently playing: progress marked playing and
    /// written within `window_seconds`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read fails.
    pub fn active_stories(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        window_seconds: u64,
    ) -> Result<Vec<StoryProgress>> {
        Ok(self
            .store
            .list_progress(user_id)?
            .into_iter()
            .filter(|p| p.is_active(now, window_seconds))
            .collect())
    }

    /// Seconds used against each configured limit.
    ///
    /// # Errors
    ///
    /// Returns a store error if a read fails.
    pub fn usage_summary(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<UsageSummary> {
        summary::summarize(self.store.as_ref(), user_id, now)
    }

    fn load_story(&self, story_id: &StoryId) -> Result<StoryWithTags> {
        self.store
            .get_story_with_tags(story_id)?
            .ok_or(PolicyError::StoryNotFound(*story_id))
    }
}

impl std::fmt::Debug for PlaybackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackOrchestrator")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
