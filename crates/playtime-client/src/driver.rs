//! Playback heartbeat driver.
//!
//! Wraps a player and a [`PlaytimeClient`]: checks access before playback
//! starts, reports played seconds on an interval and on pause or unload, and
//! stops the session when the service reports a block.
//!
//! Only whole seconds are sent. The fractional remainder, and everything a
//! failed heartbeat tried to report, stay pending and go out with the next
//! heartbeat.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use playtime_core::{PlaybackPosition, StoryId};

use crate::client::PlaytimeClient;
use crate::error::ClientError;
use crate::types::{AccessResponse, HeartbeatRequest};

/// Default time between heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Source of the current player position.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    /// Current position and play state.
    async fn position(&self) -> PlaybackPosition;
}

/// Where a session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not started.
    Idle,
    /// Access granted; heartbeats are flowing.
    Playing,
    /// The service blocked playback. Terminal.
    Locked {
        /// Block reason.
        reason: String,
        /// "Time's up" location, when the service supplied one.
        redirect: Option<String>,
    },
}

/// How a driven session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Playback must stop; navigate to `redirect`.
    Locked {
        /// Block reason.
        reason: String,
        /// "Time's up" location, when the service supplied one.
        redirect: Option<String>,
    },
    /// The caller stopped the session.
    Stopped,
}

/// Played time not yet acknowledged by the service.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct PlayAccumulator {
    pending: f64,
}

impl PlayAccumulator {
    pub(crate) fn add(&mut self, played: Duration) {
        self.pending += played.as_secs_f64();
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn whole_seconds(&self) -> u64 {
        self.pending.floor().max(0.0) as u64
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn consume(&mut self, seconds: u64) {
        self.pending = (self.pending - seconds as f64).max(0.0);
    }
}

/// Drives heartbeats for one story.
pub struct HeartbeatDriver<P> {
    client: PlaytimeClient,
    player: P,
    story_id: StoryId,
    interval: Duration,
    state: SessionState,
    pending: PlayAccumulator,
    last_tick: Option<Instant>,
}

impl<P: PlaybackSource> HeartbeatDriver<P> {
    /// Create a driver with the default heartbeat interval.
    #[must_use]
    pub fn new(client: PlaytimeClient, player: P, story_id: StoryId) -> Self {
        Self {
            client,
            player,
            story_id,
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            state: SessionState::Idle,
            pending: PlayAccumulator::default(),
            last_tick: None,
        }
    }

    /// Override the heartbeat interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whole seconds waiting to be reported.
    #[must_use]
    pub fn pending_seconds(&self) -> u64 {
        self.pending.whole_seconds()
    }

    /// Pre-flight access check. Returns the lock outcome if the story may
    /// not be played.
    ///
    /// # Errors
    ///
    /// Returns an error if the check could not be made; the session stays idle.
    pub async fn start(&mut self) -> Result<Option<SessionOutcome>, ClientError> {
        if let Some(outcome) = self.locked_outcome() {
            return Ok(Some(outcome));
        }

        let access = self.client.check_access(&self.story_id).await?;
        if access.limit_reached {
            return Ok(Some(self.lock(access)));
        }

        tracing::debug!(story_id = %self.story_id, "Playback allowed");
        self.state = SessionState::Playing;
        self.last_tick = Some(Instant::now());
        Ok(None)
    }

    /// Report time played since the previous tick.
    ///
    /// Time only counts while the player says it is playing.
    ///
    /// # Errors
    ///
    /// Returns an error if the heartbeat failed; its seconds stay pending.
    pub async fn tick(&mut self) -> Result<Option<SessionOutcome>, ClientError> {
        let elapsed = self.take_elapsed();
        let position = self.player.position().await;
        let played = if position.is_playing {
            elapsed
        } else {
            Duration::ZERO
        };
        self.send(position, played).await
    }

    /// Report `played` of playback measured by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the heartbeat failed; its seconds stay pending.
    pub async fn report_played(
        &mut self,
        played: Duration,
    ) -> Result<Option<SessionOutcome>, ClientError> {
        self.last_tick = Some(Instant::now());
        let position = self.player.position().await;
        self.send(position, played).await
    }

    /// Report a pause, flushing the time played up to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the heartbeat failed; its seconds stay pending.
    pub async fn pause(&mut self) -> Result<Option<SessionOutcome>, ClientError> {
        let elapsed = self.take_elapsed();
        let mut position = self.player.position().await;
        position.is_playing = false;
        self.send(position, elapsed).await
    }

    /// Send a final heartbeat without waiting for the answer.
    ///
    /// The returned handle may be dropped; the request still completes.
    pub async fn unload(mut self) -> JoinHandle<()> {
        let elapsed = self.take_elapsed();
        self.pending.add(elapsed);

        let mut position = self.player.position().await;
        position.is_playing = false;
        let request =
            HeartbeatRequest::new(self.story_id, position, self.pending.whole_seconds());
        let client = self.client;

        tokio::spawn(async move {
            if let Err(e) = client.heartbeat(&request).await {
                tracing::debug!(
                    error = %e,
                    story_id = %request.story_id,
                    seconds = request.increment_seconds,
                    "Unload heartbeat lost"
                );
            }
        })
    }

    /// Run the session until the service blocks playback or `stop` resolves.
    ///
    /// Failed heartbeats are logged and retried on the next tick. On stop a
    /// pause heartbeat is sent.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pre-flight check fails.
    pub async fn run_until<F>(&mut self, stop: F) -> Result<SessionOutcome, ClientError>
    where
        F: Future<Output = ()>,
    {
        if self.state == SessionState::Idle {
            if let Some(outcome) = self.start().await? {
                return Ok(outcome);
            }
        }
        if let Some(outcome) = self.locked_outcome() {
            return Ok(outcome);
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                () = &mut stop => {
                    match self.pause().await {
                        Ok(Some(outcome)) => return Ok(outcome),
                        Ok(None) => {}
                        Err(e) => tracing::warn!(error = %e, "Pause heartbeat failed"),
                    }
                    return Ok(SessionOutcome::Stopped);
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(Some(outcome)) => return Ok(outcome),
                        Ok(None) => {}
                        Err(e) => tracing::warn!(
                            error = %e,
                            pending_seconds = self.pending.whole_seconds(),
                            "Heartbeat failed, retrying next tick"
                        ),
                    }
                }
            }
        }
    }

    async fn send(
        &mut self,
        position: PlaybackPosition,
        played: Duration,
    ) -> Result<Option<SessionOutcome>, ClientError> {
        if let Some(outcome) = self.locked_outcome() {
            return Ok(Some(outcome));
        }

        self.pending.add(played);
        let increment = self.pending.whole_seconds();
        let request = HeartbeatRequest::new(self.story_id, position, increment);

        let response = self.client.heartbeat(&request).await?;
        self.pending.consume(increment);

        if response.access.limit_reached {
            return Ok(Some(self.lock(response.access)));
        }
        Ok(None)
    }

    fn take_elapsed(&mut self) -> Duration {
        let now = Instant::now();
        self.last_tick
            .replace(now)
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last))
    }

    fn lock(&mut self, access: AccessResponse) -> SessionOutcome {
        let reason = access.reason.unwrap_or_default();
        tracing::info!(story_id = %self.story_id, reason = %reason, "Playback locked");
        self.state = SessionState::Locked {
            reason: reason.clone(),
            redirect: access.redirect.clone(),
        };
        SessionOutcome::Locked {
            reason,
            redirect: access.redirect,
        }
    }

    fn locked_outcome(&self) -> Option<SessionOutcome> {
        match &self.state {
            SessionState::Locked { reason, redirect } => Some(SessionOutcome::Locked {
                reason: reason.clone(),
                redirect: redirect.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_remainder_carries_forward() {
        let mut acc = PlayAccumulator::default();
        acc.add(Duration::from_millis(2_500));
        assert_eq!(acc.whole_seconds(), 2);
        acc.consume(2);

        acc.add(Duration::from_millis(2_700));
        assert_eq!(acc.whole_seconds(), 3);
        acc.consume(3);
        assert_eq!(acc.whole_seconds(), 0);
    }

    #[test]
    fn unconsumed_seconds_accumulate() {
        let mut acc = PlayAccumulator::default();
        acc.add(Duration::from_secs(5));
        // heartbeat failed: nothing consumed
        acc.add(Duration::from_secs(5));
        assert_eq!(acc.whole_seconds(), 10);
    }

    #[test]
    fn consume_never_goes_negative() {
        let mut acc = PlayAccumulator::default();
        acc.add(Duration::from_secs(1));
        acc.consume(3);
        assert_eq!(acc.whole_seconds(), 0);
    }
}
