//! Playtime Client SDK.
//!
//! A client library for players talking to the playtime service, plus a
//! [`HeartbeatDriver`] that reports listening time and stops playback when a
//! limit is hit.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use playtime_client::{HeartbeatDriver, PlaybackSource, PlaytimeClient, SessionOutcome};
//! use playtime_core::{PlaybackPosition, StoryId};
//!
//! struct Player;
//!
//! #[async_trait]
//! impl PlaybackSource for Player {
//!     async fn position(&self) -> PlaybackPosition {
//!         PlaybackPosition { current_time: 0.0, current_chapter_index: 0, is_playing: true }
//!     }
//! }
//!
//! # async fn example(story_id: StoryId) -> Result<(), playtime_client::ClientError> {
//! let client = PlaytimeClient::new("http://playtime.svc:8080", "user-token")?;
//! let mut driver = HeartbeatDriver::new(client, Player, story_id);
//!
//! let stop = tokio::time::sleep(std::time::Duration::from_secs(30 * 60));
//! let outcome = driver.run_until(stop).await?;
//! if let SessionOutcome::Locked { redirect, .. } = outcome {
//!     println!("time's up: {redirect:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod driver;
mod error;
mod types;

pub use client::{ClientOptions, PlaytimeClient};
pub use driver::{
    HeartbeatDriver, PlaybackSource, SessionOutcome, SessionState, DEFAULT_HEARTBEAT_INTERVAL,
};
pub use error::ClientError;
pub use types::*;
