//! Core types and utilities for playtime.
//!
//! This crate provides the foundational types of the usage policy engine:
//!
//! - **Identifiers**: `UserId`, `StoryId`, `TagId`, `UsageEventId`
//! - **Content**: `Story`, `StoryType`, `Tag`, `StoryWithTags`
//! - **Configuration**: `ParentSettings`, `TypeLimits`
//! - **Usage**: `UsageEvent`, `UsageScope`, `StoryProgress`
//! - **Access**: `Verdict`, `BlockReason`
//! - **Time windows**: `window_start`, `is_within_restricted_hours`
//!
//! # Units
//!
//! All limits, intervals and usage amounts are whole seconds (`u64`). Windows
//! default to one day.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod error;
pub mod ids;
pub mod settings;
pub mod story;
pub mod usage;
pub mod window;

/// Default window length for limits: one day.
pub const DEFAULT_INTERVAL_SECONDS: u64 = 86_400;

pub use access::{message_for_reason, BlockKind, BlockReason, Verdict, GENERIC_BLOCK_MESSAGE};
pub use error::{CoreError, Result};
pub use ids::{IdError, StoryId, TagId, UsageEventId, UserId};
pub use settings::{validate_pin, ParentSettings, TypeLimits, DEFAULT_TIME_ZONE};
pub use story::{Story, StoryType, StoryWithTags, Tag};
pub use usage::{PlaybackPosition, StoryProgress, UsageEvent, UsageScope};
pub use window::{is_within_restricted_hours, local_hour, window_start};
