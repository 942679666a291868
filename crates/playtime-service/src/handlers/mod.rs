//! API handlers.

pub mod health;
pub mod playback;
pub mod progress;
pub mod settings;
pub mod stories;
pub mod tags;
pub mod usage;
