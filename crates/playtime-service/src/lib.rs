//! Playtime HTTP API Service.
//!
//! This crate serves the usage policy engine to players and parents:
//!
//! - Playback heartbeats and pre-flight access checks
//! - Resume positions and currently-playing stories
//! - Parent settings behind a PIN
//! - Story and tag metadata from the ingestion pipeline
//!
//! # Authentication
//!
//! 1. **JWT tokens** - the child profile using the player
//! 2. **Service API keys** - the ingestion pipeline

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when the store is sync

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
