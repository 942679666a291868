//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, playback, progress, settings, stories, tags, usage};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent heartbeat requests. Every active player sends one every
/// few seconds.
const HEARTBEAT_MAX_CONCURRENT_REQUESTS: usize = 200;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Playback (JWT auth)
/// - `POST /v1/heartbeat` - Record a heartbeat, get the verdict
/// - `GET /v1/stories/:story_id/access` - Pre-flight access check
/// - `GET /v1/stories/:story_id` - Story with tags
/// - `GET /v1/progress/:story_id` - Resume position
/// - `GET /v1/activity` - Stories playing right now
/// - `GET /v1/usage/summary` - Usage against limits
///
/// ## Parent settings (JWT auth, PIN for changes)
/// - `GET /v1/settings`
/// - `PUT /v1/settings`
/// - `POST /v1/settings/pin` - Verify a PIN
///
/// ## Metadata (Service API Key auth)
/// - `PUT /v1/stories/:story_id`
/// - `GET /v1/tags/:tag_id`
/// - `PUT /v1/tags/:tag_id`
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let heartbeat_routes = Router::new()
        .route("/", post(playback::heartbeat))
        .layer(ConcurrencyLimitLayer::new(HEARTBEAT_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Stories
        .route(
            "/stories/:story_id",
            get(stories::get_story).put(stories::put_story),
        )
        .route("/stories/:story_id/access", get(playback::check_access))
        // Tags
        .route("/tags/:tag_id", get(tags::get_tag).put(tags::put_tag))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        .route("/settings/pin", post(settings::verify_parent_pin))
        // Progress
        .route("/progress/:story_id", get(progress::get_progress))
        .route("/activity", get(progress::activity))
        // Usage
        .route("/usage/summary", get(usage::usage_summary))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS))
        .nest("/heartbeat", heartbeat_routes);

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
