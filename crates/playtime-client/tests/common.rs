//! Shared fixtures for client tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::MockServer;

use playtime_client::{PlaybackSource, PlaytimeClient};
use playtime_core::PlaybackPosition;

pub const TOKEN: &str = "test-token";

/// A player stuck at one position.
pub struct FixedPlayer(pub PlaybackPosition);

impl FixedPlayer {
    pub fn playing() -> Self {
        Self(PlaybackPosition {
            current_time: 42.5,
            current_chapter_index: 1,
            is_playing: true,
        })
    }
}

#[async_trait]
impl PlaybackSource for FixedPlayer {
    async fn position(&self) -> PlaybackPosition {
        self.0
    }
}

pub fn client(server: &MockServer) -> PlaytimeClient {
    PlaytimeClient::new(server.uri(), TOKEN).unwrap()
}

pub fn pass() -> Value {
    json!({ "success": true, "limit_reached": false, "play_count": 1, "recorded_seconds": 5 })
}

pub fn blocked(reason: &str) -> Value {
    json!({
        "success": true,
        "limit_reached": true,
        "reason": reason,
        "kind": "time_limit",
        "message": "That's all for now!",
        "redirect": "/times-up?reason=Global%20Time%20Limit%20Reached",
    })
}

/// Bodies of every heartbeat the server received, in order.
pub async fn heartbeat_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/v1/heartbeat")
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}
