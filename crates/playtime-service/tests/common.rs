//! Common test utilities for playtime integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use playtime_core::{
    ParentSettings, Story, StoryId, StoryProgress, Tag, TagId, UsageEvent, UserId,
};
use playtime_service::{create_router, AppState, ServiceConfig};
use playtime_store::{MemoryStore, Store, StoreError};

/// Header name for service API keys.
pub const API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// Header name for the current parent PIN.
pub const PARENT_PIN: HeaderName = HeaderName::from_static("x-parent-pin");

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the store for seeding the ledger.
    pub store: Arc<MemoryStore>,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// The service API key for metadata writes.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with an empty store.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(store.clone(), store)
    }

    /// Create a harness whose usage ledger rejects every append.
    pub fn with_failing_ledger() -> Self {
        let store = Arc::new(MemoryStore::new());
        let app_store = Arc::new(FailingLedger {
            inner: store.clone(),
        });
        Self::build(store, app_store)
    }

    fn build(store: Arc<MemoryStore>, app_store: Arc<dyn Store>) -> Self {
        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            auth_base_url: "http://localhost".into(),
            service_api_key: Some(service_api_key.clone()),
            pin_secret: "test-pin-secret".into(),
            allow_test_tokens: true,
            ..ServiceConfig::default()
        };

        let state = AppState::new(app_store, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            test_user_id: UserId::generate(),
            service_api_key,
        }
    }

    /// Authorization header value for the test user.
    pub fn user_auth(&self) -> HeaderValue {
        bearer(&self.test_user_id)
    }

    /// Service API key header value.
    pub fn service_key(&self) -> HeaderValue {
        HeaderValue::from_str(&self.service_api_key).unwrap()
    }

    /// Register a tag through the API.
    pub async fn put_tag(&self, body: Value) -> TagId {
        let tag_id = TagId::generate();
        self.server
            .put(&format!("/v1/tags/{tag_id}"))
            .add_header(API_KEY, self.service_key())
            .json(&body)
            .await
            .assert_status_ok();
        tag_id
    }

    /// Register a story through the API.
    pub async fn put_story(&self, story_type: &str, tag_ids: &[TagId]) -> StoryId {
        let story_id = StoryId::generate();
        let tag_ids: Vec<String> = tag_ids.iter().map(ToString::to_string).collect();
        self.server
            .put(&format!("/v1/stories/{story_id}"))
            .add_header(API_KEY, self.service_key())
            .json(&json!({
                "title": "The Sleepy Owl",
                "story_type": story_type,
                "tag_ids": tag_ids,
            }))
            .await
            .assert_status_ok();
        story_id
    }

    /// Create the test user's first parent settings.
    pub async fn put_settings(&self, body: Value) {
        self.server
            .put("/v1/settings")
            .add_header(axum::http::header::AUTHORIZATION, self.user_auth())
            .json(&body)
            .await
            .assert_status_ok();
    }

    /// Append past usage directly to the ledger.
    pub fn seed_usage(&self, story_id: StoryId, seconds: u64) {
        self.store
            .record_usage(
                self.test_user_id,
                story_id,
                seconds,
                Utc::now() - Duration::minutes(5),
            )
            .unwrap();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Authorization header value for any user.
pub fn bearer(user_id: &UserId) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer test-token:{user_id}")).unwrap()
}

/// A playing heartbeat body.
pub fn heartbeat_body(story_id: StoryId, increment_seconds: u64) -> Value {
    json!({
        "story_id": story_id.to_string(),
        "current_time": 12.5,
        "current_chapter_index": 0,
        "increment_seconds": increment_seconds,
        "is_playing": true,
    })
}

/// Store whose ledger appends always fail; everything else delegates.
struct FailingLedger {
    inner: Arc<MemoryStore>,
}

impl Store for FailingLedger {
    fn put_story(&self, story: &Story) -> playtime_store::Result<()> {
        self.inner.put_story(story)
    }
    fn get_story(&self, id: &StoryId) -> playtime_store::Result<Option<Story>> {
        self.inner.get_story(id)
    }
    fn put_tag(&self, tag: &Tag) -> playtime_store::Result<()> {
        self.inner.put_tag(tag)
    }
    fn get_tag(&self, id: &TagId) -> playtime_store::Result<Option<Tag>> {
        self.inner.get_tag(id)
    }
    fn stories_with_tag(&self, id: &TagId) -> playtime_store::Result<Vec<StoryId>> {
        self.inner.stories_with_tag(id)
    }
    fn put_settings(&self, settings: &ParentSettings) -> playtime_store::Result<()> {
        self.inner.put_settings(settings)
    }
    fn get_settings(&self, user_id: &UserId) -> playtime_store::Result<Option<ParentSettings>> {
        self.inner.get_settings(user_id)
    }
    fn append_usage(&self, _event: &UsageEvent) -> playtime_store::Result<()> {
        Err(StoreError::Database("ledger unavailable".into()))
    }
    fn usage_events_since(
        &self,
        user_id: &UserId,
        since: chrono::DateTime<Utc>,
    ) -> playtime_store::Result<Vec<UsageEvent>> {
        self.inner.usage_events_since(user_id, since)
    }
    fn put_progress(&self, progress: &StoryProgress) -> playtime_store::Result<()> {
        self.inner.put_progress(progress)
    }
    fn get_progress(
        &self,
        user_id: &UserId,
        story_id: &StoryId,
    ) -> playtime_store::Result<Option<StoryProgress>> {
        self.inner.get_progress(user_id, story_id)
    }
    fn list_progress(&self, user_id: &UserId) -> playtime_store::Result<Vec<StoryProgress>> {
        self.inner.list_progress(user_id)
    }
}
