//! Application state.

use std::sync::Arc;

use playtime_policy::PlaybackOrchestrator;
use playtime_store::Store;

use crate::auth::JwksClient;
use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Heartbeat and access-check entry point over `store`.
    pub orchestrator: PlaybackOrchestrator,

    /// Identity provider signing keys.
    pub jwks: Arc<JwksClient>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not configured - story and tag writes are disabled");
        }

        let orchestrator = PlaybackOrchestrator::new(store.clone());
        let jwks = Arc::new(JwksClient::new(&config.auth_base_url));

        Self {
            store,
            orchestrator,
            jwks,
            config,
        }
    }

    /// Redirect target for a blocked player.
    #[must_use]
    pub fn times_up_redirect(&self, reason: &str) -> String {
        format!(
            "{}?reason={}",
            self.config.times_up_path,
            urlencoding::encode(reason)
        )
    }
}
