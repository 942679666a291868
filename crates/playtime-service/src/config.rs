//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// PIN digest key used when none is configured. Fine for local runs only.
const DEV_PIN_SECRET: &str = "playtime-dev-pin-secret";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/playtime").
    pub data_dir: String,

    /// Identity provider base URL serving the JWKS (default: `<http://auth:8080>`).
    pub auth_base_url: String,

    /// Expected JWT audience (default: "playtime").
    pub auth_audience: String,

    /// API key for the ingestion pipeline's metadata writes.
    pub service_api_key: Option<String>,

    /// HMAC key for parent PIN digests.
    pub pin_secret: String,

    /// Accept `test-token:<uuid>` bearer tokens (debug builds or the
    /// `test-auth` feature only).
    pub allow_test_tokens: bool,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// How recently a playing story must have heartbeated to count as active.
    pub active_window_seconds: u64,

    /// Path of the "time's up" screen blocked players are sent to.
    pub times_up_path: String,
}

/// Secrets file structure.
#[derive(Debug, Default, Deserialize)]
struct PlaytimeSecrets {
    #[serde(default)]
    service_api_key: Option<String>,
    #[serde(default)]
    pin_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the secrets file.
    #[must_use]
    pub fn from_env() -> Self {
        let secrets = load_secrets();
        let defaults = Self::default();

        let pin_secret = secrets
            .pin_secret
            .or_else(|| std::env::var("PIN_SECRET").ok())
            .unwrap_or_else(|| {
                tracing::warn!("PIN_SECRET not set - using the development PIN secret");
                defaults.pin_secret.clone()
            });

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            auth_base_url: std::env::var("AUTH_BASE_URL").unwrap_or(defaults.auth_base_url),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or(defaults.auth_audience),
            service_api_key: secrets
                .service_api_key
                .or_else(|| std::env::var("SERVICE_API_KEY").ok()),
            pin_secret,
            allow_test_tokens: std::env::var("ALLOW_TEST_TOKENS")
                .is_ok_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            active_window_seconds: env_parse("ACTIVE_WINDOW_SECONDS")
                .unwrap_or(defaults.active_window_seconds),
            times_up_path: std::env::var("TIMES_UP_PATH").unwrap_or(defaults.times_up_path),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Load secrets from the first secrets file found, if any.
fn load_secrets() -> PlaytimeSecrets {
    let secret_paths = [
        ".secrets/playtime.json",
        "playtime/.secrets/playtime.json",
        "../.secrets/playtime.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<PlaytimeSecrets>(path) {
            tracing::info!(path = %path, "Loaded secrets from file");
            return secrets;
        }
    }

    tracing::debug!("Secrets file not found, using environment variables");
    PlaytimeSecrets::default()
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/playtime".into(),
            auth_base_url: "http://auth:8080".into(),
            auth_audience: "playtime".into(),
            service_api_key: None,
            pin_secret: DEV_PIN_SECRET.into(),
            allow_test_tokens: false,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            active_window_seconds: 30,
            times_up_path: "/times-up".into(),
        }
    }
}
