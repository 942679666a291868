//! Authentication extractors.
//!
//! - `AuthUser` - the child profile, via identity-provider JWT
//! - `ServiceAuth` - the ingestion pipeline, via API key

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use playtime_core::UserId;

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Constants
// ============================================================================

/// How long to cache JWKS keys before refreshing.
const JWKS_CACHE_DURATION: Duration = Duration::from_secs(3600);

/// Timeout for JWKS fetch requests.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// An authenticated user extracted from an identity-provider JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// The raw subject claim from the JWT.
    pub subject: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        // Never compiled into release builds unless `test-auth` is enabled.
        #[cfg(any(test, debug_assertions, feature = "test-auth"))]
        if state.config.allow_test_tokens {
            if let Some(user_id_str) = token.strip_prefix("test-token:") {
                let user_id = user_id_str
                    .parse::<UserId>()
                    .map_err(|_| ApiError::Unauthorized)?;

                return Ok(AuthUser {
                    user_id,
                    subject: user_id_str.to_string(),
                });
            }
        }

        let claims = validate_jwt(token, state).await?;

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            subject: claims.sub,
        })
    }
}

/// Service authentication via API key.
///
/// Used by the ingestion pipeline to register story and tag metadata.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// The service name or identifier.
    pub service_name: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected_key = state
            .config
            .service_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if !constant_time_eq(api_key, expected_key) {
            return Err(ApiError::Unauthorized);
        }

        let service_name = parts
            .headers
            .get("x-service-name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(ServiceAuth { service_name })
    }
}

/// JWT claims structure for identity-provider tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Audience (can be string or array).
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    pub iat: i64,
}

// ============================================================================
// JWKS Client and JWT Validation
// ============================================================================

/// JWKS (JSON Web Key Set) response structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    /// List of JWK keys.
    pub keys: Vec<Jwk>,
}

/// Single JSON Web Key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: String,
    /// Key ID.
    pub kid: Option<String>,
    /// RSA public key modulus (base64url encoded).
    pub n: Option<String>,
    /// RSA public key exponent (base64url encoded).
    pub e: Option<String>,
}

#[derive(Default)]
struct KeySet {
    by_kid: HashMap<String, DecodingKey>,
    /// Used for tokens without a kid.
    fallback: Option<DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeySet {
    fn from_jwks(jwks: &Jwks) -> Self {
        let mut set = Self {
            fetched_at: Some(Instant::now()),
            ..Self::default()
        };
        for jwk in &jwks.keys {
            let Some(key) = jwk_to_decoding_key(jwk) else {
                continue;
            };
            if let Some(kid) = &jwk.kid {
                set.by_kid.insert(kid.clone(), key.clone());
            }
            set.fallback.get_or_insert(key);
        }
        set
    }

    fn is_fresh(&self) -> bool {
        self.fetched_at
            .is_some_and(|at| at.elapsed() < JWKS_CACHE_DURATION)
    }

    fn lookup(&self, kid: Option<&str>) -> Option<DecodingKey> {
        match kid {
            Some(kid) => self.by_kid.get(kid).cloned(),
            None => self.fallback.clone(),
        }
    }
}

/// Fetches and caches the identity provider's signing keys.
///
/// A fresh cache answers known key ids directly; an unknown kid triggers a
/// refetch so rotated keys are picked up.
pub struct JwksClient {
    http: reqwest::Client,
    jwks_url: String,
    keys: RwLock<KeySet>,
}

impl JwksClient {
    /// Create a client for `{auth_base_url}/.well-known/jwks.json`.
    #[must_use]
    pub fn new(auth_base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            jwks_url: format!(
                "{}/.well-known/jwks.json",
                auth_base_url.trim_end_matches('/')
            ),
            keys: RwLock::new(KeySet::default()),
        }
    }

    /// Key for `kid`, from cache or a fresh fetch.
    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, ApiError> {
        {
            let keys = self.keys.read().await;
            if keys.is_fresh() {
                if let Some(key) = keys.lookup(kid) {
                    return Ok(key);
                }
            }
        }

        let fetched = KeySet::from_jwks(&self.fetch().await?);
        let key = fetched.lookup(kid);
        *self.keys.write().await = fetched;

        key.ok_or_else(|| {
            tracing::debug!(kid = ?kid, "No signing key for token");
            ApiError::Unauthorized
        })
    }

    async fn fetch(&self) -> Result<Jwks, ApiError> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self.http.get(&self.jwks_url).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %self.jwks_url, "Failed to fetch JWKS");
            ApiError::ExternalService("Failed to fetch authentication keys".into())
        })?;

        if !response.status().is_success() {
            tracing::error!(
                status = %response.status(),
                url = %self.jwks_url,
                "JWKS fetch returned non-success status"
            );
            return Err(ApiError::ExternalService(
                "Failed to fetch authentication keys".into(),
            ));
        }

        let jwks: Jwks = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JWKS response");
            ApiError::ExternalService("Failed to parse authentication keys".into())
        })?;

        tracing::info!(keys_count = jwks.keys.len(), "JWKS fetched");
        Ok(jwks)
    }
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient")
            .field("jwks_url", &self.jwks_url)
            .finish_non_exhaustive()
    }
}

/// Validate a JWT against the provider's keys, audience and issuer.
async fn validate_jwt(token: &str, state: &AppState) -> Result<JwtClaims, ApiError> {
    let header = decode_header(token).map_err(|e| {
        tracing::debug!(error = %e, "Failed to decode JWT header");
        ApiError::Unauthorized
    })?;

    let decoding_key = state.jwks.decoding_key(header.kid.as_deref()).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&state.config.auth_audience]);
    validation.set_issuer(&[&state.config.auth_base_url]);

    decode::<JwtClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized
        })
}

/// Convert a JWK to a `DecodingKey`. Only RSA keys are supported.
fn jwk_to_decoding_key(jwk: &Jwk) -> Option<DecodingKey> {
    if jwk.kty != "RSA" {
        tracing::debug!(kty = %jwk.kty, "Skipping non-RSA JWK");
        return None;
    }

    let n = jwk.n.as_ref()?;
    let e = jwk.e.as_ref()?;

    DecodingKey::from_rsa_components(n, e).ok()
}
