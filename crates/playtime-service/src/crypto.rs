//! Parent PIN digests.
//!
//! PINs are never stored. The store keeps an HMAC-SHA256 of the user id and
//! PIN under the service's PIN secret, and verification compares digests in
//! constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use playtime_core::UserId;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the key is rejected, which HMAC-SHA256
/// never does for any key length.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, ApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Internal(format!("HMAC key rejected: {e}")))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Digest a user's PIN for storage.
///
/// # Errors
///
/// See [`hmac_sha256_hex`].
pub fn hash_pin(secret: &str, user_id: &UserId, pin: &str) -> Result<String, ApiError> {
    hmac_sha256_hex(secret, &format!("{user_id}:{pin}"))
}

/// Check a PIN against a stored digest.
///
/// # Errors
///
/// See [`hmac_sha256_hex`].
pub fn verify_pin(
    secret: &str,
    user_id: &UserId,
    pin: &str,
    stored_digest: &str,
) -> Result<bool, ApiError> {
    Ok(constant_time_eq(
        &hash_pin(secret, user_id, pin)?,
        stored_digest,
    ))
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
