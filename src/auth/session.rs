//! Session tokens
//!
//! HMAC-signed bearer tokens. No server-side session storage and no
//! revocation list: a token is valid for its full lifetime, and the only
//! way to end a session early is client-side token deletion.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Claims embedded in a signed token
///
/// Binds a request to a user identity for the token's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user's id
    pub user_id: String,
    /// Authenticated user's username
    pub username: String,
    /// When the token was issued
    pub issued_at: DateTime<Utc>,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Build claims for a login session
    pub fn for_user(user_id: &str, username: &str, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            issued_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed bearer token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `claims` - Claims to encode
/// * `secret` - HMAC secret key
///
/// # Returns
/// Signed token string
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize claims to JSON
    let payload =
        serde_json::to_string(claims).map_err(|e| crate::error::AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a bearer token
///
/// # Arguments
/// * `token` - Token string to verify
/// * `secret` - HMAC secret key
///
/// # Returns
/// Decoded claims if valid
///
/// # Errors
/// Returns error if the signature is invalid, the token is malformed,
/// or the token is expired
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let unauthorized = || crate::error::AppError::Unauthorized("Invalid or expired token".to_string());

    // 1. Split token into payload and signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(unauthorized());
    }

    let payload_b64 = parts[0];
    let signature_b64 = parts[1];

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| unauthorized())?;

    mac.verify_slice(&expected_signature).map_err(|_| unauthorized())?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| unauthorized())?;

    let payload_str = String::from_utf8(payload_bytes).map_err(|_| unauthorized())?;

    let claims: Claims = serde_json::from_str(&payload_str).map_err(|_| unauthorized())?;

    // 4. Check expiry
    if claims.is_expired() {
        return Err(unauthorized());
    }

    Ok(claims)
}

/// Extract the token from an Authorization header value
///
/// Accepts either "Bearer <token>" or a raw token string.
pub fn strip_bearer(header_value: &str) -> &str {
    header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
        .trim()
}
