//! Authentication gate
//!
//! Protects routes that require authentication.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use super::session::{Claims, strip_bearer, verify_token};
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(strip_bearer)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
}

/// Verify the token and resolve it to a live user record.
///
/// A token referencing a user that no longer exists is rejected the
/// same way as a bad signature or expiry: uniform 401.
async fn authenticate_token(token: &str, state: &AppState) -> Result<User, AppError> {
    let claims: Claims = verify_token(token, &state.config.auth.token_secret)?;

    state
        .db
        .get_user_by_id(&claims.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
}

/// Extractor for the current authenticated user
///
/// Use in handlers to require authentication.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract current user from the Authorization header
    ///
    /// Any failure (missing token, bad signature, expiry, user gone)
    /// is a uniform 401 so the client treats it as "session ended".
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let app_state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;
        let user = authenticate_token(&token, &app_state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}
