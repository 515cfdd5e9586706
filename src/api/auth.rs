//! Auth endpoints
//!
//! Registration, login, and the current-user profile.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use serde::Deserialize;

use super::dto::UserResponse;
use crate::AppState;
use crate::auth::{Claims, CurrentUser, issue_token};
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL, USERS_TOTAL};
use crate::service::{AccountService, NewAccount};

const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 30;
const MIN_PASSWORD_CHARS: usize = 6;
const MIN_FULL_NAME_CHARS: usize = 3;
const MAX_FULL_NAME_CHARS: usize = 100;

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile update request (partial)
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

fn build_account_service(state: &AppState) -> AccountService {
    AccountService::new(state.db.clone())
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn validate_registration(req: &RegisterRequest) -> Result<NewAccount, AppError> {
    let mut errors = Vec::new();

    let username = req.username.as_deref().unwrap_or("").trim();
    let chars = username.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&chars) {
        errors.push(format!(
            "username must be between {} and {} characters",
            MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
        ));
    }

    let email = req.email.as_deref().unwrap_or("").trim();
    if !looks_like_email(email) {
        errors.push("email must be a valid email address".to_string());
    }

    let password = req.password.as_deref().unwrap_or("");
    if password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        ));
    }

    let full_name = req.full_name.as_deref().unwrap_or("").trim();
    let name_chars = full_name.chars().count();
    if !(MIN_FULL_NAME_CHARS..=MAX_FULL_NAME_CHARS).contains(&name_chars) {
        errors.push(format!(
            "full_name must be between {} and {} characters",
            MIN_FULL_NAME_CHARS, MAX_FULL_NAME_CHARS
        ));
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(NewAccount {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        display_name: full_name.to_string(),
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/auth/register"])
        .start_timer();

    let input = validate_registration(&req)?;

    let account_service = build_account_service(&state);
    let user = account_service.register(input).await?;

    let claims = Claims::for_user(&user.id, &user.username, state.config.auth.token_max_age);
    let token = issue_token(&claims, &state.config.auth.token_secret)?;

    USERS_TOTAL.inc();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/auth/register", "201"])
        .inc();

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User registered successfully",
            "user": UserResponse::from(&user),
            "token": token,
        })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut errors = Vec::new();
    let email = req.email.as_deref().unwrap_or("").trim();
    if !looks_like_email(email) {
        errors.push("email must be a valid email address".to_string());
    }
    let password = req.password.as_deref().unwrap_or("");
    if password.is_empty() {
        errors.push("password is required".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let account_service = build_account_service(&state);
    let user = account_service.verify_credentials(email, password).await?;

    let claims = Claims::for_user(&user.id, &user.username, state.config.auth.token_max_age);
    let token = issue_token(&claims, &state.config.auth.token_secret)?;

    tracing::debug!(username = %user.username, "Login successful");

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "token": token,
    })))
}

/// GET /api/auth/profile
pub async fn profile(
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "user": UserResponse::from(&user),
    })))
}

/// PUT /api/auth/profile
///
/// Identity is immutable apart from display name and email.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut errors = Vec::new();

    let display_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned);
    if let Some(name) = &display_name {
        let chars = name.chars().count();
        if !(MIN_FULL_NAME_CHARS..=MAX_FULL_NAME_CHARS).contains(&chars) {
            errors.push(format!(
                "full_name must be between {} and {} characters",
                MIN_FULL_NAME_CHARS, MAX_FULL_NAME_CHARS
            ));
        }
    }

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(ToOwned::to_owned);
    if let Some(email) = &email {
        if !looks_like_email(email) {
            errors.push("email must be a valid email address".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let update = crate::data::ProfileUpdate {
        display_name,
        email,
    };
    if update.is_empty() {
        return Err(AppError::validation("at least one field is required"));
    }

    let updated = state
        .db
        .update_user_profile(&user.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user = %user.id, "Profile updated");

    Ok(Json(serde_json::json!({
        "message": "Profile updated",
        "user": UserResponse::from(&updated),
    })))
}

/// Create auth router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/profile", put(update_profile))
}
