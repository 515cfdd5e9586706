//! User endpoints
//!
//! Follow graph operations and user search.

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{delete, get, post},
};
use chrono::Utc;
use serde::Deserialize;

use super::dto::{FollowedUserResponse, UserProfileResponse, UserResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, FollowEdge};
use crate::error::AppError;

const USER_SEARCH_LIMIT: i64 = 10;

/// Follow/unfollow request
#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    #[serde(rename = "followeeId")]
    pub followee_id: Option<String>,
}

/// User search request
#[derive(Debug, Deserialize)]
pub struct UserSearchRequest {
    pub query: Option<String>,
}

fn require_followee_id(req: &FollowRequest) -> Result<&str, AppError> {
    req.followee_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("followeeId is required"))
}

/// POST /api/users/follow
pub async fn follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<FollowRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let followee_id = require_followee_id(&req)?;

    if followee_id == user.id {
        return Err(AppError::validation("Cannot follow yourself"));
    }

    if state.db.get_user_by_id(followee_id).await?.is_none() {
        return Err(AppError::NotFound("Followee not found".to_string()));
    }

    // Duplicate follow is a no-op, not an error
    let edge = FollowEdge {
        id: EntityId::new().0,
        follower_id: user.id.clone(),
        followee_id: followee_id.to_string(),
        created_at: Utc::now(),
    };
    state.db.insert_follow_edge(&edge).await?;

    tracing::info!(follower = %user.id, followee = %followee_id, "User followed");

    Ok(Json(serde_json::json!({
        "message": "User followed successfully",
    })))
}

/// DELETE /api/users/unfollow
pub async fn unfollow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<FollowRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let followee_id = require_followee_id(&req)?;

    let removed = state.db.delete_follow_edge(&user.id, followee_id).await?;
    if !removed {
        return Err(AppError::NotFound(
            "Follow relationship not found".to_string(),
        ));
    }

    tracing::info!(follower = %user.id, followee = %followee_id, "User unfollowed");

    Ok(Json(serde_json::json!({
        "message": "User unfollowed successfully",
    })))
}

/// GET /api/users/following
pub async fn following(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FollowedUserResponse>>, AppError> {
    let following = state.db.list_following(&user.id).await?;

    Ok(Json(
        following.iter().map(FollowedUserResponse::from).collect(),
    ))
}

/// GET /api/users/followers
pub async fn followers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FollowedUserResponse>>, AppError> {
    let followers = state.db.list_followers(&user.id).await?;

    Ok(Json(
        followers.iter().map(FollowedUserResponse::from).collect(),
    ))
}

/// GET /api/users/stats
///
/// The two counts come from independent queries; no transactional
/// snapshot consistency between them.
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let counts = state.db.follow_counts(&user.id).await?;

    Ok(Json(serde_json::json!({
        "followingCount": counts.following,
        "followersCount": counts.followers,
    })))
}

/// GET /api/users/profile
///
/// Profile with follow aggregates in a single read.
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let profile = state
        .db
        .get_user_profile(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "user": UserProfileResponse::from(&profile),
    })))
}

/// POST /api/users/search
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UserSearchRequest>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let query = req
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::validation("query is required"))?;

    let users = state
        .db
        .search_users_by_name(query, &user.id, USER_SEARCH_LIMIT, 0)
        .await?;

    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// Create users router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/follow", post(follow))
        .route("/unfollow", delete(unfollow))
        .route("/following", get(following))
        .route("/followers", get(followers))
        .route("/stats", get(stats))
        .route("/profile", get(profile))
        .route("/search", post(search))
}
