//! Like endpoints
//!
//! Idempotent like/unlike and like listings.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use chrono::Utc;
use serde::Deserialize;

use super::dto::{LikeResponse, LikeWithUserResponse, LikedPostResponse, Pagination};
use super::posts::PaginationParams;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, Like};
use crate::error::AppError;

const DEFAULT_LIKES_PAGE_SIZE: i64 = 50;

/// Like creation request
#[derive(Debug, Deserialize)]
pub struct CreateLikeRequest {
    pub post_id: Option<String>,
}

/// POST /api/likes
///
/// Idempotent: a duplicate attempt reports "already liked" with 200
/// instead of an error. The storage-level uniqueness constraint makes
/// concurrent duplicates safe regardless of this handler's pre-check.
pub async fn like_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateLikeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post_id = req
        .post_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("post_id is required"))?;

    // Ensure the post exists and is not soft-deleted
    state
        .db
        .get_post(post_id)
        .await?
        .filter(|post| !post.deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let already_liked = state.db.has_liked(&user.id, post_id).await?;

    let like = Like {
        id: EntityId::new().0,
        user_id: user.id.clone(),
        post_id: post_id.to_string(),
        created_at: Utc::now(),
    };
    // The unique (user, post) constraint makes a concurrent duplicate
    // land as a no-op even when the pre-check missed it.
    let inserted = !already_liked && state.db.insert_like(&like).await?;
    let likes_count = state.db.count_likes_for_post(post_id).await?;

    if !inserted {
        return Ok((
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Post already liked",
                "likesCount": likes_count,
            })),
        ));
    }

    tracing::info!(user = %user.id, post = %post_id, "Post liked");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Post liked",
            "like": LikeResponse::from(&like),
            "likesCount": likes_count,
        })),
    ))
}

/// DELETE /api/likes/:post_id
pub async fn unlike_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = state.db.delete_like(&user.id, &post_id).await?;
    if !removed {
        return Err(AppError::NotFound("Like not found".to_string()));
    }

    let likes_count = state.db.count_likes_for_post(&post_id).await?;

    tracing::info!(user = %user.id, post = %post_id, "Post unliked");

    Ok(Json(serde_json::json!({
        "message": "Post unliked",
        "likesCount": likes_count,
    })))
}

/// GET /api/likes/post/:post_id
pub async fn post_likes(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = params.page();
    let limit = params.limit_or(DEFAULT_LIKES_PAGE_SIZE);

    let likes = state
        .db
        .list_likes_for_post(&post_id, limit, params.offset(limit))
        .await?;
    let likes_count = state.db.count_likes_for_post(&post_id).await?;

    let has_more = likes.len() as i64 == limit;
    let likes: Vec<LikeWithUserResponse> = likes.iter().map(LikeWithUserResponse::from).collect();

    Ok(Json(serde_json::json!({
        "likes": likes,
        "likesCount": likes_count,
        "pagination": Pagination { page, limit, has_more },
    })))
}

/// GET /api/likes/user/:user_id
pub async fn user_likes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = params.page();
    let limit = params.limit_or(DEFAULT_LIKES_PAGE_SIZE);

    let posts = state
        .db
        .list_liked_posts(&user_id, limit, params.offset(limit))
        .await?;

    let has_more = posts.len() as i64 == limit;
    let posts: Vec<LikedPostResponse> = posts.iter().map(LikedPostResponse::from).collect();

    Ok(Json(serde_json::json!({
        "posts": posts,
        "pagination": Pagination { page, limit, has_more },
    })))
}

/// Create likes router
pub fn likes_router() -> Router<AppState> {
    Router::new()
        .route("/", post(like_post))
        .route("/:post_id", delete(unlike_post))
        .route("/post/:post_id", get(post_likes))
        .route("/user/:user_id", get(user_likes))
}
