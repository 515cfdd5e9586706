//! Comment endpoints
//!
//! Threaded comments on posts.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde::Deserialize;

use super::dto::{CommentResponse, CommentWithPostResponse, Pagination};
use super::posts::PaginationParams;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Comment, EntityId};
use crate::error::AppError;

const DEFAULT_COMMENTS_PAGE_SIZE: i64 = 20;

/// Comment creation request
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: Option<String>,
    pub content: Option<String>,
    pub parent_comment_id: Option<String>,
}

/// Comment update request
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

fn require_content(raw: Option<&str>) -> Result<String, AppError> {
    raw.map(str::trim)
        .filter(|content| !content.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::validation("content is required"))
}

/// POST /api/comments
///
/// The insert is guarded on the parent post's state in a single
/// conditional statement, so a post soft-deleted or closed between the
/// pre-read and the insert cannot gain a comment. The pre-read exists
/// only to tell 404 from 403.
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post_id = req
        .post_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("post_id is required"))?;
    let content = require_content(req.content.as_deref())?;

    let check_post_state = || async {
        let post = state
            .db
            .get_post(post_id)
            .await?
            .filter(|post| !post.deleted)
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        if !post.comments_enabled {
            return Err(AppError::Forbidden(
                "Comments are disabled for this post".to_string(),
            ));
        }
        Ok::<(), AppError>(())
    };
    check_post_state().await?;

    let now = Utc::now();
    let comment = Comment {
        id: EntityId::new().0,
        author_id: user.id.clone(),
        post_id: post_id.to_string(),
        parent_comment_id: req
            .parent_comment_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned),
        content,
        deleted: false,
        created_at: now,
        updated_at: now,
    };

    if !state.db.insert_comment_guarded(&comment).await? {
        // The post changed between the pre-read and the insert;
        // re-read to report the right failure.
        check_post_state().await?;
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let comments_count = state.db.count_comments_for_post(post_id).await?;
    let created = state
        .db
        .get_comment(&comment.id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("created comment not found")))?;

    tracing::info!(user = %user.id, post = %post_id, "Comment created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Comment created",
            "comment": CommentResponse::from(&created),
            "commentsCount": comments_count,
        })),
    ))
}

/// PUT /api/comments/:comment_id
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let content = require_content(req.content.as_deref())?;

    let updated = state
        .db
        .update_comment(&comment_id, &user.id, &content)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found or unauthorized".to_string()))?;

    tracing::info!(user = %user.id, comment = %comment_id, "Comment updated");

    Ok(Json(serde_json::json!({
        "message": "Comment updated",
        "comment": CommentResponse::from(&updated),
    })))
}

/// DELETE /api/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.db.soft_delete_comment(&comment_id, &user.id).await?;
    if !deleted {
        return Err(AppError::NotFound(
            "Comment not found or unauthorized".to_string(),
        ));
    }

    tracing::info!(user = %user.id, comment = %comment_id, "Comment deleted");

    Ok(Json(serde_json::json!({
        "message": "Comment deleted",
    })))
}

/// GET /api/comments/post/:post_id
///
/// Chronological thread order (oldest first).
pub async fn post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = params.page();
    let limit = params.limit_or(DEFAULT_COMMENTS_PAGE_SIZE);

    let comments = state
        .db
        .list_comments_by_post(&post_id, limit, params.offset(limit))
        .await?;
    let comments_count = state.db.count_comments_for_post(&post_id).await?;

    let has_more = comments.len() as i64 == limit;
    let comments: Vec<CommentResponse> = comments.iter().map(CommentResponse::from).collect();

    Ok(Json(serde_json::json!({
        "comments": comments,
        "commentsCount": comments_count,
        "pagination": Pagination { page, limit, has_more },
    })))
}

/// GET /api/comments/user/:user_id
pub async fn user_comments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = params.page();
    let limit = params.limit_or(DEFAULT_COMMENTS_PAGE_SIZE);

    let comments = state
        .db
        .list_comments_by_author(&user_id, limit, params.offset(limit))
        .await?;

    let has_more = comments.len() as i64 == limit;
    let comments: Vec<CommentWithPostResponse> =
        comments.iter().map(CommentWithPostResponse::from).collect();

    Ok(Json(serde_json::json!({
        "comments": comments,
        "pagination": Pagination { page, limit, has_more },
    })))
}

/// Create comments router
pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_comment))
        .route("/:comment_id", put(update_comment))
        .route("/:comment_id", delete(delete_comment))
        .route("/post/:post_id", get(post_comments))
        .route("/user/:user_id", get(user_comments))
}
