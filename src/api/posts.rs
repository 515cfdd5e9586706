//! Post endpoints
//!
//! Post CRUD, the home feed, and keyword search.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde::Deserialize;

use super::dto::{FeedPostResponse, Pagination, PostResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, Post, PostUpdate};
use crate::error::AppError;
use crate::metrics::{
    DB_QUERIES_TOTAL, DB_QUERY_DURATION_SECONDS, HTTP_REQUEST_DURATION_SECONDS,
    HTTP_REQUESTS_TOTAL, POSTS_TOTAL,
};
use crate::service::FeedService;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Offset pagination query parameters
///
/// `page` is 1-based; out-of-range values are clamped rather than
/// rejected.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self, limit: i64) -> i64 {
        (self.page() - 1) * limit
    }
}

/// Post creation request
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: Option<bool>,
}

/// Post update request (partial)
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn normalize_content(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|content| !content.is_empty())
        .map(ToOwned::to_owned)
}

fn validate_media_url(raw: Option<&str>, errors: &mut Vec<String>) -> Option<String> {
    let candidate = raw.map(str::trim).filter(|u| !u.is_empty())?;
    match url::Url::parse(candidate) {
        Ok(_) => Some(candidate.to_string()),
        Err(_) => {
            errors.push("media_url must be a valid URL".to_string());
            None
        }
    }
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/posts"])
        .start_timer();

    let mut errors = Vec::new();
    let content = normalize_content(req.content.as_deref());
    let media_url = validate_media_url(req.media_url.as_deref(), &mut errors);

    if content.is_none() && media_url.is_none() && errors.is_empty() {
        errors.push("content or media_url is required".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let now = Utc::now();
    let post = Post {
        id: EntityId::new().0,
        author_id: user.id.clone(),
        content,
        media_url,
        comments_enabled: req.comments_enabled.unwrap_or(true),
        deleted: false,
        created_at: now,
        updated_at: now,
    };

    let db_timer = DB_QUERY_DURATION_SECONDS
        .with_label_values(&["INSERT", "posts"])
        .start_timer();
    state.db.insert_post(&post).await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["INSERT", "posts"])
        .inc();
    db_timer.observe_duration();

    let created = state
        .db
        .get_post(&post.id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("created post not found")))?;

    POSTS_TOTAL.inc();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/posts", "201"])
        .inc();
    tracing::info!(post_id = %post.id, author = %user.id, "Post created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Post created",
            "post": PostResponse::from(&created),
        })),
    ))
}

/// GET /api/posts/feed
pub async fn feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/posts/feed"])
        .start_timer();

    let page = params.page();
    let limit = params.limit_or(DEFAULT_PAGE_SIZE);

    let feed_service = FeedService::new(state.db.clone());
    let db_timer = DB_QUERY_DURATION_SECONDS
        .with_label_values(&["SELECT", "posts"])
        .start_timer();
    let feed_page = feed_service.home_feed(&user.id, page, limit).await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["SELECT", "posts"])
        .inc();
    db_timer.observe_duration();

    let posts: Vec<FeedPostResponse> = feed_page
        .items
        .iter()
        .map(|item| FeedPostResponse {
            post: PostResponse::from(&item.post),
            likes_count: item.likes_count,
            comments_count: item.comments_count,
        })
        .collect();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/posts/feed", "200"])
        .inc();

    Ok(Json(serde_json::json!({
        "posts": posts,
        "pagination": Pagination {
            page,
            limit,
            has_more: feed_page.has_more,
        },
    })))
}

/// GET /api/posts/my
pub async fn my_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    list_author_posts(&state, &user.id, &params).await
}

/// GET /api/posts/user/:user_id
pub async fn user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    list_author_posts(&state, &user_id, &params).await
}

async fn list_author_posts(
    state: &AppState,
    author_id: &str,
    params: &PaginationParams,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = params.page();
    let limit = params.limit_or(DEFAULT_PAGE_SIZE);

    let posts = state
        .db
        .list_posts_by_author(author_id, limit, params.offset(limit))
        .await?;

    let has_more = posts.len() as i64 == limit;
    let posts: Vec<PostResponse> = posts.iter().map(PostResponse::from).collect();

    Ok(Json(serde_json::json!({
        "posts": posts,
        "pagination": Pagination { page, limit, has_more },
    })))
}

/// GET /api/posts/search?q=
pub async fn search_posts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let keyword = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::validation("q is required"))?;

    let pagination = PaginationParams {
        page: params.page,
        limit: params.limit,
    };
    let page = pagination.page();
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);

    let posts = state
        .db
        .search_posts(keyword, limit, pagination.offset(limit))
        .await?;

    let has_more = posts.len() as i64 == limit;
    let posts: Vec<PostResponse> = posts.iter().map(PostResponse::from).collect();

    Ok(Json(serde_json::json!({
        "posts": posts,
        "pagination": Pagination { page, limit, has_more },
    })))
}

/// GET /api/posts/:post_id
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let post = state
        .db
        .get_post(&post_id)
        .await?
        .filter(|post| !post.deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "post": PostResponse::from(&post),
    })))
}

/// PUT /api/posts/:post_id
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut errors = Vec::new();
    let update = PostUpdate {
        content: normalize_content(req.content.as_deref()),
        media_url: validate_media_url(req.media_url.as_deref(), &mut errors),
        comments_enabled: req.comments_enabled,
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    if update.is_empty() {
        return Err(AppError::validation("at least one field is required"));
    }

    // Wrong owner and missing id are indistinguishable on purpose
    let updated = state
        .db
        .update_post(&post_id, &user.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found or unauthorized".to_string()))?;

    tracing::info!(post_id = %post_id, author = %user.id, "Post updated");

    Ok(Json(serde_json::json!({
        "message": "Post updated",
        "post": PostResponse::from(&updated),
    })))
}

/// DELETE /api/posts/:post_id
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.db.soft_delete_post(&post_id, &user.id).await?;
    if !deleted {
        return Err(AppError::NotFound(
            "Post not found or unauthorized".to_string(),
        ));
    }

    tracing::info!(post_id = %post_id, author = %user.id, "Post deleted");

    Ok(Json(serde_json::json!({
        "message": "Post deleted",
    })))
}

/// Create posts router
pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/feed", get(feed))
        .route("/my", get(my_posts))
        .route("/search", get(search_posts))
        .route("/user/:user_id", get(user_posts))
        .route("/:post_id", get(get_post))
        .route("/:post_id", put(update_post))
        .route("/:post_id", delete(delete_post))
}
