//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user
///
/// The password hash never leaves the data layer; API responses are
/// built from explicit DTOs that omit it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// User profile joined with follow aggregates
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub following_count: i64,
    pub followers_count: i64,
}

/// Partial profile update
///
/// Each field maps to a named column; unset fields are preserved
/// via COALESCE in the UPDATE statement.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none()
    }
}

// =============================================================================
// Follow edges
// =============================================================================

/// Directed follow relationship (follower -> followee)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowEdge {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

/// User summary joined with the follow edge timestamp
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowedUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
    /// When the follow edge was created
    pub created_at: DateTime<Utc>,
}

/// Aggregate follow counts
///
/// The two numbers come from independent queries; no snapshot
/// consistency between them is guaranteed.
#[derive(Debug, Clone, Copy)]
pub struct FollowCounts {
    pub following: i64,
    pub followers: i64,
}

// =============================================================================
// Post
// =============================================================================

/// A post
///
/// Carries text and/or a media URL; at least one is required at
/// creation. Soft-deleted rows stay in storage with `deleted` set.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post joined with author summary
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithAuthor {
    pub id: String,
    pub author_id: String,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub display_name: String,
}

/// Partial post update
///
/// Explicit optional fields mapped to named columns at compile time;
/// unset fields are preserved via COALESCE.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: Option<bool>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.media_url.is_none() && self.comments_enabled.is_none()
    }
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a post, optionally threaded under a parent comment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment joined with author summary
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: String,
    pub author_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub display_name: String,
}

/// Comment joined with the commented post's text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithPost {
    pub id: String,
    pub author_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub post_content: Option<String>,
}

// =============================================================================
// Like
// =============================================================================

/// Like relationship, unique per (user, post)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

/// Like joined with liker summary
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LikeWithUser {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub display_name: String,
}

/// Post a user liked, joined with the like timestamp
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LikedPost {
    pub id: String,
    pub author_id: String,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub liked_at: DateTime<Utc>,
}
