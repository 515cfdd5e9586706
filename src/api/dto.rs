//! API response shapes
//!
//! Wire representations of the domain models. The frontend speaks the
//! original field names (`user_id`, `full_name`, `hasMore`), so the
//! conversions map internal naming onto that surface and never expose
//! the password hash.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{
    CommentWithAuthor, CommentWithPost, FollowedUser, Like, LikeWithUser, LikedPost,
    PostWithAuthor, User, UserProfile,
};

/// User as returned to clients
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.display_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// User profile with follow aggregates
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "followingCount")]
    pub following_count: i64,
    #[serde(rename = "followersCount")]
    pub followers_count: i64,
}

impl From<&UserProfile> for UserProfileResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            username: profile.username.clone(),
            email: profile.email.clone(),
            full_name: profile.display_name.clone(),
            created_at: profile.created_at,
            following_count: profile.following_count,
            followers_count: profile.followers_count,
        }
    }
}

/// Follow listing entry: user summary plus edge timestamp
#[derive(Debug, Serialize)]
pub struct FollowedUserResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&FollowedUser> for FollowedUserResponse {
    fn from(entry: &FollowedUser) -> Self {
        Self {
            id: entry.id.clone(),
            username: entry.username.clone(),
            full_name: entry.display_name.clone(),
            created_at: entry.created_at,
        }
    }
}

/// Post with author summary
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub user_id: String,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub full_name: String,
}

impl From<&PostWithAuthor> for PostResponse {
    fn from(post: &PostWithAuthor) -> Self {
        Self {
            id: post.id.clone(),
            user_id: post.author_id.clone(),
            content: post.content.clone(),
            media_url: post.media_url.clone(),
            comments_enabled: post.comments_enabled,
            created_at: post.created_at,
            updated_at: post.updated_at,
            username: post.username.clone(),
            full_name: post.display_name.clone(),
        }
    }
}

/// Feed entry: post annotated with engagement counts
#[derive(Debug, Serialize)]
pub struct FeedPostResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    #[serde(rename = "likesCount")]
    pub likes_count: i64,
    #[serde(rename = "commentsCount")]
    pub comments_count: i64,
}

/// Comment with author summary
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub full_name: String,
}

impl From<&CommentWithAuthor> for CommentResponse {
    fn from(comment: &CommentWithAuthor) -> Self {
        Self {
            id: comment.id.clone(),
            user_id: comment.author_id.clone(),
            post_id: comment.post_id.clone(),
            parent_comment_id: comment.parent_comment_id.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            username: comment.username.clone(),
            full_name: comment.display_name.clone(),
        }
    }
}

/// Comment with the commented post's text
#[derive(Debug, Serialize)]
pub struct CommentWithPostResponse {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub post_content: Option<String>,
}

impl From<&CommentWithPost> for CommentWithPostResponse {
    fn from(comment: &CommentWithPost) -> Self {
        Self {
            id: comment.id.clone(),
            user_id: comment.author_id.clone(),
            post_id: comment.post_id.clone(),
            parent_comment_id: comment.parent_comment_id.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            post_content: comment.post_content.clone(),
        }
    }
}

/// Newly created like
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Like> for LikeResponse {
    fn from(like: &Like) -> Self {
        Self {
            id: like.id.clone(),
            user_id: like.user_id.clone(),
            post_id: like.post_id.clone(),
            created_at: like.created_at,
        }
    }
}

/// Like listing entry with liker summary
#[derive(Debug, Serialize)]
pub struct LikeWithUserResponse {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub full_name: String,
}

impl From<&LikeWithUser> for LikeWithUserResponse {
    fn from(like: &LikeWithUser) -> Self {
        Self {
            id: like.id.clone(),
            user_id: like.user_id.clone(),
            post_id: like.post_id.clone(),
            created_at: like.created_at,
            username: like.username.clone(),
            full_name: like.display_name.clone(),
        }
    }
}

/// Post a user liked
#[derive(Debug, Serialize)]
pub struct LikedPostResponse {
    pub id: String,
    pub user_id: String,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub comments_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub liked_at: DateTime<Utc>,
}

impl From<&LikedPost> for LikedPostResponse {
    fn from(post: &LikedPost) -> Self {
        Self {
            id: post.id.clone(),
            user_id: post.author_id.clone(),
            content: post.content.clone(),
            media_url: post.media_url.clone(),
            comments_enabled: post.comments_enabled,
            created_at: post.created_at,
            updated_at: post.updated_at,
            liked_at: post.liked_at,
        }
    }
}

/// Offset pagination metadata
///
/// `hasMore` is the rows == limit approximation; the last page reports
/// a spurious true when the total is an exact multiple of the limit.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}
