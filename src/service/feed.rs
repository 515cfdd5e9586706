//! Feed service
//!
//! Assembles the home feed: the user's own posts plus posts by
//! everyone the user follows, reverse-chronological. This is the only
//! component that fans out across the social graph and the content
//! store for a single request.

use std::sync::Arc;

use crate::data::{Database, PostWithAuthor};
use crate::error::AppError;

/// Feed entry: a post annotated with author summary and engagement counts
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub post: PostWithAuthor,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// Assembled feed page
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub has_more: bool,
}

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    /// Create new feed service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the home feed for a user
    ///
    /// # Arguments
    /// * `user_id` - Requesting user
    /// * `page` - 1-based page number
    /// * `limit` - Page size
    ///
    /// Engagement counts are fetched per post after the page query, so
    /// they are eventually-consistent relative to the post list: a like
    /// recorded between the two reads is invisible until reload.
    /// `has_more` is the `rows == limit` approximation, not a true
    /// next-page existence check.
    pub async fn home_feed(
        &self,
        user_id: &str,
        page: i64,
        limit: i64,
    ) -> Result<FeedPage, AppError> {
        let offset = (page - 1) * limit;
        let posts = self.db.feed_posts(user_id, limit, offset).await?;
        let has_more = posts.len() as i64 == limit;

        let mut items = Vec::with_capacity(posts.len());
        for post in posts {
            let likes_count = self.db.count_likes_for_post(&post.id).await?;
            let comments_count = self.db.count_comments_for_post(&post.id).await?;
            items.push(FeedItem {
                post,
                likes_count,
                comments_count,
            });
        }

        Ok(FeedPage { items, has_more })
    }
}
