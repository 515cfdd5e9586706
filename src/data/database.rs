//! SQLite database operations
//!
//! All database access goes through this module. The handle is
//! explicitly constructed and injected via `AppState`; there is no
//! ambient global pool.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::time::Duration;

use super::models::*;
use crate::config::DatabaseConfig;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist and runs pending
    /// migrations. Bootstrap connection attempts are bounded and backed
    /// off exponentially; once the pool exists, no query is retried.
    ///
    /// # Errors
    /// Returns error if all connection attempts or the migration fail
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true);

        let mut attempt = 1u32;
        let mut backoff = Duration::from_secs(1);
        let pool = loop {
            let result = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => break pool,
                Err(error) if attempt < config.connect_attempts => {
                    tracing::warn!(
                        %error,
                        attempt,
                        max_attempts = config.connect_attempts,
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        };

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// A username or email collision surfaces as a validation error
    /// rather than a storage failure.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, display_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::validation("username or email is already taken"),
            ),
            Err(error) => Err(error.into()),
        }
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by email (credential lookup at login)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user profile with follow aggregates
    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT u.id, u.username, u.email, u.display_name, u.created_at,
                   (SELECT COUNT(*) FROM follows WHERE follower_id = u.id) AS following_count,
                   (SELECT COUNT(*) FROM follows WHERE followee_id = u.id) AS followers_count
            FROM users u
            WHERE u.id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Update user profile fields
    ///
    /// Unset fields are preserved via COALESCE. Returns the updated
    /// user, or None if the id matched no row. An email collision
    /// surfaces as a validation error.
    pub async fn update_user_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = COALESCE(?, display_name),
                email = COALESCE(?, email)
            WHERE id = ?
            "#,
        )
        .bind(&update.display_name)
        .bind(&update.email)
        .bind(user_id)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(AppError::validation("email is already taken"));
            }
            Err(error) => return Err(error.into()),
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_user_by_id(user_id).await
    }

    /// Search users by display name, excluding the requesting user
    ///
    /// Case-insensitive substring match, paginated.
    pub async fn search_users_by_name(
        &self,
        name: &str,
        exclude_user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE display_name LIKE ? AND id != ?
            ORDER BY display_name
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(format!("%{}%", name))
        .bind(exclude_user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // =========================================================================
    // Follow edges
    // =========================================================================

    /// Insert a follow edge, idempotent on duplicates
    ///
    /// The (follower, followee) pair is unique at the storage level;
    /// concurrent duplicate attempts are safe by construction.
    ///
    /// # Returns
    /// true if a new edge was inserted, false if it already existed
    pub async fn insert_follow_edge(&self, edge: &FollowEdge) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (id, follower_id, followee_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&edge.id)
        .bind(&edge.follower_id)
        .bind(&edge.followee_id)
        .bind(edge.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a follow edge
    ///
    /// # Returns
    /// true if an edge was removed
    pub async fn delete_follow_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List users the given user follows
    pub async fn list_following(&self, user_id: &str) -> Result<Vec<FollowedUser>, AppError> {
        let following = sqlx::query_as::<_, FollowedUser>(
            r#"
            SELECT u.id, u.username, u.display_name, f.created_at
            FROM follows f
            JOIN users u ON f.followee_id = u.id
            WHERE f.follower_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(following)
    }

    /// List users following the given user
    pub async fn list_followers(&self, user_id: &str) -> Result<Vec<FollowedUser>, AppError> {
        let followers = sqlx::query_as::<_, FollowedUser>(
            r#"
            SELECT u.id, u.username, u.display_name, f.created_at
            FROM follows f
            JOIN users u ON f.follower_id = u.id
            WHERE f.followee_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(followers)
    }

    /// Follow counts as two independent aggregate queries
    pub async fn follow_counts(&self, user_id: &str) -> Result<FollowCounts, AppError> {
        let following: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let followers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(FollowCounts {
            following,
            followers,
        })
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, author_id, content, media_url, comments_enabled,
                deleted, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.content)
        .bind(&post.media_url)
        .bind(post.comments_enabled)
        .bind(post.deleted)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get post by ID with author summary
    ///
    /// Soft-deleted rows are returned as well; callers apply the
    /// deleted-filter at the read that matters.
    pub async fn get_post(&self, id: &str) -> Result<Option<PostWithAuthor>, AppError> {
        let post = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.author_id, p.content, p.media_url, p.comments_enabled,
                   p.deleted, p.created_at, p.updated_at, u.username, u.display_name
            FROM posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// List posts by author, newest first, excluding soft-deleted
    pub async fn list_posts_by_author(
        &self,
        author_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, AppError> {
        let posts = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.author_id, p.content, p.media_url, p.comments_enabled,
                   p.deleted, p.created_at, p.updated_at, u.username, u.display_name
            FROM posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.author_id = ? AND p.deleted = 0
            ORDER BY p.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Feed query: posts by the user or anyone the user follows
    ///
    /// Excludes soft-deleted posts, reverse-chronological. Engagement
    /// counts are deliberately not joined here; callers fetch them
    /// per post afterwards.
    pub async fn feed_posts(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, AppError> {
        let posts = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.author_id, p.content, p.media_url, p.comments_enabled,
                   p.deleted, p.created_at, p.updated_at, u.username, u.display_name
            FROM posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.deleted = 0
              AND (
                p.author_id = ?
                OR p.author_id IN (
                  SELECT followee_id FROM follows WHERE follower_id = ?
                )
              )
            ORDER BY p.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Keyword search over post text, case-insensitive substring match
    pub async fn search_posts(
        &self,
        keyword: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, AppError> {
        let posts = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT p.id, p.author_id, p.content, p.media_url, p.comments_enabled,
                   p.deleted, p.created_at, p.updated_at, u.username, u.display_name
            FROM posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.deleted = 0 AND p.content LIKE ?
            ORDER BY p.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(format!("%{}%", keyword))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Update a post's fields, author-only
    ///
    /// The WHERE clause matches both the post id and the acting user's
    /// id; a mismatch (wrong owner or already deleted) affects zero
    /// rows and returns None.
    pub async fn update_post(
        &self,
        post_id: &str,
        author_id: &str,
        update: &PostUpdate,
    ) -> Result<Option<PostWithAuthor>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET content = COALESCE(?, content),
                media_url = COALESCE(?, media_url),
                comments_enabled = COALESCE(?, comments_enabled),
                updated_at = ?
            WHERE id = ? AND author_id = ? AND deleted = 0
            "#,
        )
        .bind(&update.content)
        .bind(&update.media_url)
        .bind(update.comments_enabled)
        .bind(Utc::now())
        .bind(post_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_post(post_id).await
    }

    /// Soft-delete a post, author-only
    ///
    /// # Returns
    /// true if a row matched (owner and not already deleted)
    pub async fn soft_delete_post(&self, post_id: &str, author_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE posts SET deleted = 1 WHERE id = ? AND author_id = ? AND deleted = 0",
        )
        .bind(post_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a comment, guarded on the parent post's state
    ///
    /// A single conditional INSERT..SELECT closes the race between the
    /// post-existence check and the insert: the row lands only if the
    /// post still exists, is not soft-deleted, and allows comments.
    ///
    /// # Returns
    /// true if the comment was inserted
    pub async fn insert_comment_guarded(&self, comment: &Comment) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (
                id, author_id, post_id, parent_comment_id, content,
                deleted, created_at, updated_at
            )
            SELECT ?, ?, ?, ?, ?, 0, ?, ?
            FROM posts
            WHERE id = ? AND deleted = 0 AND comments_enabled = 1
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.author_id)
        .bind(&comment.post_id)
        .bind(&comment.parent_comment_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .bind(&comment.post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get comment by ID with author summary, excluding soft-deleted
    pub async fn get_comment(&self, id: &str) -> Result<Option<CommentWithAuthor>, AppError> {
        let comment = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.author_id, c.post_id, c.parent_comment_id, c.content,
                   c.created_at, c.updated_at, u.username, u.display_name
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.id = ? AND c.deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Get raw comment row by ID, bypassing the deleted-filter
    pub async fn get_comment_row(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Update a comment's text, author-only
    ///
    /// Same ownership rule as posts: zero affected rows on mismatch.
    pub async fn update_comment(
        &self,
        comment_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<Option<CommentWithAuthor>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET content = ?, updated_at = ?
            WHERE id = ? AND author_id = ? AND deleted = 0
            "#,
        )
        .bind(content)
        .bind(Utc::now())
        .bind(comment_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_comment(comment_id).await
    }

    /// Soft-delete a comment, author-only
    pub async fn soft_delete_comment(
        &self,
        comment_id: &str,
        author_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE comments SET deleted = 1 WHERE id = ? AND author_id = ? AND deleted = 0",
        )
        .bind(comment_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List comments on a post in chronological thread order
    pub async fn list_comments_by_post(
        &self,
        post_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.author_id, c.post_id, c.parent_comment_id, c.content,
                   c.created_at, c.updated_at, u.username, u.display_name
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.post_id = ? AND c.deleted = 0
            ORDER BY c.created_at ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// List a user's comments, newest first, with the commented post's text
    pub async fn list_comments_by_author(
        &self,
        author_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentWithPost>, AppError> {
        let comments = sqlx::query_as::<_, CommentWithPost>(
            r#"
            SELECT c.id, c.author_id, c.post_id, c.parent_comment_id, c.content,
                   c.created_at, c.updated_at, p.content AS post_content
            FROM comments c
            JOIN posts p ON p.id = c.post_id
            WHERE c.author_id = ? AND c.deleted = 0
            ORDER BY c.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Count live comments on a post
    pub async fn count_comments_for_post(&self, post_id: &str) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ? AND deleted = 0")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Insert a like, idempotent on duplicates
    ///
    /// The (user, post) pair is unique at the storage level.
    ///
    /// # Returns
    /// true if a new like was inserted, false if it already existed
    pub async fn insert_like(&self, like: &Like) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (id, user_id, post_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&like.id)
        .bind(&like.user_id)
        .bind(&like.post_id)
        .bind(like.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a like
    ///
    /// # Returns
    /// true if a like was removed
    pub async fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List likes on a post, newest first, with liker summary
    pub async fn list_likes_for_post(
        &self,
        post_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LikeWithUser>, AppError> {
        let likes = sqlx::query_as::<_, LikeWithUser>(
            r#"
            SELECT l.id, l.user_id, l.post_id, l.created_at,
                   u.username, u.display_name
            FROM likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.post_id = ?
            ORDER BY l.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    /// List posts a user liked, newest like first
    pub async fn list_liked_posts(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LikedPost>, AppError> {
        let posts = sqlx::query_as::<_, LikedPost>(
            r#"
            SELECT p.id, p.author_id, p.content, p.media_url, p.comments_enabled,
                   p.created_at, p.updated_at, l.created_at AS liked_at
            FROM likes l
            JOIN posts p ON p.id = l.post_id
            WHERE l.user_id = ?
            ORDER BY l.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Check if a user has liked a post
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE user_id = ? AND post_id = ?")
                .bind(user_id)
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Count likes on a post
    pub async fn count_likes_for_post(&self, post_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
