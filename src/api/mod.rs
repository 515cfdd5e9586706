//! API layer
//!
//! HTTP handlers for:
//! - Auth (register/login/profile)
//! - Users (follow graph, search)
//! - Posts, comments, likes
//! - Metrics (Prometheus)

mod auth;
mod comments;
mod dto;
mod likes;
pub mod metrics;
mod posts;
mod users;

pub use dto::*;

pub use auth::auth_router;
pub use comments::comments_router;
pub use likes::likes_router;
pub use metrics::metrics_router;
pub use posts::posts_router;
pub use users::users_router;
