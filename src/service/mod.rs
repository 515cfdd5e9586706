//! Service layer
//!
//! Business logic between the HTTP handlers and the data layer.

mod account;
mod feed;

pub use account::{AccountService, NewAccount};
pub use feed::{FeedItem, FeedPage, FeedService};
