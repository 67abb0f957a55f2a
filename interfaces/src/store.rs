use crate::defs::{Feed, FeedFollow, FeedWithOwner, FollowedFeed, Post, PostView, User};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence the aggregation engine depends on.
///
/// Each operation is atomic on its own; callers never need a transaction
/// spanning several of them.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// The feed whose `last_fetched_at` is oldest, never-fetched feeds first.
    async fn next_due(&self) -> StoreResult<Option<Feed>>;

    /// Stamp the feed with the current time. The stamp never moves backwards.
    async fn mark_fetched(&self, feed_id: Uuid) -> StoreResult<()>;

    /// Insert the post unless one with the same `(feed_id, url)` exists.
    /// A duplicate is reported as `Ok(false)`, not as an error.
    async fn insert_if_new(&self, post: &Post) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, name: &str) -> StoreResult<User>;

    async fn get_user(&self, name: &str) -> StoreResult<User>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Remove every user; feeds, follows and posts go with them.
    async fn reset(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait FollowStore: Send + Sync {
    async fn create_feed(&self, name: &str, url: &str, user_id: Uuid) -> StoreResult<Feed>;

    async fn list_feeds(&self) -> StoreResult<Vec<FeedWithOwner>>;

    async fn get_feed_by_url(&self, url: &str) -> StoreResult<Feed>;

    async fn create_follow(&self, user_id: Uuid, feed_id: Uuid) -> StoreResult<FeedFollow>;

    async fn list_followed_feeds(&self, user_id: Uuid) -> StoreResult<Vec<FollowedFeed>>;

    /// Returns whether an edge was removed.
    async fn delete_follow(&self, user_id: Uuid, url: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Newest posts (by publish time) from the feeds the user follows.
    async fn posts_for_user(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<PostView>>;
}

/// Everything the command-line front end needs from one backend.
pub trait Store: FeedStore + UserStore + FollowStore + PostStore {
    /// The same backend, seen only through the engine's interface.
    fn feed_store(self: Arc<Self>) -> Arc<dyn FeedStore>;
}

impl<T> Store for T
where
    T: FeedStore + UserStore + FollowStore + PostStore + 'static,
{
    fn feed_store(self: Arc<Self>) -> Arc<dyn FeedStore> {
        self
    }
}
