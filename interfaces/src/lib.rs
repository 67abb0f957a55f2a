pub mod defs;
pub mod store;

pub use defs::{Feed, FeedFollow, FeedWithOwner, FollowedFeed, Post, PostView, User};
pub use store::{FeedStore, FollowStore, PostStore, Store, StoreError, StoreResult, UserStore};
