use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use interfaces::defs::{Feed, FeedFollow, FeedWithOwner, FollowedFeed, Post, PostView, User};
use interfaces::{FeedStore, FollowStore, PostStore, StoreError, StoreResult, UserStore};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    feeds: Vec<Feed>,
    follows: Vec<FeedFollow>,
    posts: Vec<Post>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    fn user_name(&self, user_id: Uuid) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    /// `now`, nudged forward so that no two stamps are equal.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// Store kept entirely in process memory. Same semantics as the Postgres
/// store, including cascades and the `(feed_id, url)` uniqueness of posts.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn feed(&self, feed_id: Uuid) -> Option<Feed> {
        let tables = self.tables.read().await;
        tables.feeds.iter().find(|f| f.id == feed_id).cloned()
    }

    pub async fn posts_for_feed(&self, feed_id: Uuid) -> Vec<Post> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .filter(|p| p.feed_id == feed_id)
            .cloned()
            .collect()
    }

    pub async fn post_count(&self) -> usize {
        self.tables.read().await.posts.len()
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn next_due(&self) -> StoreResult<Option<Feed>> {
        let tables = self.tables.read().await;
        // `None` orders before `Some`, and ties keep insertion order.
        Ok(tables
            .feeds
            .iter()
            .min_by_key(|f| f.last_fetched_at)
            .cloned())
    }

    async fn mark_fetched(&self, feed_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stamp = tables.next_stamp();

        let feed = tables
            .feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "feed",
                key: feed_id.to_string(),
            })?;

        feed.last_fetched_at = Some(feed.last_fetched_at.map_or(stamp, |prev| prev.max(stamp)));
        feed.updated_at = stamp;
        Ok(())
    }

    async fn insert_if_new(&self, post: &Post) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if !tables.feeds.iter().any(|f| f.id == post.feed_id) {
            return Err(StoreError::NotFound {
                entity: "feed",
                key: post.feed_id.to_string(),
            });
        }

        if tables
            .posts
            .iter()
            .any(|p| p.feed_id == post.feed_id && p.url == post.url)
        {
            return Ok(false);
        }

        tables.posts.push(post.clone());
        Ok(true)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, name: &str) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.name == name) {
            return Err(StoreError::AlreadyExists {
                entity: "user",
                key: name.to_string(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, name: &str) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.name == name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                key: name.to_string(),
            })
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn reset(&self) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.users.clear();
        tables.feeds.clear();
        tables.follows.clear();
        tables.posts.clear();
        Ok(())
    }
}

#[async_trait]
impl FollowStore for MemoryStore {
    async fn create_feed(&self, name: &str, url: &str, user_id: Uuid) -> StoreResult<Feed> {
        let mut tables = self.tables.write().await;

        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::NotFound {
                entity: "user",
                key: user_id.to_string(),
            });
        }
        if tables.feeds.iter().any(|f| f.url == url) {
            return Err(StoreError::AlreadyExists {
                entity: "feed",
                key: url.to_string(),
            });
        }

        let now = Utc::now();
        let feed = Feed {
            id: Uuid::new_v4(),
            name: name.to_string(),
            url: url.to_string(),
            user_id,
            last_fetched_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.feeds.push(feed.clone());
        Ok(feed)
    }

    async fn list_feeds(&self) -> StoreResult<Vec<FeedWithOwner>> {
        let tables = self.tables.read().await;
        Ok(tables
            .feeds
            .iter()
            .map(|f| FeedWithOwner {
                id: f.id,
                name: f.name.clone(),
                url: f.url.clone(),
                owner_name: tables.user_name(f.user_id),
            })
            .collect())
    }

    async fn get_feed_by_url(&self, url: &str) -> StoreResult<Feed> {
        let tables = self.tables.read().await;
        tables
            .feeds
            .iter()
            .find(|f| f.url == url)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "feed",
                key: url.to_string(),
            })
    }

    async fn create_follow(&self, user_id: Uuid, feed_id: Uuid) -> StoreResult<FeedFollow> {
        let mut tables = self.tables.write().await;

        if !tables.feeds.iter().any(|f| f.id == feed_id) {
            return Err(StoreError::NotFound {
                entity: "feed",
                key: feed_id.to_string(),
            });
        }
        if tables
            .follows
            .iter()
            .any(|ff| ff.user_id == user_id && ff.feed_id == feed_id)
        {
            return Err(StoreError::AlreadyExists {
                entity: "follow",
                key: format!("{}/{}", user_id, feed_id),
            });
        }

        let now = Utc::now();
        let follow = FeedFollow {
            id: Uuid::new_v4(),
            user_id,
            feed_id,
            created_at: now,
            updated_at: now,
        };
        tables.follows.push(follow.clone());
        Ok(follow)
    }

    async fn list_followed_feeds(&self, user_id: Uuid) -> StoreResult<Vec<FollowedFeed>> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|ff| ff.user_id == user_id)
            .filter_map(|ff| tables.feeds.iter().find(|f| f.id == ff.feed_id))
            .map(|f| FollowedFeed {
                feed_id: f.id,
                feed_name: f.name.clone(),
                feed_url: f.url.clone(),
                user_name: tables.user_name(user_id),
            })
            .collect())
    }

    async fn delete_follow(&self, user_id: Uuid, url: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(feed_id) = tables.feeds.iter().find(|f| f.url == url).map(|f| f.id) else {
            return Ok(false);
        };

        let before = tables.follows.len();
        tables
            .follows
            .retain(|ff| !(ff.user_id == user_id && ff.feed_id == feed_id));
        Ok(tables.follows.len() < before)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn posts_for_user(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<PostView>> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| {
                tables
                    .follows
                    .iter()
                    .any(|ff| ff.user_id == user_id && ff.feed_id == p.feed_id)
            })
            .collect();
        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(posts
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|p| PostView {
                id: p.id,
                feed_name: tables
                    .feeds
                    .iter()
                    .find(|f| f.id == p.feed_id)
                    .map(|f| f.name.clone())
                    .unwrap_or_default(),
                url: p.url.clone(),
                title: p.title.clone(),
                description: p.description.clone(),
                published_at: p.published_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use interfaces::{FeedStore, FollowStore, Post, PostStore, StoreError, UserStore};

    #[tokio::test]
    async fn next_due_prefers_never_fetched_feeds() {
        let store = MemoryStore::new();
        let user = store.create_user("kahya").await.unwrap();
        let a = store.create_feed("a", "https://a.example/rss", user.id).await.unwrap();
        let b = store.create_feed("b", "https://b.example/rss", user.id).await.unwrap();

        store.mark_fetched(a.id).await.unwrap();
        assert_eq!(store.next_due().await.unwrap().unwrap().id, b.id);

        store.mark_fetched(b.id).await.unwrap();
        assert_eq!(store.next_due().await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn mark_fetched_is_monotonic() {
        let store = MemoryStore::new();
        let user = store.create_user("kahya").await.unwrap();
        let feed = store.create_feed("a", "https://a.example/rss", user.id).await.unwrap();

        store.mark_fetched(feed.id).await.unwrap();
        let first = store.feed(feed.id).await.unwrap().last_fetched_at.unwrap();
        store.mark_fetched(feed.id).await.unwrap();
        let second = store.feed(feed.id).await.unwrap().last_fetched_at.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn reset_cascades() {
        let store = MemoryStore::new();
        let user = store.create_user("kahya").await.unwrap();
        let feed = store.create_feed("a", "https://a.example/rss", user.id).await.unwrap();
        store.create_follow(user.id, feed.id).await.unwrap();
        let post = Post::new(feed.id, "https://a.example/1".into(), None, None, None);
        assert!(store.insert_if_new(&post).await.unwrap());

        store.reset().await.unwrap();

        assert!(store.list_users().await.unwrap().is_empty());
        assert!(store.next_due().await.unwrap().is_none());
        assert_eq!(store.post_count().await, 0);
        assert!(store.posts_for_user(user.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_follow_is_rejected() {
        let store = MemoryStore::new();
        let user = store.create_user("kahya").await.unwrap();
        let feed = store.create_feed("a", "https://a.example/rss", user.id).await.unwrap();

        store.create_follow(user.id, feed.id).await.unwrap();
        let again = store.create_follow(user.id, feed.id).await;
        assert!(matches!(again, Err(StoreError::AlreadyExists { .. })));
    }
}
