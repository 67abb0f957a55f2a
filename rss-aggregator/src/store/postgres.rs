use crate::types::Result;
use async_trait::async_trait;
use chrono::Utc;
use interfaces::defs::{Feed, FeedFollow, FeedWithOwner, FollowedFeed, Post, PostView, User};
use interfaces::{FeedStore, FollowStore, PostStore, StoreError, StoreResult, UserStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

const FEED_COLUMNS: &str = "id, name, url, user_id, last_fetched_at, created_at, updated_at";

pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&db).await?;
        debug!("Database migrations applied");

        Ok(Self { db })
    }
}

fn database(e: sqlx::Error) -> StoreError {
    StoreError::Database(Box::new(e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl FeedStore for PgStore {
    async fn next_due(&self) -> StoreResult<Option<Feed>> {
        let query = format!(
            "SELECT {FEED_COLUMNS} FROM feeds \
             ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC, id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Feed>(&query)
            .fetch_optional(&self.db)
            .await
            .map_err(database)
    }

    async fn mark_fetched(&self, feed_id: Uuid) -> StoreResult<()> {
        let now = Utc::now();

        // GREATEST skips NULL, so a first stamp is just `now`.
        let result = sqlx::query(
            r#"
            UPDATE feeds
            SET last_fetched_at = GREATEST(last_fetched_at, $1), updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(now)
        .bind(feed_id)
        .execute(&self.db)
        .await
        .map_err(database)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "feed",
                key: feed_id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_if_new(&self, post: &Post) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, feed_id, url, title, description, published_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (feed_id, url) DO NOTHING
            "#,
        )
        .bind(post.id)
        .bind(post.feed_id)
        .bind(&post.url)
        .bind(&post.title)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.db)
        .await
        .map_err(database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, name: &str) -> StoreResult<User> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::AlreadyExists {
                    entity: "user",
                    key: name.to_string(),
                }
            } else {
                database(e)
            }
        })?;

        info!("Created user {} ({})", user.name, user.id);
        Ok(user)
    }

    async fn get_user(&self, name: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .map_err(database)?
        .ok_or_else(|| StoreError::NotFound {
            entity: "user",
            key: name.to_string(),
        })
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY created_at, name",
        )
        .fetch_all(&self.db)
        .await
        .map_err(database)
    }

    async fn reset(&self) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.db)
            .await
            .map_err(database)?;

        info!("Deleted {} users", result.rows_affected());
        Ok(())
    }
}

#[async_trait]
impl FollowStore for PgStore {
    async fn create_feed(&self, name: &str, url: &str, user_id: Uuid) -> StoreResult<Feed> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO feeds (id, name, url, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {FEED_COLUMNS}"
        );

        let feed = sqlx::query_as::<_, Feed>(&query)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(url)
            .bind(user_id)
            .bind(now)
            .bind(now)
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::AlreadyExists {
                        entity: "feed",
                        key: url.to_string(),
                    }
                } else {
                    database(e)
                }
            })?;

        info!("Added new feed: {} with ID: {}", feed.url, feed.id);
        Ok(feed)
    }

    async fn list_feeds(&self) -> StoreResult<Vec<FeedWithOwner>> {
        sqlx::query_as::<_, FeedWithOwner>(
            r#"
            SELECT f.id, f.name, f.url, u.name AS owner_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.created_at
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(database)
    }

    async fn get_feed_by_url(&self, url: &str) -> StoreResult<Feed> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = $1");
        sqlx::query_as::<_, Feed>(&query)
            .bind(url)
            .fetch_optional(&self.db)
            .await
            .map_err(database)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "feed",
                key: url.to_string(),
            })
    }

    async fn create_follow(&self, user_id: Uuid, feed_id: Uuid) -> StoreResult<FeedFollow> {
        let now = Utc::now();

        sqlx::query_as::<_, FeedFollow>(
            r#"
            INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, feed_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(feed_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::AlreadyExists {
                    entity: "follow",
                    key: format!("{}/{}", user_id, feed_id),
                }
            } else {
                database(e)
            }
        })
    }

    async fn list_followed_feeds(&self, user_id: Uuid) -> StoreResult<Vec<FollowedFeed>> {
        sqlx::query_as::<_, FollowedFeed>(
            r#"
            SELECT f.id AS feed_id, f.name AS feed_name, f.url AS feed_url, u.name AS user_name
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            JOIN users u ON u.id = ff.user_id
            WHERE ff.user_id = $1
            ORDER BY ff.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(database)
    }

    async fn delete_follow(&self, user_id: Uuid, url: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM feed_follows ff
            USING feeds f
            WHERE ff.feed_id = f.id AND ff.user_id = $1 AND f.url = $2
            "#,
        )
        .bind(user_id)
        .bind(url)
        .execute(&self.db)
        .await
        .map_err(database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn posts_for_user(&self, user_id: Uuid, limit: i64) -> StoreResult<Vec<PostView>> {
        sqlx::query_as::<_, PostView>(
            r#"
            SELECT p.id, f.name AS feed_name, p.url, p.title, p.description, p.published_at
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            JOIN feeds f ON f.id = p.feed_id
            WHERE ff.user_id = $1
            ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .map_err(database)
    }
}
