use interfaces::StoreError;
use serde::{Deserialize, Serialize};

pub use interfaces::defs::{Feed, FeedFollow, FeedWithOwner, FollowedFeed, Post, PostView, User};

/// `User-Agent` sent with every feed request.
pub const USER_AGENT: &str = "gator";

/// RFC 1123 with a numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// One `channel/item` of an RSS document. Lives only between fetch and ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at_raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub channel: FeedChannel,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

/// Counts produced by one ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates + self.skipped
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid pubDate {raw:?}: {source}")]
    DateParse {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    Usage(String),

    #[error("No user is logged in; run `gator login <name>` first")]
    NotLoggedIn,
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
