#![allow(dead_code)]

use async_trait::async_trait;
use interfaces::{Feed, FeedStore, FollowStore, Post, StoreError, StoreResult, UserStore};
use rss_aggregator::{FeedDocument, FeedParser, FeedSource, MemoryStore, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const VALID_PUB_DATE: &str = "Mon, 02 Jan 2006 15:04:05 -0700";

/// An RSS 2.0 document with one `<item>` per `(title, link, pubDate)`.
pub fn rss_xml(items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, pub_date)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <description>About {title} &lt;b&gt;bold&lt;/b&gt;</description>\
                 <pubDate>{pub_date}</pubDate></item>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>Test Feed</title><link>https://example.com/</link><description>Fixtures</description>
{items}
</channel></rss>"#
    )
}

pub fn rss_document(items: &[(&str, &str, &str)]) -> FeedDocument {
    FeedParser::parse(rss_xml(items).as_bytes()).expect("fixture parses")
}

/// A store with one user owning one feed per URL, in order.
pub async fn store_with_feeds(urls: &[&str]) -> (Arc<MemoryStore>, Vec<Feed>) {
    let store = Arc::new(MemoryStore::new());
    let user = store.create_user("kahya").await.unwrap();

    let mut feeds = Vec::new();
    for (i, url) in urls.iter().enumerate() {
        let feed = store
            .create_feed(&format!("feed-{}", i), url, user.id)
            .await
            .unwrap();
        feeds.push(feed);
    }
    (store, feeds)
}

/// Serves the same document for every URL and counts calls.
pub struct StaticSource {
    document: FeedDocument,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(document: FeedDocument) -> Self {
        Self {
            document,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch(&self, _url: &str) -> Result<FeedDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.document.clone())
    }
}

/// Never answers.
pub struct HangingSource;

#[async_trait]
impl FeedSource for HangingSource {
    async fn fetch(&self, _url: &str) -> Result<FeedDocument> {
        std::future::pending().await
    }
}

/// Delegates to a `MemoryStore` but refuses to store posts with one URL.
pub struct FailingInsertStore {
    pub inner: Arc<MemoryStore>,
    pub fail_url: String,
}

#[async_trait]
impl FeedStore for FailingInsertStore {
    async fn next_due(&self) -> StoreResult<Option<Feed>> {
        self.inner.next_due().await
    }

    async fn mark_fetched(&self, feed_id: Uuid) -> StoreResult<()> {
        self.inner.mark_fetched(feed_id).await
    }

    async fn insert_if_new(&self, post: &Post) -> StoreResult<bool> {
        if post.url == self.fail_url {
            return Err(StoreError::Database("connection reset".into()));
        }
        self.inner.insert_if_new(post).await
    }
}
