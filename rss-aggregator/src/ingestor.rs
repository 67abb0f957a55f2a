use crate::sanitize::sanitize;
use crate::types::{AggregatorError, FeedItem, IngestReport, Post, Result, PUB_DATE_FORMAT};
use chrono::{DateTime, Utc};
use interfaces::FeedStore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Parse a `pubDate` in the one format feeds are expected to use.
pub fn parse_pub_date(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(raw.trim(), PUB_DATE_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| AggregatorError::DateParse {
            raw: raw.to_string(),
            source,
        })
}

/// Turns fetched items into posts. Every item stands on its own: a bad date,
/// a duplicate or a store failure only affects that item.
pub struct PostIngestor {
    store: Arc<dyn FeedStore>,
}

impl PostIngestor {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }

    pub async fn ingest(&self, feed_id: Uuid, items: Vec<FeedItem>) -> IngestReport {
        let mut report = IngestReport::default();

        for item in items {
            let post = match Self::to_post(feed_id, item) {
                Ok(post) => post,
                Err(e) => {
                    warn!("Skipping item from feed {}: {}", feed_id, e);
                    report.skipped += 1;
                    continue;
                }
            };

            match self.store.insert_if_new(&post).await {
                Ok(true) => report.inserted += 1,
                Ok(false) => {
                    debug!("Post already ingested: {}", post.url);
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!("Failed to store post {} for feed {}: {}", post.url, feed_id, e);
                    report.skipped += 1;
                }
            }
        }

        info!(
            "Feed {}: {} new, {} already ingested, {} skipped",
            feed_id, report.inserted, report.duplicates, report.skipped
        );
        report
    }

    fn to_post(feed_id: Uuid, item: FeedItem) -> Result<Post> {
        if item.link.is_empty() {
            return Err(AggregatorError::Parse(format!(
                "item {:?} has no link",
                item.title
            )));
        }

        let published_at = parse_pub_date(&item.published_at_raw)?;

        Ok(Post::new(
            feed_id,
            item.link,
            Some(sanitize(&item.title)),
            Some(sanitize(&item.description)),
            Some(published_at),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::parse_pub_date;
    use crate::types::AggregatorError;
    use chrono::{TimeZone, Utc};

    #[test]
    fn it_parses_rfc1123_with_numeric_zone() {
        let parsed = parse_pub_date("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap());
    }

    #[test]
    fn it_rejects_other_formats() {
        for raw in ["not-a-date", "", "2006-01-02T15:04:05Z", "Mon, 02 Jan 2006 15:04:05 MST"] {
            assert!(
                matches!(parse_pub_date(raw), Err(AggregatorError::DateParse { .. })),
                "accepted {raw:?}"
            );
        }
    }
}
