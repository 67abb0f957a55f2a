//! The aggregation loop.
//!
//! One feed per tick, picked by freshness: the feed with the oldest
//! `last_fetched_at` (never-fetched feeds first) is stamped, fetched and
//! ingested. Stamping before the fetch means a slow or failing feed still
//! moves to the back of the line, so N feeds are all visited within N ticks.

use crate::fetcher::FeedSource;
use crate::ingestor::PostIngestor;
use crate::sanitize::sanitize;
use crate::shutdown::Shutdown;
use crate::types::{AggregatorError, IngestReport, Result};
use interfaces::{FeedStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What a single cycle ended with.
#[derive(Debug)]
pub enum CycleOutcome {
    /// No feeds in the store; nothing to do.
    NoFeeds,
    Ingested { feed_id: Uuid, report: IngestReport },
    FetchFailed { feed_id: Uuid, error: AggregatorError },
    StoreFailed(StoreError),
    /// Shutdown fired while the fetch was in flight.
    Cancelled { feed_id: Uuid },
}

pub struct AggregationScheduler {
    store: Arc<dyn FeedStore>,
    source: Arc<dyn FeedSource>,
    ingestor: PostIngestor,
}

impl AggregationScheduler {
    pub fn new(store: Arc<dyn FeedStore>, source: Arc<dyn FeedSource>) -> Self {
        let ingestor = PostIngestor::new(store.clone());
        Self {
            store,
            source,
            ingestor,
        }
    }

    /// Run cycles every `interval` until `shutdown` fires. Cycles never
    /// overlap; a cycle longer than the interval delays the next tick.
    pub async fn run(&self, interval: Duration, mut shutdown: Shutdown) -> Result<()> {
        if interval.is_zero() {
            return Err(AggregatorError::InvalidDuration(
                "interval must be greater than zero".to_string(),
            ));
        }

        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Aggregation loop started (interval {:?})", interval);

        loop {
            if shutdown.is_triggered() {
                break;
            }

            tokio::select! {
                _ = timer.tick() => {}
                _ = shutdown.wait() => break,
            }

            match self.run_cycle(&mut shutdown).await {
                CycleOutcome::NoFeeds => debug!("No feeds to fetch"),
                CycleOutcome::Ingested { feed_id, report } => debug!(
                    "Cycle for feed {} done: {} items seen",
                    feed_id,
                    report.total()
                ),
                CycleOutcome::FetchFailed { feed_id, error } => {
                    warn!("Fetch failed for feed {}: {}", feed_id, error)
                }
                CycleOutcome::StoreFailed(e) => error!("Store failure during cycle: {}", e),
                CycleOutcome::Cancelled { feed_id } => {
                    info!("Fetch of feed {} cancelled by shutdown", feed_id);
                    break;
                }
            }
        }

        info!("Aggregation loop stopped");
        Ok(())
    }

    /// One select → stamp → fetch → ingest pass.
    pub async fn run_cycle(&self, shutdown: &mut Shutdown) -> CycleOutcome {
        let feed = match self.store.next_due().await {
            Ok(Some(feed)) => feed,
            Ok(None) => return CycleOutcome::NoFeeds,
            Err(e) => return CycleOutcome::StoreFailed(e),
        };

        if let Err(e) = self.store.mark_fetched(feed.id).await {
            return CycleOutcome::StoreFailed(e);
        }

        info!("Fetching feed {} ({})", feed.name, feed.url);

        let fetched = tokio::select! {
            result = self.source.fetch(&feed.url) => result,
            _ = shutdown.wait() => return CycleOutcome::Cancelled { feed_id: feed.id },
        };

        let document = match fetched {
            Ok(document) => document,
            Err(error) => {
                return CycleOutcome::FetchFailed {
                    feed_id: feed.id,
                    error,
                }
            }
        };

        let channel = document.channel;
        info!(
            "Feed {}: channel {:?} at {}, {} items",
            feed.name,
            sanitize(&channel.title),
            sanitize(&channel.link),
            channel.items.len()
        );

        let report = self.ingestor.ingest(feed.id, channel.items).await;
        CycleOutcome::Ingested {
            feed_id: feed.id,
            report,
        }
    }
}
