use crate::parser::FeedParser;
use crate::types::{AggregatorError, FeedDocument, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Where the scheduler gets feed documents from.
///
/// One call is one attempt; retrying is the caller's business. Dropping the
/// returned future cancels the request.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeedDocument>;
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| AggregatorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn fetch_body(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url)?;
        let network = |source| AggregatorError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(parsed).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(network)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl FeedSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<FeedDocument> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let body = self.fetch_body(url).await?;
        let document = FeedParser::parse(&body)?;

        info!(
            "Fetched feed {} ({} bytes, {} items) in {}ms",
            url,
            body.len(),
            document.channel.items.len(),
            start_time.elapsed().as_millis()
        );
        Ok(document)
    }
}
