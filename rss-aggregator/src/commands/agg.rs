use super::{required_arg, CommandContext, PublicCommand};
use crate::config::{format_duration, parse_duration};
use crate::fetcher::Fetcher;
use crate::scheduler::AggregationScheduler;
use crate::shutdown;
use crate::types::{AggregatorError, Result};
use async_trait::async_trait;
use interfaces::{FollowStore, Store};
use std::sync::Arc;
use tracing::{error, info};

/// `agg <interval>`: run the aggregation loop until Ctrl-C.
pub struct Agg;

#[async_trait]
impl PublicCommand for Agg {
    async fn run(&self, ctx: &mut CommandContext, args: &[String]) -> Result<()> {
        let interval = parse_duration(required_arg(args, 0, "agg <interval>")?)?;

        if ctx.store.list_feeds().await?.is_empty() {
            return Err(AggregatorError::Usage(
                "no feeds configured; add one with `gator addfeed <name> <url>`".to_string(),
            ));
        }

        let fetcher = Arc::new(Fetcher::new(ctx.fetch_config.clone())?);
        let scheduler = AggregationScheduler::new(ctx.store.clone().feed_store(), fetcher);

        let (trigger, shutdown) = shutdown::channel();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // Keep the trigger alive; dropping it would stop the loop.
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal");
            trigger.trigger();
        });

        println!("Collecting feeds every {}", format_duration(interval));
        scheduler.run(interval, shutdown).await
    }
}
