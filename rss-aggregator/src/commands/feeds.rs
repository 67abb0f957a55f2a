use super::{required_arg, CommandContext, PublicCommand, UserCommand};
use crate::types::{AggregatorError, Result, User};
use async_trait::async_trait;
use interfaces::{FollowStore, StoreError};
use tracing::info;
use url::Url;

/// Only absolute http(s) URLs with a host can be fetched.
pub(crate) fn validate_feed_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host().is_none() {
        return Err(AggregatorError::Usage(format!(
            "feed URL must be an absolute http(s) URL: {}",
            url
        )));
    }
    Ok(())
}

pub struct AddFeed;

#[async_trait]
impl UserCommand for AddFeed {
    async fn run(&self, ctx: &mut CommandContext, user: User, args: &[String]) -> Result<()> {
        let name = required_arg(args, 0, "addfeed <name> <url>")?;
        let url = required_arg(args, 1, "addfeed <name> <url>")?;
        validate_feed_url(url)?;

        let feed = ctx.store.create_feed(name, url, user.id).await?;
        ctx.store.create_follow(user.id, feed.id).await?;
        info!("User {} added and followed feed {}", user.name, feed.id);

        println!("Feed added:");
        println!("  ID:   {}", feed.id);
        println!("  Name: {}", feed.name);
        println!("  URL:  {}", feed.url);
        Ok(())
    }
}

pub struct Feeds;

#[async_trait]
impl PublicCommand for Feeds {
    async fn run(&self, ctx: &mut CommandContext, _args: &[String]) -> Result<()> {
        let feeds = ctx.store.list_feeds().await?;
        if feeds.is_empty() {
            println!("No feeds yet; add one with `gator addfeed <name> <url>`");
        }

        for feed in feeds {
            println!("* {} ({}) added by {}", feed.name, feed.url, feed.owner_name);
        }
        Ok(())
    }
}

pub struct Follow;

#[async_trait]
impl UserCommand for Follow {
    async fn run(&self, ctx: &mut CommandContext, user: User, args: &[String]) -> Result<()> {
        let url = required_arg(args, 0, "follow <url>")?;

        let feed = ctx.store.get_feed_by_url(url).await?;
        ctx.store.create_follow(user.id, feed.id).await?;

        println!("{} now follows {}", user.name, feed.name);
        Ok(())
    }
}

pub struct Following;

#[async_trait]
impl UserCommand for Following {
    async fn run(&self, ctx: &mut CommandContext, user: User, _args: &[String]) -> Result<()> {
        for followed in ctx.store.list_followed_feeds(user.id).await? {
            println!("* {}", followed.feed_name);
        }
        Ok(())
    }
}

pub struct Unfollow;

#[async_trait]
impl UserCommand for Unfollow {
    async fn run(&self, ctx: &mut CommandContext, user: User, args: &[String]) -> Result<()> {
        let url = required_arg(args, 0, "unfollow <url>")?;

        if !ctx.store.delete_follow(user.id, url).await? {
            return Err(StoreError::NotFound {
                entity: "follow",
                key: url.to_string(),
            }
            .into());
        }

        println!("{} unfollowed {}", user.name, url);
        Ok(())
    }
}
