use super::{CommandContext, UserCommand};
use crate::sanitize::sanitize_opt;
use crate::types::{AggregatorError, Result, User};
use async_trait::async_trait;
use interfaces::PostStore;

const DEFAULT_LIMIT: i64 = 2;

pub struct Browse;

fn parse_limit(args: &[String]) -> Result<i64> {
    match args.first() {
        None => Ok(DEFAULT_LIMIT),
        Some(raw) => match raw.parse::<i64>() {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => Err(AggregatorError::Usage(format!(
                "browse limit must be a positive number, got {:?}",
                raw
            ))),
        },
    }
}

#[async_trait]
impl UserCommand for Browse {
    async fn run(&self, ctx: &mut CommandContext, user: User, args: &[String]) -> Result<()> {
        let limit = parse_limit(args)?;
        let posts = ctx.store.posts_for_user(user.id, limit).await?;

        if posts.is_empty() {
            println!("No posts yet; run `gator agg <interval>` to collect some");
        }

        for post in posts {
            // Stored text is already escaped; escaping is idempotent.
            let title = sanitize_opt(post.title.as_deref()).unwrap_or_default();
            let description = sanitize_opt(post.description.as_deref()).unwrap_or_default();
            let published = post
                .published_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string());

            println!("{} [{}]", title, post.feed_name);
            println!("{}", post.url);
            println!("Published: {}", published);
            println!("{}", description);
            println!();
        }
        Ok(())
    }
}
