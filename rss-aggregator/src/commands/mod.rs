//! Command registry for the `gator` binary.
//!
//! Each command name maps to a handler that either runs for anyone or needs
//! the logged-in user, in which case the registry resolves that user before
//! calling it.

mod agg;
mod browse;
mod feeds;
mod users;

use crate::config::ConfigFile;
use crate::types::{AggregatorError, FetchConfig, Result, User};
use async_trait::async_trait;
use interfaces::{Store, UserStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub use agg::Agg;
pub use browse::Browse;
pub use feeds::{AddFeed, Feeds, Follow, Following, Unfollow};
pub use users::{Login, Register, Reset, Users};

/// Everything a handler may touch. Passed explicitly; nothing is global.
pub struct CommandContext {
    pub store: Arc<dyn Store>,
    pub config: ConfigFile,
    pub fetch_config: FetchConfig,
}

impl CommandContext {
    pub fn new(store: Arc<dyn Store>, config: ConfigFile, fetch_config: FetchConfig) -> Self {
        Self {
            store,
            config,
            fetch_config,
        }
    }

    pub async fn current_user(&self) -> Result<User> {
        let name = self.config.current_user().ok_or(AggregatorError::NotLoggedIn)?;
        Ok(self.store.get_user(name).await?)
    }
}

#[async_trait]
pub trait PublicCommand: Send + Sync {
    async fn run(&self, ctx: &mut CommandContext, args: &[String]) -> Result<()>;
}

#[async_trait]
pub trait UserCommand: Send + Sync {
    async fn run(&self, ctx: &mut CommandContext, user: User, args: &[String]) -> Result<()>;
}

pub enum Handler {
    Public(Box<dyn PublicCommand>),
    RequiresUser(Box<dyn UserCommand>),
}

#[derive(Default)]
pub struct Commands {
    handlers: BTreeMap<&'static str, Handler>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full command set of the binary.
    pub fn standard() -> Self {
        let mut commands = Self::new();
        commands.register_public("register", Register);
        commands.register_public("login", Login);
        commands.register_public("reset", Reset);
        commands.register_public("users", Users);
        commands.register_public("feeds", Feeds);
        commands.register_public("agg", Agg);
        commands.register_user("addfeed", AddFeed);
        commands.register_user("follow", Follow);
        commands.register_user("following", Following);
        commands.register_user("unfollow", Unfollow);
        commands.register_user("browse", Browse);
        commands
    }

    pub fn register_public(&mut self, name: &'static str, command: impl PublicCommand + 'static) {
        self.handlers.insert(name, Handler::Public(Box::new(command)));
    }

    pub fn register_user(&mut self, name: &'static str, command: impl UserCommand + 'static) {
        self.handlers
            .insert(name, Handler::RequiresUser(Box::new(command)));
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub async fn run(&self, ctx: &mut CommandContext, name: &str, args: &[String]) -> Result<()> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| AggregatorError::UnknownCommand(name.to_string()))?;

        debug!("Running command {} with {} args", name, args.len());
        match handler {
            Handler::Public(command) => command.run(ctx, args).await,
            Handler::RequiresUser(command) => {
                let user = ctx.current_user().await?;
                command.run(ctx, user, args).await
            }
        }
    }
}

/// The `index`th argument or a usage error naming what was missing.
fn required_arg<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| AggregatorError::Usage(format!("usage: gator {}", usage)))
}
