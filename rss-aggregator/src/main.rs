use anyhow::Context;
use clap::Parser;
use rss_aggregator::commands::{CommandContext, Commands};
use rss_aggregator::config::{Config, ConfigFile};
use rss_aggregator::{FetchConfig, PgStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// A command-line RSS aggregator.
#[derive(Debug, Parser)]
#[command(name = "gator", version)]
struct Cli {
    /// Postgres connection string; overrides `db_url` from the config file.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Config file to use instead of `~/.gatorconfig.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-request timeout for feed fetches, in seconds.
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,

    /// One of: register, login, reset, users, addfeed, feeds, follow,
    /// following, unfollow, browse, agg.
    command: String,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = ConfigFile::load(config_path).context("failed to read gator config")?;
    debug!("Loaded config from {}", config.path().display());

    let database_url = cli
        .database_url
        .unwrap_or_else(|| config.config().db_url.clone());
    if database_url.is_empty() {
        anyhow::bail!(
            "no database configured; set db_url in {} or DATABASE_URL",
            config.path().display()
        );
    }

    let store = PgStore::connect(&database_url)
        .await
        .context("failed to connect to the database")?;
    info!("Connected to database");

    let fetch_config = FetchConfig {
        timeout_seconds: cli.fetch_timeout,
        ..FetchConfig::default()
    };

    let commands = Commands::standard();
    let mut ctx = CommandContext::new(Arc::new(store), config, fetch_config);
    commands.run(&mut ctx, &cli.command, &cli.args).await?;

    Ok(())
}
