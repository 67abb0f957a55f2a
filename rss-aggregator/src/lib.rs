pub mod commands;
pub mod config;
pub mod fetcher;
pub mod ingestor;
pub mod parser;
pub mod sanitize;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod types;

pub use fetcher::{FeedSource, Fetcher};
pub use ingestor::PostIngestor;
pub use parser::FeedParser;
pub use scheduler::{AggregationScheduler, CycleOutcome};
pub use store::{MemoryStore, PgStore};
pub use types::*;
