//! Feed module for consuming RPDE feeds
//!
//! This module contains the core replication logic, including:
//! - HTTP fetching with bounded retry
//! - RPDE page parsing
//! - The pagination walk with upsert/delete reconciliation
//! - Concurrent walks over several feeds

mod consumer;
mod fetcher;
mod page;
mod runner;

pub use consumer::{apply_page, ConsumeOutcome, Consumer, ConsumerSeed, PageSummary};
pub use fetcher::{build_http_client, FetchResult, Fetcher};
pub use page::FeedPage;
pub use runner::{consume_many, FeedRun};

use crate::config::Config;

/// Consumes a single feed with the given configuration
///
/// This is the main entry point for a one-off run. It will:
/// 1. Build the HTTP client and consumer
/// 2. Validate the seed
/// 3. Walk the feed to its live edge, or until it stalls
///
/// # Arguments
///
/// * `config` - The configuration
/// * `seed` - A feed URL or a state from an earlier run
///
/// # Returns
///
/// * `Ok(ConsumeOutcome)` - The resumable state and run status
/// * `Err(RpdeError)` - Invalid seed or client construction failure
pub async fn consume(
    config: &Config,
    seed: impl Into<ConsumerSeed>,
) -> crate::Result<ConsumeOutcome> {
    Consumer::from_config(config)?.consume(seed).await
}
