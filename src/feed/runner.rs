//! Concurrent multi-feed runs
//!
//! Independent feeds share nothing but the fetcher's connection pool, so they
//! can be walked side by side. A semaphore bounds how many walks are in
//! flight at once.

use crate::feed::consumer::{ConsumeOutcome, Consumer, ConsumerSeed};
use crate::RpdeError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of one feed within a multi-feed run
#[derive(Debug)]
pub struct FeedRun {
    /// Seed URL, or the resume point for resumed runs
    pub label: String,
    pub result: Result<ConsumeOutcome, RpdeError>,
}

/// Walks several feeds concurrently
///
/// Results come back in seed order. A failure of one feed (including an
/// invalid seed) never affects the others.
///
/// # Arguments
///
/// * `consumer` - The consumer to clone into each walk
/// * `seeds` - One seed per feed
/// * `max_concurrent` - Upper bound on simultaneous walks (at least 1)
/// * `cancel` - Cancels every walk
pub async fn consume_many(
    consumer: &Consumer,
    seeds: Vec<ConsumerSeed>,
    max_concurrent: usize,
    cancel: &CancellationToken,
) -> Vec<FeedRun> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let labels: Vec<String> = seeds.iter().map(|s| s.label().to_string()).collect();
    let mut tasks = JoinSet::new();

    for (index, seed) in seeds.into_iter().enumerate() {
        let consumer = consumer.clone();
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => consumer.consume_with_cancel(seed, &cancel).await,
                Err(e) => Err(RpdeError::Task(e.to_string())),
            };
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<ConsumeOutcome, RpdeError>>> =
        labels.iter().map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => tracing::error!("Feed task failed: {}", e),
        }
    }

    labels
        .into_iter()
        .zip(results)
        .map(|(label, result)| FeedRun {
            result: result.unwrap_or_else(|| {
                Err(RpdeError::Task(format!("no result for {}", label)))
            }),
            label,
        })
        .collect()
}
