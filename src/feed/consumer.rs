//! RPDE consumer - the pagination walk
//!
//! This module drives one feed from a seed to its live edge:
//! - Validating the seed (fresh URL or a previously returned state)
//! - Fetching one page at a time through the resilient fetcher
//! - Folding each page's items into the snapshot
//! - Resolving the page's `next` link and deciding whether to continue
//! - Pacing successive requests and honouring cancellation
//!
//! Every value returned from a run, whatever its status, is a valid seed for
//! resuming it.

use crate::config::Config;
use crate::feed::fetcher::{FetchResult, Fetcher};
use crate::feed::page::FeedPage;
use crate::state::{ApplyOutcome, ConsumerState, RunStatus, StallReason};
use crate::url::{is_absolute, resolve_url, seed_state};
use crate::RpdeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Where a run starts
#[derive(Debug, Clone)]
pub enum ConsumerSeed {
    /// Start from the first page of a feed
    NewRun(String),

    /// Continue from a state returned by an earlier run
    ResumeRun(ConsumerState),
}

impl ConsumerSeed {
    /// Validates the seed and turns it into the state the walk starts from
    ///
    /// No network activity happens here.
    pub fn into_state(self) -> Result<ConsumerState, RpdeError> {
        match self {
            Self::NewRun(url) => seed_state(&url)
                .map_err(|e| RpdeError::InvalidSeed(format!("feed URL '{}': {}", url, e))),
            Self::ResumeRun(state) => {
                state.validate_for_resume()?;
                Ok(state)
            }
        }
    }

    /// Short label for logs and multi-feed results
    pub fn label(&self) -> &str {
        match self {
            Self::NewRun(url) => url,
            Self::ResumeRun(state) => &state.next_url,
        }
    }
}

impl From<&str> for ConsumerSeed {
    fn from(url: &str) -> Self {
        Self::NewRun(url.to_string())
    }
}

impl From<String> for ConsumerSeed {
    fn from(url: String) -> Self {
        Self::NewRun(url)
    }
}

impl From<ConsumerState> for ConsumerSeed {
    fn from(state: ConsumerState) -> Self {
        Self::ResumeRun(state)
    }
}

/// Result of one run: the resumable state and how the run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeOutcome {
    pub status: RunStatus,
    pub state: ConsumerState,
}

impl ConsumeOutcome {
    fn new(state: ConsumerState, status: RunStatus) -> Self {
        Self { status, state }
    }

    fn stalled(state: ConsumerState, reason: StallReason) -> Self {
        Self::new(state, RunStatus::Stalled { reason })
    }
}

/// Item counts for one applied page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub kept: usize,
    pub deleted: usize,
    pub skipped: usize,
}

impl PageSummary {
    fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Inserted => self.inserted += 1,
            ApplyOutcome::Replaced => self.replaced += 1,
            ApplyOutcome::Kept | ApplyOutcome::Absent => self.kept += 1,
            ApplyOutcome::Deleted => self.deleted += 1,
            ApplyOutcome::Incomparable => self.skipped += 1,
        }
    }
}

/// Folds a page's entries into the state, in order
///
/// Entries that are not well-formed items are skipped and counted.
pub fn apply_page(state: &mut ConsumerState, page: &FeedPage, page_url: &str) -> PageSummary {
    let mut summary = PageSummary::default();

    for (index, parsed) in page.parsed_items().enumerate() {
        match parsed {
            Ok(item) => {
                let key = item.key();
                let outcome = state.apply_item(item);
                if outcome == ApplyOutcome::Incomparable {
                    tracing::debug!(
                        "Skipping item {} on {}: modified marker not comparable with stored item",
                        key,
                        page_url
                    );
                }
                summary.record(outcome);
            }
            Err(e) => {
                tracing::debug!("Skipping malformed item #{} on {}: {}", index, page_url, e);
                summary.skipped += 1;
            }
        }
    }

    summary
}

/// Walks RPDE feeds
///
/// A consumer holds no per-run state; one instance can drive any number of
/// walks, sequentially or concurrently.
#[derive(Debug, Clone)]
pub struct Consumer {
    fetcher: Fetcher,
    page_delay: Duration,
    max_pages: Option<usize>,
}

impl Consumer {
    /// Creates a consumer with a pacing delay between pages
    pub fn new(fetcher: Fetcher, page_delay: Duration) -> Self {
        Self {
            fetcher,
            page_delay,
            max_pages: None,
        }
    }

    /// Creates a consumer from configuration
    pub fn from_config(config: &Config) -> Result<Self, RpdeError> {
        let fetcher = Fetcher::new(&config.fetcher, &config.user_agent)?;
        let max_pages = match config.consumer.max_pages {
            0 => None,
            n => Some(n),
        };
        Ok(Self::new(fetcher, Duration::from_millis(config.consumer.page_delay_ms))
            .with_max_pages(max_pages))
    }

    /// Caps the number of pages fetched per run
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Runs a walk to the live edge of the feed or until it stalls
    ///
    /// # Returns
    ///
    /// * `Ok(ConsumeOutcome)` - The state reached and how the run ended
    /// * `Err(RpdeError::InvalidSeed)` - The seed was rejected; nothing was fetched
    pub async fn consume(&self, seed: impl Into<ConsumerSeed>) -> Result<ConsumeOutcome, RpdeError> {
        self.consume_with_cancel(seed, &CancellationToken::new())
            .await
    }

    /// Runs a walk that stops cleanly when `cancel` fires
    ///
    /// Cancellation is observed before each fetch attempt and during the
    /// pacing delay; the returned state is exactly the state after the last
    /// applied page.
    pub async fn consume_with_cancel(
        &self,
        seed: impl Into<ConsumerSeed>,
        cancel: &CancellationToken,
    ) -> Result<ConsumeOutcome, RpdeError> {
        let mut state = seed.into().into_state()?;
        let mut pages = 0usize;

        tracing::info!(
            "Consuming feed from {} ({} items, {} pages already consumed)",
            state.next_url,
            state.len(),
            state.urls.len()
        );

        loop {
            if let Some(limit) = self.max_pages {
                if pages >= limit {
                    tracing::info!("Page limit ({}) reached at {}", limit, state.next_url);
                    return Ok(ConsumeOutcome::new(state, RunStatus::PageLimit { pages }));
                }
            }

            let feed_url = state.next_url.clone();
            let body = match self.fetcher.fetch_with_cancel(&feed_url, cancel).await {
                FetchResult::Success {
                    final_url,
                    status_code,
                    body,
                    attempts,
                } => {
                    tracing::debug!(
                        "Fetched {} (HTTP {}, {} attempts)",
                        final_url,
                        status_code,
                        attempts
                    );
                    body
                }
                FetchResult::Exhausted { attempts, .. } => {
                    tracing::error!("Can't get feed: {}", feed_url);
                    return Ok(ConsumeOutcome::stalled(
                        state,
                        StallReason::Unreachable {
                            url: feed_url,
                            attempts,
                        },
                    ));
                }
                FetchResult::Cancelled { .. } => {
                    tracing::info!("Cancelled before fetching {}", feed_url);
                    return Ok(ConsumeOutcome::new(state, RunStatus::Cancelled));
                }
            };
            pages += 1;

            let page = match FeedPage::parse(&body) {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Malformed RPDE page at {}: {}", feed_url, e);
                    return Ok(ConsumeOutcome::stalled(
                        state,
                        StallReason::MalformedPage {
                            url: feed_url,
                            message: e.to_string(),
                        },
                    ));
                }
            };

            let summary = apply_page(&mut state, &page, &feed_url);
            tracing::debug!(
                "Applied {}: {} inserted, {} replaced, {} unchanged, {} deleted, {} skipped",
                feed_url,
                summary.inserted,
                summary.replaced,
                summary.kept,
                summary.deleted,
                summary.skipped
            );

            let next_url = resolve_url(&page.next, &mut state);
            if next_url.is_empty() || !is_absolute(&next_url) {
                tracing::error!("Can't resolve next link '{}' on {}", page.next, feed_url);
                return Ok(ConsumeOutcome::stalled(
                    state,
                    StallReason::UnresolvableNext {
                        url: feed_url,
                        raw: page.next,
                    },
                ));
            }

            if next_url == feed_url {
                tracing::info!(
                    "Reached the end of {} with {} items after {} pages",
                    feed_url,
                    state.len(),
                    state.urls.len() + 1
                );
                return Ok(ConsumeOutcome::new(state, RunStatus::Terminal));
            }

            state.urls.push(feed_url);
            state.next_url = next_url;

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Cancelled before fetching {}", state.next_url);
                    return Ok(ConsumeOutcome::new(state, RunStatus::Cancelled));
                }
                _ = tokio::time::sleep(self.page_delay) => {}
            }
        }
    }
}
