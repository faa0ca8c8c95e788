//! Resilient HTTP fetcher
//!
//! Every network call in the crate goes through this module:
//! - Building the shared HTTP client with the configured user agent
//! - Bounded retry of GET requests with a fixed delay between attempts
//! - Classifying the final result (success, exhausted, cancelled)
//!
//! A `Fetcher` is cheap to clone; clones share one connection pool, so many
//! feed walks can fetch concurrently through the same client.

use crate::config::{FetcherConfig, UserAgentConfig};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Received a 2xx response
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: String,
        /// Attempts used, including the successful one
        attempts: u32,
    },

    /// Every attempt failed
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Status of the last response, if any attempt got one
        last_status: Option<u16>,
    },

    /// The caller cancelled before the next attempt
    Cancelled {
        /// Attempts made before cancellation
        attempts: u32,
    },
}

impl FetchResult {
    /// Returns true if a 2xx response was received
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// Consumes the result, returning the body on success
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `fetcher` - Timeouts for every request
/// * `user_agent` - The user agent identification
///
/// # Example
///
/// ```no_run
/// use openactive_rpde::config::{FetcherConfig, UserAgentConfig};
/// use openactive_rpde::feed::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    fetcher: &FetcherConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetcher.request_timeout_secs))
        .connect_timeout(Duration::from_secs(fetcher.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// GET with bounded retry
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return the body |
/// | Any other status | Retry after `retry_delay` |
/// | Transport error | Log at error level, retry after `retry_delay` |
/// | Body read error | Log at error level, retry after `retry_delay` |
/// | `max_attempts` reached | Warn, return `Exhausted` |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
    verbose: bool,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(
        config: &FetcherConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config, user_agent)?;
        Ok(Self::with_client(
            client,
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
        .verbose(config.verbose))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_delay,
            verbose: false,
        }
    }

    /// Logs every attempt at info level instead of debug
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetches a URL, retrying until success or the attempt cap
    pub async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with_cancel(url, &CancellationToken::new()).await
    }

    /// Fetches a URL, giving up early when `cancel` fires
    ///
    /// Cancellation is checked before each attempt and while waiting between
    /// attempts; an in-flight request is allowed to finish.
    pub async fn fetch_with_cancel(&self, url: &str, cancel: &CancellationToken) -> FetchResult {
        let mut attempts = 0;
        let mut last_status = None;

        loop {
            if attempts == self.max_attempts {
                tracing::warn!("Max. tries ({}) reached for: {}", self.max_attempts, url);
                return FetchResult::Exhausted {
                    attempts,
                    last_status,
                };
            }

            if attempts > 0 {
                tracing::warn!(
                    "Retrying ({}/{}): {}",
                    attempts,
                    self.max_attempts - 1,
                    url
                );
                tokio::select! {
                    _ = cancel.cancelled() => return FetchResult::Cancelled { attempts },
                    _ = tokio::time::sleep(self.retry_delay) => {}
                }
            }

            if cancel.is_cancelled() {
                return FetchResult::Cancelled { attempts };
            }

            if self.verbose {
                tracing::info!("Calling: {}", url);
            } else {
                tracing::debug!("Calling: {}", url);
            }
            attempts += 1;

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Request to {} failed: {}", url, e);
                    continue;
                }
            };

            let status = response.status();
            last_status = Some(status.as_u16());
            if !status.is_success() {
                tracing::warn!("HTTP {} from {}", status.as_u16(), url);
                continue;
            }

            let final_url = response.url().to_string();
            match response.text().await {
                Ok(body) => {
                    return FetchResult::Success {
                        final_url,
                        status_code: status.as_u16(),
                        body,
                        attempts,
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read body from {}: {}", url, e);
                }
            }
        }
    }
}
