//! OpenActive RPDE: a resumable consumer for OpenActive opportunity feeds
//!
//! This crate walks Realtime Paged Data Exchange (RPDE) feeds page by page,
//! folding every page into a deduplicated, deletion-aware snapshot of items.
//! It also correlates parent/child items across sibling feeds and summarises
//! snapshots.

pub mod config;
pub mod correlate;
pub mod discovery;
pub mod feed;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for RPDE operations
#[derive(Debug, Error)]
pub enum RpdeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL is empty")]
    Empty,

    #[error("URL has no origin to resolve against: {0}")]
    MissingOrigin(String),

    #[error("Failed to parse URL: {0}")]
    Parse(String),
}

/// Result type alias for RPDE operations
pub type Result<T> = std::result::Result<T, RpdeError>;

// Re-export commonly used types
pub use config::Config;
pub use feed::{ConsumeOutcome, Consumer, ConsumerSeed, Fetcher};
pub use state::{ConsumerState, Item, ItemState, RunStatus, StallReason};
pub use url::resolve_url;
