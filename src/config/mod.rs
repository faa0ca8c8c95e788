//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a file is supported.
//!
//! # Example
//!
//! ```no_run
//! use openactive_rpde::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("rpde.toml")).unwrap();
//! println!("Pacing delay: {}ms", config.consumer.page_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ConsumerConfig, DiscoveryConfig, FetcherConfig, UserAgentConfig,
    DEFAULT_COLLECTION_URL,
};

// Re-export parser functions
pub use parser::{load_config, load_or_default, parse_config};
