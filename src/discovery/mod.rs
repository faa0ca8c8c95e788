//! Feed discovery
//!
//! OpenActive publishes a three-level hierarchy:
//! - a catalogue collection listing catalogue URLs (`hasPart`)
//! - catalogues listing dataset page URLs (`dataset`)
//! - dataset pages embedding JSON-LD with one `distribution` entry per feed
//!
//! Each level is fetched through the resilient fetcher with a pacing delay
//! between requests. Failures are logged and skipped so one broken publisher
//! does not hide the rest.

mod jsonld;

pub use jsonld::{descriptors_from_jsonld, extract_feed_descriptors, FeedDescriptor};

use crate::config::Config;
use crate::feed::Fetcher;
use crate::RpdeError;
use serde_json::Value;
use std::time::Duration;

/// Reads `key` as an array made only of strings
fn string_array(document: &Value, key: &str) -> Option<Vec<String>> {
    document
        .get(key)?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Results grouped by the URL they were read from, in publication order
pub type Grouped<T> = Vec<(String, Vec<T>)>;

/// Flattens grouped results, keeping their order
pub fn flatten<T>(grouped: Grouped<T>) -> Vec<T> {
    grouped.into_iter().flat_map(|(_, items)| items).collect()
}

/// Walks the catalogue hierarchy
#[derive(Debug, Clone)]
pub struct Discoverer {
    fetcher: Fetcher,
    delay: Duration,
}

impl Discoverer {
    /// Creates a discoverer with a pacing delay between requests
    pub fn new(fetcher: Fetcher, delay: Duration) -> Self {
        Self { fetcher, delay }
    }

    /// Creates a discoverer from configuration
    pub fn from_config(config: &Config) -> Result<Self, RpdeError> {
        let fetcher = Fetcher::new(&config.fetcher, &config.user_agent)?;
        Ok(Self::new(
            fetcher,
            Duration::from_millis(config.consumer.page_delay_ms),
        ))
    }

    async fn fetch_json(&self, url: &str) -> Option<Value> {
        let body = self.fetcher.fetch(url).await.into_body()?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Invalid JSON from {}: {}", url, e);
                None
            }
        }
    }

    async fn pace(&self, index: usize) {
        if index != 0 {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Lists the catalogue URLs of a collection
    pub async fn catalogue_urls(&self, collection_url: &str) -> Vec<String> {
        let urls = self
            .fetch_json(collection_url)
            .await
            .and_then(|doc| string_array(&doc, "hasPart"));

        match urls {
            Some(urls) => urls,
            None => {
                tracing::error!("Can't get collection: {}", collection_url);
                Vec::new()
            }
        }
    }

    /// Lists dataset URLs, grouped by catalogue
    pub async fn dataset_urls(&self, catalogue_urls: &[String]) -> Grouped<String> {
        let mut grouped = Vec::new();

        for (index, catalogue_url) in catalogue_urls.iter().enumerate() {
            self.pace(index).await;
            let urls = self
                .fetch_json(catalogue_url)
                .await
                .and_then(|doc| string_array(&doc, "dataset"));

            match urls {
                Some(urls) => {
                    grouped.push((catalogue_url.clone(), urls));
                }
                None => tracing::error!("Can't get catalogue: {}", catalogue_url),
            }
        }

        grouped
    }

    /// Reads feed descriptors, grouped by dataset page
    ///
    /// Dataset pages without any descriptor are left out.
    pub async fn feeds(&self, dataset_urls: &[String]) -> Grouped<FeedDescriptor> {
        let mut grouped = Vec::new();

        for (index, dataset_url) in dataset_urls.iter().enumerate() {
            self.pace(index).await;
            let Some(html) = self.fetcher.fetch(dataset_url).await.into_body() else {
                tracing::error!("Can't get dataset: {}", dataset_url);
                continue;
            };

            let descriptors = extract_feed_descriptors(&html, dataset_url);
            if !descriptors.is_empty() {
                grouped.push((dataset_url.clone(), descriptors));
            }
        }

        grouped
    }

    /// Runs the whole walk from a collection URL
    pub async fn discover(&self, collection_url: &str) -> Grouped<FeedDescriptor> {
        let catalogue_urls = self.catalogue_urls(collection_url).await;
        tracing::info!("Found {} catalogues", catalogue_urls.len());

        let dataset_urls = flatten(self.dataset_urls(&catalogue_urls).await);
        tracing::info!("Found {} datasets", dataset_urls.len());

        let feeds = self.feeds(&dataset_urls).await;
        tracing::info!(
            "Found {} feeds",
            feeds.iter().map(|(_, group)| group.len()).sum::<usize>()
        );
        feeds
    }
}
