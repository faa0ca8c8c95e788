//! Feed descriptor extraction from dataset pages
//!
//! Dataset sites embed a schema.org `Dataset` as JSON-LD in the page head.
//! Each entry of its `distribution` array describes one feed.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One published feed, as described by its dataset page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    /// Dataset name
    pub name: String,

    /// Distribution name, usually the opportunity type, e.g. "SessionSeries"
    #[serde(rename = "type")]
    pub feed_type: String,

    /// Feed URL (`contentUrl`)
    pub url: String,

    /// Page the descriptor was read from
    pub dataset_url: String,

    pub discussion_url: String,

    pub license_url: String,

    pub publisher_name: String,
}

/// Reads a field as text; missing fields become empty strings
fn text_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Builds descriptors from one parsed JSON-LD document
pub fn descriptors_from_jsonld(jsonld: &Value, dataset_url: &str) -> Vec<FeedDescriptor> {
    let Some(distribution) = jsonld.get("distribution").and_then(Value::as_array) else {
        return Vec::new();
    };

    let publisher_name = jsonld
        .get("publisher")
        .map(|publisher| text_field(publisher, "name"))
        .unwrap_or_default();

    distribution
        .iter()
        .map(|feed| FeedDescriptor {
            name: text_field(jsonld, "name"),
            feed_type: text_field(feed, "name"),
            url: text_field(feed, "contentUrl"),
            dataset_url: dataset_url.to_string(),
            discussion_url: text_field(jsonld, "discussionUrl"),
            license_url: text_field(jsonld, "license"),
            publisher_name: publisher_name.clone(),
        })
        .collect()
}

/// Extracts feed descriptors from a dataset page's HTML
///
/// Every `<script type="application/ld+json">` in the head is considered.
/// Scripts that are not valid JSON are skipped.
///
/// # Example
///
/// ```
/// use openactive_rpde::discovery::extract_feed_descriptors;
///
/// let html = r#"<html><head><script type="application/ld+json">
///   {"name": "Leisure Centre", "distribution": [
///     {"name": "SessionSeries", "contentUrl": "https://ex.org/feeds/session-series"}
///   ]}
/// </script></head><body></body></html>"#;
///
/// let feeds = extract_feed_descriptors(html, "https://ex.org/");
/// assert_eq!(feeds.len(), 1);
/// assert_eq!(feeds[0].url, "https://ex.org/feeds/session-series");
/// ```
pub fn extract_feed_descriptors(html: &str, dataset_url: &str) -> Vec<FeedDescriptor> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"head script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut descriptors = Vec::new();
    for script in document.select(&selector) {
        let text: String = script.text().collect();
        match serde_json::from_str::<Value>(&text) {
            Ok(jsonld) => descriptors.extend(descriptors_from_jsonld(&jsonld, dataset_url)),
            Err(e) => {
                tracing::debug!("Skipping invalid JSON-LD on {}: {}", dataset_url, e);
            }
        }
    }

    descriptors
}
