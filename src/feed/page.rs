//! RPDE page parsing
//!
//! A page must be a JSON object with an `items` array and a string `next`.
//! Items are kept raw here and parsed one at a time by the consumer, so one
//! bad item never costs the rest of the page.

use crate::state::Item;
use serde::Deserialize;
use serde_json::Value;

/// One fetched RPDE page
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    /// Raw item entries, in publication order
    pub items: Vec<Value>,

    /// The page's `next` link as published
    pub next: String,
}

impl FeedPage {
    /// Parses a page body
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Parses the entries into items, in order
    pub fn parsed_items(&self) -> impl Iterator<Item = Result<Item, serde_json::Error>> + '_ {
        self.items.iter().cloned().map(Item::from_value)
    }
}
