//! Resumable consumer state
//!
//! A `ConsumerState` is a plain value: the live snapshot plus enough
//! pagination bookkeeping to pick a walk up again later, possibly in another
//! process.

use crate::state::item::{Item, ItemState};
use crate::url::is_absolute;
use crate::RpdeError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// What applying one item did to the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new identity was added
    Inserted,

    /// A stored item was replaced by a more recent one
    Replaced,

    /// The stored item is at least as recent; nothing changed
    Kept,

    /// The identity was removed
    Deleted,

    /// A delete arrived for an identity that is not stored
    Absent,

    /// The modification markers cannot be compared; nothing changed
    Incomparable,
}

/// Snapshot and pagination position of one feed walk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerState {
    /// Live snapshot keyed by normalized item identity
    pub items: BTreeMap<String, Item>,

    /// Page URLs already fully consumed, in order
    pub urls: Vec<String>,

    /// Scheme and authority captured from the first page URL
    pub first_url_origin: String,

    /// Absolute URL of the next page to fetch
    pub next_url: String,
}

impl ConsumerState {
    /// Creates an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one item with upsert/delete semantics
    ///
    /// Updates win only when their `modified` marker is strictly greater than
    /// the stored one. Deletes always remove the identity.
    pub fn apply_item(&mut self, item: Item) -> ApplyOutcome {
        let key = item.key();

        match item.state {
            ItemState::Updated => match self.items.get(&key) {
                None => {
                    self.items.insert(key, item);
                    ApplyOutcome::Inserted
                }
                Some(existing) => match item.modified.partial_cmp(&existing.modified) {
                    Some(Ordering::Greater) => {
                        self.items.insert(key, item);
                        ApplyOutcome::Replaced
                    }
                    Some(_) => ApplyOutcome::Kept,
                    None => ApplyOutcome::Incomparable,
                },
            },
            ItemState::Deleted => {
                if self.items.remove(&key).is_some() {
                    ApplyOutcome::Deleted
                } else {
                    ApplyOutcome::Absent
                }
            }
        }
    }

    /// Returns the stored item for an identity
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.items.get(key)
    }

    /// Iterates over the snapshot in identity order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Number of items in the snapshot
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the snapshot holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Checks that this state can seed a resumed walk
    pub fn validate_for_resume(&self) -> Result<(), RpdeError> {
        if self.next_url.is_empty() {
            return Err(RpdeError::InvalidSeed(
                "consumer state has an empty next_url".to_string(),
            ));
        }
        if !is_absolute(&self.next_url) {
            return Err(RpdeError::InvalidSeed(format!(
                "consumer state next_url is not absolute: {}",
                self.next_url
            )));
        }
        Ok(())
    }
}
