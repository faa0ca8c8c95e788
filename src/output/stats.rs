//! Snapshot analytics
//!
//! Read-only summaries over a consumer snapshot, plus a printer for the CLI.

use crate::feed::ConsumeOutcome;
use crate::state::{ConsumerState, Item};
use serde_json::Value;
use std::collections::BTreeMap;

/// Payload keys holding the item's type, in lookup order
const DATA_TYPE_KEYS: &[&str] = &["type", "@type"];

/// Snapshot statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStatistics {
    /// Number of items in the snapshot
    pub total_items: usize,

    /// Number of pages consumed so far
    pub pages_consumed: usize,

    /// Count of items by their `kind`
    pub item_kinds: BTreeMap<String, u64>,

    /// Count of items by their payload `type` / `@type`
    pub item_data_types: BTreeMap<String, u64>,
}

/// Renders a JSON value as a grouping key
fn group_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Returns the payload type of an item, checking `type` then `@type`
pub fn item_data_type(item: &Item) -> Option<String> {
    DATA_TYPE_KEYS
        .iter()
        .find_map(|key| item.data_field(key))
        .map(group_key)
}

/// Counts items grouped by their `kind`
///
/// Items without a kind are not counted.
pub fn item_kinds(state: &ConsumerState) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for kind in state.items().filter_map(|item| item.kind.as_ref()) {
        *counts.entry(group_key(kind)).or_insert(0) += 1;
    }
    counts
}

/// Counts items grouped by their payload type
///
/// Items without a payload or without a type are not counted.
pub fn item_data_types(state: &ConsumerState) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for data_type in state.items().filter_map(item_data_type) {
        *counts.entry(data_type).or_insert(0) += 1;
    }
    counts
}

/// Computes all statistics for a snapshot
pub fn snapshot_statistics(state: &ConsumerState) -> SnapshotStatistics {
    SnapshotStatistics {
        total_items: state.len(),
        pages_consumed: state.urls.len(),
        item_kinds: item_kinds(state),
        item_data_types: item_data_types(state),
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SnapshotStatistics) {
    println!("=== Snapshot Statistics ===\n");

    println!("Overview:");
    println!("  Items: {}", stats.total_items);
    println!("  Pages consumed: {}", stats.pages_consumed);
    println!();

    print_counts("Items by Kind", &stats.item_kinds, stats.total_items);
    print_counts("Items by Data Type", &stats.item_data_types, stats.total_items);
}

fn print_counts(title: &str, counts: &BTreeMap<String, u64>, total: usize) {
    if counts.is_empty() {
        return;
    }

    println!("{}:", title);
    // Sort by count (descending)
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1));

    for (name, count) in sorted {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", name, count, percentage);
    }
    println!();
}

/// Prints a one-line summary of a run
pub fn print_outcome(label: &str, outcome: &ConsumeOutcome) {
    println!(
        "{}: {} items, {} pages, {}",
        label,
        outcome.state.len(),
        outcome.state.urls.len(),
        outcome.status
    );
}
