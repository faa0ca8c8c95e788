//! Output module for snapshot summaries and state files
//!
//! This module handles:
//! - Counting snapshot items by kind and by payload type
//! - Printing statistics and run summaries
//! - Writing and reading resumable JSON state files

mod state_file;
pub mod stats;

pub use state_file::{read_state_file, write_state_file};
pub use stats::{
    item_data_type, item_data_types, item_kinds, print_outcome, print_statistics,
    snapshot_statistics, SnapshotStatistics,
};
