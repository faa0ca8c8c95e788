//! State module for tracking feed consumption
//!
//! This module provides the values a consumer run reads and produces.
//!
//! # Components
//!
//! - `Item`: One RPDE record with its identity, state and modification marker
//! - `ConsumerState`: The live snapshot plus the resumable pagination position
//! - `RunStatus`: How a run ended (terminal, stalled, cancelled, page limit)

mod consumer_state;
mod item;
mod run_status;

// Re-export main types
pub use consumer_state::{ApplyOutcome, ConsumerState};
pub use item::{Item, ItemId, ItemState, Modified};
pub use run_status::{RunStatus, StallReason};
