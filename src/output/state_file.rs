//! JSON state files
//!
//! A state file holds a run outcome: the resumable state and its status.
//! Bare `ConsumerState` documents are accepted on load as well, so a state
//! produced by another tool can seed a resumed run.

use crate::feed::ConsumeOutcome;
use crate::state::{ConsumerState, RunStatus};
use crate::RpdeError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum StateDocument {
    Outcome(ConsumeOutcome),
    State(ConsumerState),
}

/// Writes a run outcome as pretty-printed JSON
pub fn write_state_file(path: &Path, outcome: &ConsumeOutcome) -> Result<(), RpdeError> {
    let json = serde_json::to_string_pretty(outcome)?;
    fs::write(path, json)?;
    tracing::info!("Wrote state for {} items to {}", outcome.state.len(), path.display());
    Ok(())
}

/// Reads a run outcome, or a bare consumer state, from a JSON file
///
/// Bare states are reported with status `None`.
pub fn read_state_file(path: &Path) -> Result<(ConsumerState, Option<RunStatus>), RpdeError> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        StateDocument::Outcome(outcome) => Ok((outcome.state, Some(outcome.status))),
        StateDocument::State(state) => Ok((state, None)),
    }
}
