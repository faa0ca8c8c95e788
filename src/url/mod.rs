//! URL handling module
//!
//! This module provides next-page resolution against a run's captured
//! origin, origin extraction, and seed URL validation.

mod origin;
mod resolve;

use crate::state::ConsumerState;
use crate::UrlError;

// Re-export main functions
pub use origin::{extract_origin, is_absolute, origin_of};
pub use resolve::resolve_url;

/// Builds the initial consumer state for a seed URL
///
/// The seed is resolved exactly like a `next` link on the first page, so it
/// fixes the run's origin. Seeds that do not resolve to an absolute URL are
/// rejected before any network activity.
///
/// # Examples
///
/// ```
/// use openactive_rpde::url::seed_state;
///
/// let state = seed_state("https://ex.org/feed?page=1").unwrap();
/// assert_eq!(state.next_url, "https://ex.org/feed?page=1");
/// assert_eq!(state.first_url_origin, "https://ex.org");
///
/// assert!(seed_state("").is_err());
/// assert!(seed_state("/feed").is_err());
/// ```
pub fn seed_state(seed: &str) -> Result<ConsumerState, UrlError> {
    if seed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut state = ConsumerState::new();
    let next_url = resolve_url(seed, &mut state);

    if next_url.is_empty() {
        return Err(UrlError::Parse(seed.to_string()));
    }
    if !is_absolute(&next_url) {
        return Err(UrlError::MissingOrigin(seed.to_string()));
    }

    state.next_url = next_url;
    Ok(state)
}
