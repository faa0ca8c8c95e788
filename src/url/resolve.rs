//! Next-page URL resolution
//!
//! Publishers are inconsistent about pagination links: some emit absolute
//! URLs, some emit paths or bare query strings, and some switch between the
//! two mid-feed. Resolution accepts any of these and rebuilds relative links
//! against the origin captured from the first page of the run.

use crate::state::ConsumerState;
use crate::url::origin::origin_of;
use percent_encoding::percent_decode_str;
use url::Url;

/// A raw reference split into the parts resolution cares about
#[derive(Debug, Default, PartialEq, Eq)]
struct Reference {
    origin: Option<String>,
    path: String,
    query: String,
}

/// Resolves a raw `next` link into an absolute URL
///
/// # Rules
///
/// 1. The raw value is percent-decoded first.
/// 2. Absolute URL (scheme and authority): returned as decoded. While no page
///    has been consumed yet its origin becomes the state's origin.
/// 3. Path and/or query only: rebuilt as origin + path + query, adding the
///    `/` and `?` separators when missing.
/// 4. Anything else resolves to the empty string, which callers treat as
///    "cannot continue".
///
/// # Examples
///
/// ```
/// use openactive_rpde::state::ConsumerState;
/// use openactive_rpde::url::resolve_url;
///
/// let mut state = ConsumerState::new();
/// let first = resolve_url("https://host/a/feed?page=1", &mut state);
/// assert_eq!(first, "https://host/a/feed?page=1");
/// assert_eq!(state.first_url_origin, "https://host");
///
/// let second = resolve_url("/a/feed?page=2", &mut state);
/// assert_eq!(second, "https://host/a/feed?page=2");
///
/// assert_eq!(resolve_url("", &mut state), "");
/// ```
pub fn resolve_url(raw: &str, state: &mut ConsumerState) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();
    let reference = split_reference(&decoded);

    if let Some(origin) = reference.origin {
        if state.urls.is_empty() {
            state.first_url_origin = origin;
        }
        return decoded;
    }

    if reference.path.is_empty() && reference.query.is_empty() {
        return String::new();
    }

    let mut url = state.first_url_origin.clone();
    if !reference.path.is_empty() {
        if !reference.path.starts_with('/') {
            url.push('/');
        }
        url.push_str(&reference.path);
    }
    if !reference.query.is_empty() {
        if !reference.query.starts_with('?') {
            url.push('?');
        }
        url.push_str(&reference.query);
    }
    url
}

fn split_reference(s: &str) -> Reference {
    if let Ok(url) = Url::parse(s) {
        if let Some(origin) = origin_of(&url) {
            return Reference {
                origin: Some(origin),
                ..Reference::default()
            };
        }
        // Scheme but no authority
        return Reference {
            origin: None,
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
        };
    }

    let without_fragment = s.split('#').next().unwrap_or_default();
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    // Network-path reference: drop the foreign authority, keep the path
    let path = match path.strip_prefix("//") {
        Some(rest) => rest.find('/').map(|i| &rest[i..]).unwrap_or_default(),
        None => path,
    };

    Reference {
        origin: None,
        path: path.to_string(),
        query: query.to_string(),
    }
}
