//! Parent/child ("superevent"/"subevent") matching
//!
//! Children point at their parent through `data.superEvent` (sessions) or
//! `data.facilityUse` (slots). Parents are identified by their item `id` and
//! by `data.id` or `data.@id`. All identifiers are compared by their final
//! path segment, so `https://ex.org/series/42` and `42` match.

use crate::state::{ConsumerState, Item};
use serde_json::Value;

/// Child fields naming the parent, in lookup order
const PARENT_REFERENCE_FIELDS: &[&str] = &["superEvent", "facilityUse"];

/// Parent payload fields carrying its identifier, in lookup order
const PARENT_ID_FIELDS: &[&str] = &["id", "@id"];

/// Identifiers a parent can be referenced by
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentIds {
    /// Final segment of the item's own `id`
    pub item_id: Option<String>,

    /// Final segment of `data.id`, or `data.@id` when `id` is absent
    pub data_id: Option<String>,
}

impl ParentIds {
    /// Returns true if neither identifier is known
    pub fn is_empty(&self) -> bool {
        self.item_id.is_none() && self.data_id.is_none()
    }

    /// Returns true if either identifier equals `reference`
    pub fn matches(&self, reference: &str) -> bool {
        self.item_id.as_deref() == Some(reference) || self.data_id.as_deref() == Some(reference)
    }
}

/// Returns the final `/`-separated segment of an identifier
///
/// # Examples
///
/// ```
/// use openactive_rpde::correlate::last_segment;
///
/// assert_eq!(last_segment("https://ex.org/series/42"), "42");
/// assert_eq!(last_segment("42"), "42");
/// ```
pub fn last_segment(identifier: &str) -> &str {
    identifier.rsplit('/').next().unwrap_or(identifier)
}

/// Renders a string or integer JSON value; anything else is not an identifier
fn scalar_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// First scalar-valued field of the payload, checked in order
fn first_scalar_field(item: &Item, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| item.data_field(field).and_then(scalar_identifier))
}

/// Extracts the parent reference declared by a child item
pub fn parent_reference(child: &Item) -> Option<String> {
    first_scalar_field(child, PARENT_REFERENCE_FIELDS)
        .map(|reference| last_segment(&reference).to_string())
}

/// Extracts the identifiers a parent item can be referenced by
pub fn parent_ids(parent: &Item) -> ParentIds {
    ParentIds {
        item_id: Some(last_segment(&parent.key()).to_string()),
        data_id: first_scalar_field(parent, PARENT_ID_FIELDS)
            .map(|id| last_segment(&id).to_string()),
    }
}

/// Finds every parent of `child` in a parent snapshot
///
/// More than one match is possible when the snapshot holds stale or duplicate
/// entries; all of them are returned in snapshot order.
pub fn find_superevents<'a>(child: &Item, parents: &'a ConsumerState) -> Vec<&'a Item> {
    let Some(reference) = parent_reference(child) else {
        return Vec::new();
    };

    parents
        .items()
        .filter(|parent| parent_ids(parent).matches(&reference))
        .collect()
}

/// Finds every child of `parent` in a child snapshot
pub fn find_subevents<'a>(parent: &Item, children: &'a ConsumerState) -> Vec<&'a Item> {
    let ids = parent_ids(parent);
    if ids.is_empty() {
        return Vec::new();
    }

    children
        .items()
        .filter(|child| {
            parent_reference(child)
                .map(|reference| ids.matches(&reference))
                .unwrap_or(false)
        })
        .collect()
}
