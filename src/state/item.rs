/// RPDE item definitions
///
/// An item is one record of a feed page. Only `id`, `state` and `modified`
/// carry protocol meaning; everything else is kept as opaque JSON.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;

/// Item identity as published: feeds use either strings or integers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Text(String),
    Number(Number),
}

impl ItemId {
    /// Returns the identity normalized to a string key
    pub fn key(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Replication state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// The item was created or changed
    Updated,

    /// The item was removed (tombstone)
    Deleted,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque modification marker
///
/// Markers are only ever compared with each other. Numbers compare
/// numerically and strings lexicographically; a number and a string are
/// incomparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Modified {
    Number(Number),
    Text(String),
}

impl PartialEq for Modified {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Modified {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => compare_numbers(a, b),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

impl From<i64> for Modified {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for Modified {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One opportunity item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    pub state: ItemState,

    pub modified: Modified,

    /// Item kind as declared by the feed, e.g. "SessionSeries"
    ///
    /// Kept as published; feeds are not consistent about its type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,

    /// Opaque payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Any other top-level fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Parses an item from a raw page entry
    ///
    /// Fails when `id`, `state` or `modified` is missing or has an
    /// unexpected type.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Returns the normalized identity key
    pub fn key(&self) -> String {
        self.id.key()
    }

    /// Looks up a field of the payload
    pub fn data_field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref()?.get(name)
    }
}
