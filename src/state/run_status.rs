/// How a consumer run ended
///
/// Every status comes paired with a resumable `ConsumerState`; the status only
/// tells the caller whether resuming now is pointless (`Terminal`) or worth a
/// later retry (everything else).
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run stopped before reaching the live edge of the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StallReason {
    /// The page could not be fetched within the attempt budget
    Unreachable { url: String, attempts: u32 },

    /// The page body is not an RPDE page
    MalformedPage { url: String, message: String },

    /// The page's `next` link could not be turned into an absolute URL
    UnresolvableNext { url: String, raw: String },
}

impl StallReason {
    /// URL of the page the run stopped at
    pub fn url(&self) -> &str {
        match self {
            Self::Unreachable { url, .. }
            | Self::MalformedPage { url, .. }
            | Self::UnresolvableNext { url, .. } => url,
        }
    }
}

impl fmt::Display for StallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable { url, attempts } => {
                write!(f, "unreachable after {} attempts: {}", attempts, url)
            }
            Self::MalformedPage { url, message } => {
                write!(f, "malformed page {}: {}", url, message)
            }
            Self::UnresolvableNext { url, raw } => {
                write!(f, "cannot resolve next link '{}' from {}", raw, url)
            }
        }
    }
}

/// Final status of one consumer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// The feed echoed the current page as its own successor
    Terminal,

    /// The run stopped early; resume later
    Stalled { reason: StallReason },

    /// The caller cancelled the run
    Cancelled,

    /// The caller's page cap was reached
    PageLimit { pages: usize },
}

impl RunStatus {
    /// Returns true if the walk reached the live edge of the feed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Returns true if the walk stopped on a fetch or data problem
    pub fn is_stalled(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => write!(f, "terminal"),
            Self::Stalled { reason } => write!(f, "stalled ({})", reason),
            Self::Cancelled => write!(f, "cancelled"),
            Self::PageLimit { pages } => write!(f, "page limit reached ({} pages)", pages),
        }
    }
}
