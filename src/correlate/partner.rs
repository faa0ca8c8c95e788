/// Sibling ("partner") feed URL guessing
///
/// Publishers name their feeds after the opportunity type they carry, with
/// little agreement on spelling. Given one feed URL, this module swaps the
/// type fragment for each spelling of the counterpart type and checks the
/// result against the feeds actually published.
use std::collections::HashSet;

/// Structural role of a feed in a parent/child pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedRole {
    SessionSeries,
    ScheduledSession,
    FacilityUse,
    Slot,
}

impl FeedRole {
    /// All roles, in matching priority order
    pub const ALL: [FeedRole; 4] = [
        FeedRole::SessionSeries,
        FeedRole::ScheduledSession,
        FeedRole::FacilityUse,
        FeedRole::Slot,
    ];

    /// The role whose items pair with this role's items
    pub fn counterpart(&self) -> FeedRole {
        match self {
            Self::SessionSeries => Self::ScheduledSession,
            Self::ScheduledSession => Self::SessionSeries,
            Self::FacilityUse => Self::Slot,
            Self::Slot => Self::FacilityUse,
        }
    }

    /// URL fragments naming this role, in substitution priority order
    ///
    /// Order matters: longer and more specific spellings come first so they
    /// are tried before the fragments they contain.
    pub fn url_parts(&self) -> &'static [&'static str] {
        match self {
            Self::SessionSeries => &["session-series", "sessionseries"],
            Self::ScheduledSession => &[
                "scheduled-sessions",
                "scheduledsessions",
                "scheduled-session",
                "scheduledsession",
            ],
            Self::FacilityUse => &[
                "individual-facility-uses",
                "individual-facilityuses",
                "individualfacility-uses",
                "individualfacilityuses",
                "individual-facility-use",
                "individual-facilityuse",
                "individualfacility-use",
                "individualfacilityuse",
                "facility-uses",
                "facilityuses",
                "facility-use",
                "facilityuse",
            ],
            Self::Slot => &[
                "facility-uses/events",
                "facility-uses/event",
                "facility-use-slots",
                "facility-use-slot",
                "slots",
                "slot",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionSeries => "SessionSeries",
            Self::ScheduledSession => "ScheduledSession",
            Self::FacilityUse => "FacilityUse",
            Self::Slot => "Slot",
        }
    }
}

/// Guesses the sibling of `url` among `known_urls`
///
/// Roles and their fragments are scanned in priority order. For every
/// fragment found in `url`, each counterpart fragment is substituted in turn
/// (all occurrences) and the first candidate present in `known_urls` wins. A
/// fragment whose substitutions all miss does not end the search.
///
/// # Examples
///
/// ```
/// use openactive_rpde::correlate::partner_feed_url;
/// use std::collections::HashSet;
///
/// let known: HashSet<String> = ["https://ex.org/feeds/session-series/9".to_string()].into();
/// assert_eq!(
///     partner_feed_url("https://ex.org/feeds/scheduled-sessions/9", &known).as_deref(),
///     Some("https://ex.org/feeds/session-series/9")
/// );
/// ```
pub fn partner_feed_url(url: &str, known_urls: &HashSet<String>) -> Option<String> {
    for role in FeedRole::ALL {
        for part in role.url_parts() {
            if !url.contains(part) {
                continue;
            }
            for counterpart in role.counterpart().url_parts() {
                let candidate = url.replace(part, counterpart);
                if known_urls.contains(&candidate) {
                    tracing::debug!(
                        "Matched {} feed {} to {} feed {}",
                        role.as_str(),
                        url,
                        role.counterpart().as_str(),
                        candidate
                    );
                    return Some(candidate);
                }
            }
        }
    }

    None
}
