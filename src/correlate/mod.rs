//! Cross-feed correlation
//!
//! Parent and child opportunities (a session series and its sessions, a
//! facility use and its slots) are published in separate feeds. This module
//! finds a feed's sibling among known feed URLs and links items across the
//! two snapshots.

mod partner;
mod superevent;

pub use partner::{partner_feed_url, FeedRole};
pub use superevent::{
    find_subevents, find_superevents, last_segment, parent_ids, parent_reference, ParentIds,
};
