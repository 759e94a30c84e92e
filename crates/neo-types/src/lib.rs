//! Common types used throughout `neo`.
//!
//! Identifiers, timestamps, and the skip/limit pagination shared by the
//! auth, calendar and server crates.

mod page;

pub use page::{Page, DEFAULT_LIMIT, MAX_LIMIT};

/// Unique identifier of a user account.
pub type UserId = u64;

/// Unique identifier of a calendar event.
pub type EventId = u64;

/// A point in time, always UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Returns the current time.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}
