//! Calendar core for Neo Events: Events, Recurrence, Conflicts, Version History, Diffs.
//!
//! This crate provides the event model and its storage. Every event keeps a
//! linear history of immutable versions, any two of which can be diffed
//! field by field. Events of one owner may not overlap in time.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use neo_calendar::{EventStore, EventUpdate, NewEvent};
//!
//! let store = EventStore::new();
//! let start = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap();
//!
//! let event = store.create(1, NewEvent::new("Standup", start, end)).unwrap();
//! let update = EventUpdate {
//!     title: Some("Daily standup".into()),
//!     ..Default::default()
//! };
//! store.update(event.id, 1, update).unwrap();
//!
//! let diff = store.diff(event.id, 1, 2).unwrap();
//! assert_eq!(diff.changes["title"].new, "Daily standup");
//! ```

mod conflict;
mod diff;
mod error;
mod event;
mod recurrence;
mod store;
mod version;

pub use conflict::{find_conflicts, TimeRange};
pub use diff::{diff_data, EventDiff, FieldChange};
pub use error::CalendarError;
pub use event::{Event, EventUpdate, NewEvent, MAX_TITLE_LENGTH};
pub use recurrence::{validate_recurrence, Frequency, RecurrencePattern};
pub use store::EventStore;
pub use version::{ChangeType, EventSnapshot, EventVersion};

/// Result type for calendar operations.
pub type Result<T> = std::result::Result<T, CalendarError>;
