//! Time-range overlap detection.

use neo_types::{EventId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Create a new range.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Check if two ranges share any instant. Back-to-back ranges do not.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// IDs of `owner`'s events overlapping `range`, ascending.
///
/// Recurring events are compared by their base instance.
pub fn find_conflicts<'a, I>(
    events: I,
    owner: UserId,
    range: &TimeRange,
    exclude: Option<EventId>,
) -> Vec<EventId>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut ids: Vec<EventId> = events
        .into_iter()
        .filter(|e| e.owner_id == owner && Some(e.id) != exclude)
        .filter(|e| e.range().overlaps(range))
        .map(|e| e.id)
        .collect();
    ids.sort_unstable();
    ids
}
