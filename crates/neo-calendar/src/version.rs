//! Event version history.

use neo_types::{EventId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{diff::diff_data, event::Event, recurrence::RecurrencePattern, Result};

/// The fields of an event that are tracked across versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub title: String,
    pub description: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub location: Option<String>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl EventSnapshot {
    /// Names of every tracked field, in declaration order.
    pub const FIELDS: [&'static str; 7] = [
        "title",
        "description",
        "start_time",
        "end_time",
        "location",
        "is_recurring",
        "recurrence_pattern",
    ];

    /// Serialize as a JSON object.
    pub fn to_data(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<&Event> for EventSnapshot {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location.clone(),
            is_recurring: event.is_recurring,
            recurrence_pattern: event.recurrence_pattern.clone(),
        }
    }
}

/// What produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
}

/// An immutable entry in an event's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventVersion {
    /// Unique version ID.
    pub id: u64,
    /// Event this version belongs to.
    pub event_id: EventId,
    /// Position in the event's history, starting at 1.
    pub version_number: u32,
    /// Snapshot of the tracked fields.
    pub data: Value,
    /// User whose action produced this version.
    pub created_by_id: UserId,
    /// When the version was recorded.
    pub created_at: Timestamp,
    /// Human-readable note.
    pub comment: Option<String>,
    /// Create or update.
    pub change_type: ChangeType,
    /// Fields that changed relative to the previous version.
    pub changed_fields: Option<Value>,
}

impl EventVersion {
    /// Version 1 of a freshly created event.
    pub fn initial(id: u64, event: &Event, created_by: UserId) -> Result<Self> {
        Ok(Self {
            id,
            event_id: event.id,
            version_number: 1,
            data: event.snapshot().to_data()?,
            created_by_id: created_by,
            created_at: neo_types::now(),
            comment: Some("Initial version".to_string()),
            change_type: ChangeType::Create,
            changed_fields: Some(json!({ "all": EventSnapshot::FIELDS })),
        })
    }

    /// The version following `previous`, recording `event`'s new state.
    pub fn next(
        id: u64,
        previous: &EventVersion,
        event: &Event,
        created_by: UserId,
    ) -> Result<Self> {
        let data = event.snapshot().to_data()?;
        let changes = diff_data(&previous.data, &data);

        Ok(Self {
            id,
            event_id: event.id,
            version_number: previous.version_number + 1,
            data,
            created_by_id: created_by,
            created_at: neo_types::now(),
            comment: Some("Event updated".to_string()),
            change_type: ChangeType::Update,
            changed_fields: Some(serde_json::to_value(changes)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NewEvent;
    use chrono::{TimeZone, Utc};

    fn event() -> Event {
        let start = Utc.with_ymd_and_hms(2025, 2, 1, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 1, 15, 0, 0).unwrap();
        Event::new(3, 9, NewEvent::new("Lunch", start, end))
    }

    #[test]
    fn test_snapshot_data() {
        let data = event().snapshot().to_data().unwrap();
        let object = data.as_object().unwrap();

        assert_eq!(object.len(), EventSnapshot::FIELDS.len());
        for field in EventSnapshot::FIELDS {
            assert!(object.contains_key(field), "missing {}", field);
        }
        assert_eq!(data["title"], "Lunch");
        assert_eq!(data["description"], Value::Null);
        assert_eq!(data["is_recurring"], false);
    }

    #[test]
    fn test_initial_version() {
        let version = EventVersion::initial(1, &event(), 9).unwrap();
        assert_eq!(version.version_number, 1);
        assert_eq!(version.event_id, 3);
        assert_eq!(version.change_type, ChangeType::Create);
        assert_eq!(version.comment.as_deref(), Some("Initial version"));
        assert_eq!(
            version.changed_fields.unwrap()["all"].as_array().unwrap().len(),
            7
        );
    }

    #[test]
    fn test_next_version() {
        let mut event = event();
        let first = EventVersion::initial(1, &event, 9).unwrap();

        event.title = "Long lunch".into();
        event.location = Some("Cafe".into());
        let second = EventVersion::next(2, &first, &event, 4).unwrap();

        assert_eq!(second.version_number, 2);
        assert_eq!(second.created_by_id, 4);
        assert_eq!(second.change_type, ChangeType::Update);
        assert_eq!(second.comment.as_deref(), Some("Event updated"));

        let changed = second.changed_fields.clone().unwrap();
        assert_eq!(
            changed,
            json!({
                "location": {"old": null, "new": "Cafe"},
                "title": {"old": "Lunch", "new": "Long lunch"},
            })
        );

        // An unchanged save still records a version with nothing changed
        let third = EventVersion::next(3, &second, &event, 4).unwrap();
        assert_eq!(third.version_number, 3);
        assert_eq!(third.changed_fields.unwrap(), json!({}));
    }

    #[test]
    fn test_serde() {
        let version = EventVersion::initial(1, &event(), 9).unwrap();
        let json = serde_json::to_value(&version).unwrap();
        assert_eq!(json["change_type"], "create");
        assert_eq!(json["data"]["title"], "Lunch");
    }
}
