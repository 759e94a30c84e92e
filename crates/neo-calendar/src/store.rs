//! In-memory storage for events and their history.

use neo_types::{EventId, Page, UserId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    conflict::{find_conflicts, TimeRange},
    diff::EventDiff,
    error::CalendarError,
    event::{Event, EventUpdate, NewEvent},
    version::EventVersion,
    Result,
};

/// In-memory store for calendar events.
///
/// Thread-safe storage for events and their version histories. Writers hold
/// the event lock for the whole operation, so a conflict check and the write
/// it guards are atomic. Locks are always taken events first, then versions.
#[derive(Debug, Default)]
pub struct EventStore {
    /// Events indexed by id.
    events: RwLock<HashMap<EventId, Event>>,
    /// Version history per event, ascending by number.
    versions: RwLock<HashMap<EventId, Vec<EventVersion>>>,
    /// Counter for event IDs.
    next_event_id: AtomicU64,
    /// Counter for version IDs.
    next_version_id: AtomicU64,
}

impl EventStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_event_id(&self) -> EventId {
        self.next_event_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_version_id(&self) -> u64 {
        self.next_version_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    // ==================== Events ====================

    /// Creates an event owned by `owner` and records version 1.
    pub fn create(&self, owner: UserId, input: NewEvent) -> Result<Event> {
        let mut events = self.events.write();

        let candidate = Event::new(0, owner, input);
        candidate.validate()?;

        let conflicting = find_conflicts(events.values(), owner, &candidate.range(), None);
        if !conflicting.is_empty() {
            return Err(CalendarError::Conflict { conflicting });
        }

        let event = Event {
            id: self.next_event_id(),
            ..candidate
        };
        let initial = EventVersion::initial(self.next_version_id(), &event, owner)?;

        self.versions.write().insert(event.id, vec![initial]);
        events.insert(event.id, event.clone());

        tracing::debug!(event_id = event.id, owner_id = owner, "Event created");

        Ok(event)
    }

    /// Gets an event by id.
    pub fn get(&self, id: EventId) -> Result<Event> {
        self.events
            .read()
            .get(&id)
            .cloned()
            .ok_or(CalendarError::EventNotFound { id })
    }

    /// Applies an update on behalf of `actor` and appends a version.
    ///
    /// The merged event is validated as a whole. When the update moves the
    /// event in time it is checked against the owner's other events.
    pub fn update(&self, id: EventId, actor: UserId, update: EventUpdate) -> Result<Event> {
        let mut events = self.events.write();

        let current = events
            .get(&id)
            .ok_or(CalendarError::EventNotFound { id })?;

        let mut merged = current.merged(&update);
        merged.validate()?;

        if update.changes_time() {
            let conflicting =
                find_conflicts(events.values(), merged.owner_id, &merged.range(), Some(id));
            if !conflicting.is_empty() {
                return Err(CalendarError::Conflict { conflicting });
            }
        }

        merged.updated_at = neo_types::now();

        let mut versions = self.versions.write();
        let history = versions.entry(id).or_default();
        let version = match history.last() {
            Some(previous) => EventVersion::next(self.next_version_id(), previous, &merged, actor)?,
            None => EventVersion::initial(self.next_version_id(), &merged, actor)?,
        };
        let number = version.version_number;
        history.push(version);

        events.insert(id, merged.clone());

        tracing::debug!(event_id = id, user_id = actor, version = number, "Event updated");

        Ok(merged)
    }

    /// Deletes an event together with its history.
    pub fn delete(&self, id: EventId) -> Result<Event> {
        let mut events = self.events.write();
        let removed = events
            .remove(&id)
            .ok_or(CalendarError::EventNotFound { id })?;
        self.versions.write().remove(&id);

        tracing::debug!(event_id = id, "Event deleted");

        Ok(removed)
    }

    /// Events owned by `user` or listed in `shared`, by start time then id.
    pub fn list_for_user(&self, user: UserId, shared: &[EventId], page: Page) -> Vec<Event> {
        let shared: HashSet<EventId> = shared.iter().copied().collect();

        let mut events: Vec<Event> = self
            .events
            .read()
            .values()
            .filter(|e| e.owner_id == user || shared.contains(&e.id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));

        page.apply(events).collect()
    }

    /// IDs of `owner`'s events overlapping `range`, optionally excluding one.
    pub fn conflicts(
        &self,
        owner: UserId,
        range: &TimeRange,
        exclude: Option<EventId>,
    ) -> Vec<EventId> {
        find_conflicts(self.events.read().values(), owner, range, exclude)
    }

    /// Counts stored events.
    pub fn count(&self) -> usize {
        self.events.read().len()
    }

    // ==================== Versions ====================

    /// Full history of an event, oldest first.
    pub fn versions(&self, event_id: EventId) -> Result<Vec<EventVersion>> {
        let events = self.events.read();
        if !events.contains_key(&event_id) {
            return Err(CalendarError::EventNotFound { id: event_id });
        }
        Ok(self
            .versions
            .read()
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    /// A single version of an event.
    pub fn version(&self, event_id: EventId, number: u32) -> Result<EventVersion> {
        self.versions(event_id)?
            .into_iter()
            .find(|v| v.version_number == number)
            .ok_or(CalendarError::VersionNotFound {
                event_id,
                version: number,
            })
    }

    /// The latest version number of an event.
    pub fn latest_version(&self, event_id: EventId) -> Result<u32> {
        Ok(self
            .versions(event_id)?
            .last()
            .map_or(0, |v| v.version_number))
    }

    /// Field-level changes from version `v1` to version `v2`.
    pub fn diff(&self, event_id: EventId, v1: u32, v2: u32) -> Result<EventDiff> {
        let from = self.version(event_id, v1)?;
        let to = self.version(event_id, v2)?;
        Ok(EventDiff::between(&from, &to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, RecurrencePattern};
    use crate::version::ChangeType;
    use chrono::{TimeZone, Utc};
    use neo_types::Timestamp;
    use serde_json::json;

    fn at(day: u32, hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0).unwrap()
    }

    fn meeting(title: &str, day: u32, start: u32, end: u32) -> NewEvent {
        NewEvent::new(title, at(day, start), at(day, end))
    }

    #[test]
    fn test_create_and_get() {
        let store = EventStore::new();

        let event = store.create(1, meeting("Kickoff", 1, 9, 10)).unwrap();
        assert_eq!(event.id, 1);
        assert_eq!(event.owner_id, 1);
        assert_eq!(store.get(1).unwrap(), event);

        let second = store.create(1, meeting("Review", 1, 10, 11)).unwrap();
        assert_eq!(second.id, 2);

        assert!(matches!(
            store.get(99),
            Err(CalendarError::EventNotFound { id: 99 })
        ));
    }

    #[test]
    fn test_create_rejects_invalid() {
        let store = EventStore::new();
        let err = store.create(1, meeting("Backwards", 1, 10, 9)).unwrap_err();
        assert_eq!(err.to_string(), "End time must be after start time");
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_create_conflicts() {
        let store = EventStore::new();
        store.create(1, meeting("A", 1, 9, 11)).unwrap();

        let err = store.create(1, meeting("B", 1, 10, 12)).unwrap_err();
        match err {
            CalendarError::Conflict { conflicting } => assert_eq!(conflicting, vec![1]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err_message(&store, meeting("C", 1, 8, 10)),
            "Event conflicts with existing events"
        );

        // Other owners and adjacent slots are fine
        assert!(store.create(2, meeting("B", 1, 10, 12)).is_ok());
        assert!(store.create(1, meeting("C", 1, 11, 12)).is_ok());
        assert_eq!(store.count(), 3);
    }

    fn err_message(store: &EventStore, input: NewEvent) -> String {
        store.create(1, input).unwrap_err().to_string()
    }

    #[test]
    fn test_recurring_event() {
        let store = EventStore::new();
        let mut weekly = RecurrencePattern::new(Frequency::Weekly);
        weekly.days_of_week = Some(vec![1, 3]);

        let event = store
            .create(1, meeting("Gym", 1, 7, 8).recurring(weekly))
            .unwrap();
        assert!(event.is_recurring);

        let weekly = RecurrencePattern::new(Frequency::Weekly);
        let missing = store.create(1, meeting("Yoga", 2, 7, 8).recurring(weekly));
        assert_eq!(
            missing.unwrap_err().to_string(),
            "Days of week are required for weekly recurrence"
        );
    }

    #[test]
    fn test_update_appends_versions() {
        let store = EventStore::new();
        let event = store.create(1, meeting("Sync", 1, 9, 10)).unwrap();

        let updated = store
            .update(
                event.id,
                2,
                EventUpdate {
                    title: Some("Weekly sync".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Weekly sync");
        assert_eq!(updated.owner_id, 1);
        assert!(updated.updated_at >= event.updated_at);

        store
            .update(
                event.id,
                1,
                EventUpdate {
                    location: Some(Some("Room 4".into())),
                    ..Default::default()
                },
            )
            .unwrap();

        let versions = store.versions(event.id).unwrap();
        let numbers: Vec<u32> = versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(versions[0].change_type, ChangeType::Create);
        assert_eq!(versions[1].change_type, ChangeType::Update);
        assert_eq!(versions[1].created_by_id, 2);
        assert_eq!(
            versions[1].changed_fields,
            Some(json!({"title": {"old": "Sync", "new": "Weekly sync"}}))
        );
        assert_eq!(store.latest_version(event.id).unwrap(), 3);
    }

    #[test]
    fn test_update_validation_leaves_state() {
        let store = EventStore::new();
        let event = store.create(1, meeting("Sync", 1, 9, 10)).unwrap();

        let err = store
            .update(
                event.id,
                1,
                EventUpdate {
                    start_time: Some(at(1, 11)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "End time must be after start time");

        assert_eq!(store.get(event.id).unwrap(), event);
        assert_eq!(store.versions(event.id).unwrap().len(), 1);

        assert!(matches!(
            store.update(42, 1, EventUpdate::default()),
            Err(CalendarError::EventNotFound { id: 42 })
        ));
    }

    #[test]
    fn test_update_conflicts() {
        let store = EventStore::new();
        let first = store.create(1, meeting("A", 1, 9, 10)).unwrap();
        let second = store.create(1, meeting("B", 1, 11, 12)).unwrap();

        // Moving onto another event conflicts
        let result = store.update(
            second.id,
            1,
            EventUpdate {
                start_time: Some(at(1, 9)),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(CalendarError::Conflict { .. })));

        // Moving within its own slot does not conflict with itself
        assert!(store
            .update(
                first.id,
                1,
                EventUpdate {
                    end_time: Some(at(1, 11)),
                    ..Default::default()
                },
            )
            .is_ok());

        // Conflicts are checked against the owner's events even when another user edits
        let result = store.update(
            first.id,
            5,
            EventUpdate {
                end_time: Some(at(1, 12)),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(CalendarError::Conflict { conflicting }) if conflicting == vec![second.id]
        ));
    }

    #[test]
    fn test_delete() {
        let store = EventStore::new();
        let event = store.create(1, meeting("Gone", 1, 9, 10)).unwrap();

        let removed = store.delete(event.id).unwrap();
        assert_eq!(removed.id, event.id);
        assert!(store.get(event.id).is_err());
        assert!(matches!(
            store.versions(event.id),
            Err(CalendarError::EventNotFound { .. })
        ));
        assert!(store.delete(event.id).is_err());

        // The slot is free again
        assert!(store.create(1, meeting("Back", 1, 9, 10)).is_ok());
    }

    #[test]
    fn test_list_for_user() {
        let store = EventStore::new();
        let late = store.create(1, meeting("Late", 3, 9, 10)).unwrap();
        let early = store.create(1, meeting("Early", 1, 9, 10)).unwrap();
        let shared = store.create(2, meeting("Shared", 2, 9, 10)).unwrap();
        store.create(2, meeting("Private", 2, 11, 12)).unwrap();

        let ids: Vec<EventId> = store
            .list_for_user(1, &[shared.id], Page::default())
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![early.id, shared.id, late.id]);

        let page: Vec<EventId> = store
            .list_for_user(1, &[shared.id], Page::new(1, 1))
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(page, vec![shared.id]);

        assert_eq!(store.list_for_user(3, &[], Page::default()).len(), 0);
    }

    #[test]
    fn test_versions_and_diff() {
        let store = EventStore::new();
        let event = store.create(1, meeting("Plan", 1, 9, 10)).unwrap();
        store
            .update(
                event.id,
                1,
                EventUpdate {
                    title: Some("Plan v2".into()),
                    description: Some(Some("Agenda".into())),
                    ..Default::default()
                },
            )
            .unwrap();

        let v2 = store.version(event.id, 2).unwrap();
        assert_eq!(v2.data["title"], "Plan v2");

        assert!(matches!(
            store.version(event.id, 3),
            Err(CalendarError::VersionNotFound { version: 3, .. })
        ));
        assert_eq!(
            store.version(event.id, 0).unwrap_err().to_string(),
            "Version not found"
        );

        let diff = store.diff(event.id, 1, 2).unwrap();
        assert_eq!(diff.version1, 1);
        assert_eq!(diff.version2, 2);
        assert_eq!(
            diff.changes.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["description", "title"]
        );
        assert_eq!(diff.changes["title"].old, json!("Plan"));

        let reverse = store.diff(event.id, 2, 1).unwrap();
        assert_eq!(reverse.changes["title"].old, json!("Plan v2"));

        assert!(store.diff(event.id, 2, 2).unwrap().is_empty());
        assert!(store.diff(event.id, 1, 9).is_err());
    }
}
