//! Calendar event types.

use neo_types::{EventId, Timestamp, UserId};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    conflict::TimeRange,
    error::CalendarError,
    recurrence::{validate_recurrence, RecurrencePattern},
    version::EventSnapshot,
    Result,
};

/// Maximum length of an event title.
pub const MAX_TITLE_LENGTH: usize = 256;

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID.
    pub id: EventId,
    /// Event title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Start of the (first) occurrence.
    pub start_time: Timestamp,
    /// End of the (first) occurrence; strictly after `start_time`.
    pub end_time: Timestamp,
    /// Where the event takes place.
    pub location: Option<String>,
    /// Whether the event repeats.
    pub is_recurring: bool,
    /// Present iff `is_recurring`.
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// User who created the event.
    pub owner_id: UserId,
    /// When the event was created.
    pub created_at: Timestamp,
    /// When the event was last updated.
    pub updated_at: Timestamp,
}

impl Event {
    /// Build an event from creation input. Does not validate.
    pub fn new(id: EventId, owner_id: UserId, input: NewEvent) -> Self {
        let now = neo_types::now();
        Self {
            id,
            title: input.title,
            description: input.description,
            start_time: input.start_time,
            end_time: input.end_time,
            location: input.location,
            is_recurring: input.is_recurring,
            recurrence_pattern: input.recurrence_pattern,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// The time range of the base instance.
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// The versioned fields of the event.
    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot::from(self)
    }

    /// Check title, time order and recurrence consistency.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CalendarError::Validation(
                "Title must not be empty".to_string(),
            ));
        }
        if self.title.chars().count() > MAX_TITLE_LENGTH {
            return Err(CalendarError::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if self.end_time <= self.start_time {
            return Err(CalendarError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
        validate_recurrence(
            self.is_recurring,
            self.recurrence_pattern.as_ref(),
            self.start_time,
        )
    }

    /// Merge an update into a copy of this event.
    ///
    /// Turning recurrence off without sending a pattern drops the stored one.
    pub fn merged(&self, update: &EventUpdate) -> Event {
        let mut event = self.clone();

        if let Some(title) = &update.title {
            event.title = title.clone();
        }
        if let Some(description) = &update.description {
            event.description = description.clone();
        }
        if let Some(start) = update.start_time {
            event.start_time = start;
        }
        if let Some(end) = update.end_time {
            event.end_time = end;
        }
        if let Some(location) = &update.location {
            event.location = location.clone();
        }
        if let Some(is_recurring) = update.is_recurring {
            event.is_recurring = is_recurring;
            if !is_recurring && update.recurrence_pattern.is_none() {
                event.recurrence_pattern = None;
            }
        }
        if let Some(pattern) = &update.recurrence_pattern {
            event.recurrence_pattern = pattern.clone();
        }

        event
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl NewEvent {
    /// A one-time event with no description or location.
    pub fn new(title: impl Into<String>, start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_time,
            end_time,
            location: None,
            is_recurring: false,
            recurrence_pattern: None,
        }
    }

    /// Make the event recurring with the given pattern.
    pub fn recurring(mut self, pattern: RecurrencePattern) -> Self {
        self.is_recurring = true;
        self.recurrence_pattern = Some(pattern);
        self
    }
}

/// Partial update of an event.
///
/// Nullable fields use `Option<Option<_>>`: absent leaves the value alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub start_time: Option<Timestamp>,
    #[serde(default)]
    pub end_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient_bool_opt")]
    pub is_recurring: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
}

impl EventUpdate {
    /// Whether the update moves the event in time.
    pub fn changes_time(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

fn nullable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    Text(String),
}

impl BoolOrString {
    fn into_bool<E: serde::de::Error>(self) -> std::result::Result<bool, E> {
        match self {
            BoolOrString::Bool(b) => Ok(b),
            BoolOrString::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            BoolOrString::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            BoolOrString::Text(s) => Err(E::custom(format!(
                "is_recurring must be a boolean, got {:?}",
                s
            ))),
        }
    }
}

/// Accept `true`/`false` as booleans or strings.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    BoolOrString::deserialize(deserializer)?.into_bool()
}

fn lenient_bool_opt<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BoolOrString>::deserialize(deserializer)?
        .map(BoolOrString::into_bool)
        .transpose()
}
