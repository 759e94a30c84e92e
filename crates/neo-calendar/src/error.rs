//! Error types for calendar operations.

use neo_types::EventId;
use thiserror::Error;

/// Errors that can occur during calendar operations.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// Event not found.
    #[error("Event not found")]
    EventNotFound { id: EventId },

    /// No version with the given number exists for the event.
    #[error("Version not found")]
    VersionNotFound { event_id: EventId, version: u32 },

    /// The event's time range overlaps other events of the same owner.
    #[error("Event conflicts with existing events")]
    Conflict { conflicting: Vec<EventId> },

    /// Validation error.
    #[error("{0}")]
    Validation(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
