//! Event permission grants.

use crate::role::Role;
use neo_types::{EventId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A role granted to a user on an event.
///
/// Grants give access to users other than the event's owner. There is at
/// most one grant per (event, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPermission {
    /// Unique grant ID.
    pub id: u64,
    /// Event the grant applies to.
    pub event_id: EventId,
    /// User receiving the role.
    pub user_id: UserId,
    /// Role granted.
    pub role: Role,
    /// Who shared the event.
    pub granted_by: UserId,
    /// When the grant was created.
    pub created_at: Timestamp,
    /// When the role was last changed.
    pub updated_at: Timestamp,
}

impl EventPermission {
    /// Create a new grant.
    pub fn new(
        id: u64,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        granted_by: UserId,
    ) -> Self {
        let now = neo_types::now();
        Self {
            id,
            event_id,
            user_id,
            role,
            granted_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this grant confers at least the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has(required)
    }

    /// Change the granted role.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = neo_types::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_creation() {
        let grant = EventPermission::new(1, 10, 2, Role::Editor, 1);

        assert_eq!(grant.event_id, 10);
        assert_eq!(grant.user_id, 2);
        assert!(grant.has_role(Role::Viewer));
        assert!(grant.has_role(Role::Editor));
        assert!(!grant.has_role(Role::Owner));
        assert_eq!(grant.created_at, grant.updated_at);
    }

    #[test]
    fn test_grant_role_update() {
        let mut grant = EventPermission::new(1, 10, 2, Role::Viewer, 1);
        assert!(!grant.has_role(Role::Editor));

        grant.set_role(Role::Owner);
        assert!(grant.has_role(Role::Owner));
        assert!(grant.updated_at >= grant.created_at);
    }
}
