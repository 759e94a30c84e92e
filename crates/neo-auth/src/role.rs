//! Role levels and access control.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Role a user holds on an event.
///
/// Roles are ordered: Viewer < Editor < Owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can read the event, its permissions and its history.
    Viewer,
    /// Can read and edit the event.
    Editor,
    /// Full control including sharing and deletion.
    Owner,
}

impl Role {
    /// Every role, lowest first.
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Editor, Role::Owner];

    /// Check if this role grants at least the required level.
    pub fn has(&self, required: Role) -> bool {
        *self >= required
    }

    /// Numeric rank of the role (viewer = 1, owner = 3).
    pub fn rank(&self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Editor => 2,
            Role::Owner => 3,
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "owner" => Ok(Role::Owner),
            _ => Err(AuthError::InvalidInput(
                "Role must be one of: owner, editor, viewer".to_string(),
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Editor => write!(f, "editor"),
            Role::Owner => write!(f, "owner"),
        }
    }
}
