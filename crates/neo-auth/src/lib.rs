//! Authentication and authorization for Neo Events.
//!
//! This crate provides:
//! - **Users**: Account registration, lookup and profile updates
//! - **Passwords**: Argon2id hashing and verification
//! - **Sessions**: Opaque access/refresh bearer tokens with rotation
//! - **Roles**: The viewer < editor < owner hierarchy
//! - **Event Permissions**: Per-event role grants and resolution
//!
//! # Example
//!
//! ```
//! use neo_auth::{AuthStore, NewUser, Role};
//!
//! let store = AuthStore::new();
//!
//! let (alice, tokens) = store
//!     .register(NewUser {
//!         email: "alice@example.com".into(),
//!         username: "alice".into(),
//!         password: "correct horse".into(),
//!     })
//!     .unwrap();
//!
//! // The access token identifies the account
//! assert_eq!(store.authenticate(&tokens.access_token).unwrap().id, alice.id);
//!
//! // Share event 42 (owned by alice) with user 2 as an editor
//! store.grants.grant(42, 2, Role::Editor, alice.id);
//! assert!(store.check_permission(2, 42, alice.id, Role::Viewer));
//! assert!(!store.check_permission(2, 42, alice.id, Role::Owner));
//! ```

mod error;
mod grant;
mod password;
mod role;
mod session;
mod store;
mod user;

pub use error::{AuthError, Result};
pub use grant::EventPermission;
pub use password::{hash_password, verify_password};
pub use role::Role;
pub use session::{
    hash_token, Session, SessionPolicy, TokenKind, TokenPair, TokenValue,
    DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_REFRESH_TTL_DAYS,
};
pub use store::{AuthStore, GrantStore, SessionStore, UserStore};
pub use user::{
    Credential, NewUser, User, UserChanges, UserResponse, MAX_USERNAME_LENGTH,
    MIN_PASSWORD_LENGTH,
};
