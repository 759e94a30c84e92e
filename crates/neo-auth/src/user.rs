//! User account types.

use neo_types::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 100;

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Email address, stored lowercase.
    pub email: String,
    /// Unique username.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Deactivated accounts cannot log in or use their tokens.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: Timestamp,
    /// When the account was last updated.
    pub updated_at: Timestamp,
}

impl User {
    /// Create a new active user.
    pub fn new(id: UserId, email: String, username: String, password_hash: String) -> Self {
        let now = neo_types::now();
        Self {
            id,
            email,
            username,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate a username format.
    ///
    /// Usernames are 1-100 characters of letters, digits, `_`, `-` and `.`,
    /// starting with a letter or digit.
    pub fn validate_username(username: &str) -> Result<(), String> {
        let Some(first) = username.chars().next() else {
            return Err("Username cannot be empty".to_string());
        };

        if username.len() > MAX_USERNAME_LENGTH {
            return Err(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LENGTH
            ));
        }

        if !first.is_ascii_alphanumeric() {
            return Err("Username must start with a letter or number".to_string());
        }

        if let Some(c) = username
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.'))
        {
            return Err(format!("Invalid character in username: {}", c));
        }

        Ok(())
    }

    /// Validate a password's strength.
    pub fn validate_password(password: &str) -> Result<(), String> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            ));
        }
        Ok(())
    }

    /// Canonical form of an email address.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Update the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = neo_types::now();
    }

    /// Convert to the public representation (no password hash).
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Data required to register an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Changes a user may apply to their own account.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// How a user identifies themselves when logging in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Email(String),
    Username(String),
}
