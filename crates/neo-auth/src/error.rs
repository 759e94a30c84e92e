//! Error types for the auth crate.

use neo_types::UserId;
use thiserror::Error;

/// Errors that can occur in authentication and authorization operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No account with the given id.
    #[error("User with id {0} not found")]
    UserNotFound(UserId),

    /// The email address belongs to another account.
    #[error("Email already registered")]
    EmailTaken,

    /// The username belongs to another account.
    #[error("Username already registered")]
    UsernameTaken,

    /// Invalid input was provided.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown identity or wrong password.
    #[error("Incorrect email/username or password")]
    InvalidCredentials,

    /// The account has been deactivated.
    #[error("Inactive user")]
    InactiveUser,

    /// The token is malformed, unknown, revoked, or of the wrong kind.
    #[error("Could not validate credentials")]
    InvalidToken,

    /// The token was valid but its lifetime has elapsed.
    #[error("Token has expired")]
    TokenExpired,

    /// No grant exists for the (event, user) pair.
    #[error("Permission not found")]
    PermissionNotFound,

    /// The user lacks the role required for the operation.
    #[error("Not enough permissions")]
    PermissionDenied,

    /// Password hashing failed.
    #[error("crypto error: {0}")]
    Crypto(String),
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
