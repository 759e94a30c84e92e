//! Bearer session tokens.
//!
//! A login issues a pair of opaque tokens: a short-lived access token sent
//! with every request and a longer-lived refresh token that can be exchanged
//! for a new pair. Only SHA-256 digests of the tokens are kept.

use chrono::Duration;
use neo_types::{Timestamp, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{AuthError, Result};

/// Token format: neo_<kind>_<secret>
/// Kind: `at` (access) or `rt` (refresh)
/// Secret: 40 alphanumeric characters (mixed case)
const TOKEN_SECRET_LEN: usize = 40;

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;

/// Default refresh token lifetime in days.
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Authenticates API requests.
    Access,
    /// Can only be exchanged for a new token pair.
    Refresh,
}

impl TokenKind {
    fn tag(&self) -> &'static str {
        match self {
            TokenKind::Access => "at",
            TokenKind::Refresh => "rt",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "at" => Some(TokenKind::Access),
            "rt" => Some(TokenKind::Refresh),
            _ => None,
        }
    }
}

/// Lifetimes applied to newly issued tokens.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }
}

/// A stored session token.
#[derive(Debug, Clone)]
pub struct Session {
    /// Pair the token was issued in; access and refresh tokens share it.
    pub pair_id: u64,
    /// Owner of the session.
    pub user_id: UserId,
    /// Access or refresh.
    pub kind: TokenKind,
    /// SHA-256 hex digest of the full token.
    pub token_hash: String,
    /// When the token was issued.
    pub created_at: Timestamp,
    /// When the token stops being accepted.
    pub expires_at: Timestamp,
}

impl Session {
    /// Check if the token is expired at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Plaintext tokens handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// The plaintext token value (kind + secret).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValue {
    pub kind: TokenKind,
    pub secret: String,
}

impl TokenValue {
    /// Generate a new random token value.
    pub fn generate(kind: TokenKind) -> Self {
        let mut rng = rand::thread_rng();

        let secret: String = (0..TOKEN_SECRET_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..62u8);
                if idx < 10 {
                    (b'0' + idx) as char
                } else if idx < 36 {
                    (b'a' + idx - 10) as char
                } else {
                    (b'A' + idx - 36) as char
                }
            })
            .collect();

        Self { kind, secret }
    }

    /// Parse a token string into kind and secret.
    pub fn parse(token: &str) -> Result<Self> {
        let mut parts = token.trim().splitn(3, '_');
        let (Some("neo"), Some(tag), Some(secret)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let kind = TokenKind::from_tag(tag).ok_or(AuthError::InvalidToken)?;

        if secret.len() != TOKEN_SECRET_LEN || !secret.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthError::InvalidToken);
        }

        Ok(Self {
            kind,
            secret: secret.to_string(),
        })
    }

    /// SHA-256 hex digest of the full token string.
    pub fn digest(&self) -> String {
        hash_token(&self.to_string())
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "neo_{}_{}", self.kind.tag(), self.secret)
    }
}

/// Hash a token string for storage.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_parse() {
        let value = TokenValue::generate(TokenKind::Access);
        let plaintext = value.to_string();
        assert!(plaintext.starts_with("neo_at_"));

        let parsed = TokenValue::parse(&plaintext).unwrap();
        assert_eq!(parsed, value);
        assert_eq!(parsed.digest(), hash_token(&plaintext));

        let refresh = TokenValue::generate(TokenKind::Refresh).to_string();
        assert!(refresh.starts_with("neo_rt_"));
        assert_eq!(TokenValue::parse(&refresh).unwrap().kind, TokenKind::Refresh);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TokenValue::parse("").is_err());
        assert!(TokenValue::parse("neo_at_short").is_err());
        assert!(TokenValue::parse(&format!("ghp_at_{}", "a".repeat(40))).is_err());
        assert!(TokenValue::parse(&format!("neo_xx_{}", "a".repeat(40))).is_err());
        assert!(TokenValue::parse(&format!("neo_at_{}!", "a".repeat(39))).is_err());
    }

    #[test]
    fn test_secrets_are_unique() {
        let a = TokenValue::generate(TokenKind::Access);
        let b = TokenValue::generate(TokenKind::Access);
        assert_ne!(a.secret, b.secret);
    }

    #[test]
    fn test_expiry() {
        let now = neo_types::now();
        let session = Session {
            pair_id: 1,
            user_id: 1,
            kind: TokenKind::Access,
            token_hash: String::new(),
            created_at: now,
            expires_at: now + Duration::minutes(5),
        };
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::minutes(5)));
    }
}
