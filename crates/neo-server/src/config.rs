//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional config file
//! (YAML, TOML or JSON by extension), then `NEO_*` environment variables.
//! Command-line flags are applied on top by the binary.

use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use neo_auth::{SessionPolicy, DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_REFRESH_TTL_DAYS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use crate::observability::LogFormat;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "NEO";

/// Default mount point of the API routes.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Configuration for the Neo Events server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address.
    pub api_addr: SocketAddr,
    /// Path prefix for API routes.
    pub api_prefix: String,
    /// Name reported by the health endpoint.
    pub project_name: String,
    /// Access token lifetime.
    pub access_token_ttl_minutes: i64,
    /// Refresh token lifetime.
    pub refresh_token_ttl_days: i64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Allow cross-origin requests from anywhere.
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            project_name: "Neo Events".to_string(),
            access_token_ttl_minutes: DEFAULT_ACCESS_TTL_MINUTES,
            refresh_token_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            cors_allow_any: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(path, None)
    }

    fn build(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: ServerConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "access_token_ttl_minutes must be positive".to_string(),
            ));
        }
        if self.refresh_token_ttl_days <= 0 {
            return Err(ConfigError::Message(
                "refresh_token_ttl_days must be positive".to_string(),
            ));
        }
        if !self.api_prefix.is_empty()
            && (!self.api_prefix.starts_with('/') || self.api_prefix.ends_with('/'))
        {
            return Err(ConfigError::Message(format!(
                "api_prefix must start with '/' and not end with '/': {:?}",
                self.api_prefix
            )));
        }
        Ok(())
    }

    /// Token lifetimes for the session store.
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            access_ttl: Duration::minutes(self.access_token_ttl_minutes),
            refresh_ttl: Duration::days(self.refresh_token_ttl_days),
        }
    }
}
