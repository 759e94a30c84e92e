//! # Neo Server
//!
//! HTTP API for Neo Events, a shared calendar backend.
//!
//! Users register and log in with opaque bearer tokens, create one-time or
//! recurring events, share them with other users as viewers, editors or
//! co-owners, and browse a linear version history of every edit with
//! field-level diffs between any two versions.
//!
//! ## Modules
//!
//! - [`api`] - Application state, router assembly and error mapping
//! - [`auth_api`] - Registration, login, token refresh and logout
//! - [`users_api`] - Account listing and self-service updates
//! - [`events_api`] - Events, sharing and version history
//! - [`extract`] - Bearer-token authentication extractor
//! - [`config`] - Layered server configuration
//! - [`observability`] - Structured logging and request IDs
//! - [`validation`] - Request body validation
//!
//! ## Example
//!
//! ```rust,no_run
//! use neo_server::{api::{create_app, AppState}, config::ServerConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ServerConfig::load(None)?;
//! let app = create_app(AppState::from_config(&config), &config);
//!
//! let listener = tokio::net::TcpListener::bind(config.api_addr).await?;
//! axum::serve(
//!     listener,
//!     axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth_api;
pub mod config;
pub mod events_api;
pub mod extract;
pub mod observability;
pub mod users_api;
pub mod validation;
