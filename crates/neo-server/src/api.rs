//! HTTP API: shared state, router assembly and error mapping.

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
        State,
    },
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use neo_auth::{AuthError, AuthStore};
use neo_calendar::{CalendarError, EventStore};
use neo_types::EventId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use validator::ValidationErrors;

use crate::{
    auth_api::auth_routes,
    config::{ServerConfig, DEFAULT_API_PREFIX},
    events_api::event_routes,
    observability::request_id_middleware,
    users_api::user_routes,
    validation::ValidationErrorResponse,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Accounts, sessions and event permissions.
    pub auth: Arc<AuthStore>,
    /// Events and their histories.
    pub calendar: Arc<EventStore>,
    /// Name reported by the health endpoint.
    pub project_name: Arc<str>,
}

impl AppState {
    /// Fresh state with empty stores and default token lifetimes.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// Fresh state with empty stores configured from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            auth: Arc::new(AuthStore::with_policy(config.session_policy())),
            calendar: Arc::new(EventStore::new()),
            project_name: Arc::from(config.project_name.as_str()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// The application service: the router with trailing slashes tolerated.
pub type App = NormalizePath<Router>;

/// Creates the API router with routes mounted under `/api`.
pub fn create_router(state: AppState) -> Router {
    create_router_with_prefix(state, DEFAULT_API_PREFIX)
}

/// Creates the API router with routes mounted under `prefix`.
pub fn create_router_with_prefix(state: AppState, prefix: &str) -> Router {
    let api = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(event_routes());

    let api = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(prefix, api)
    };

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Creates the full application from configuration.
pub fn create_app(state: AppState, config: &ServerConfig) -> App {
    let mut router = create_router_with_prefix(state, &config.api_prefix);
    if config.cors_allow_any {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "name": &*state.project_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ==================== Responses ====================

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// IDs of the events a rejected event overlaps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_events: Option<Vec<EventId>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            conflicting_events: None,
        }
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Json<Self> {
        Json(Self { msg: msg.into() })
    }
}

// ==================== Errors ====================

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Request body failed field validation.
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),

    /// No bearer token was supplied.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The request is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The body, query string or path could not be parsed.
    #[error("{message}")]
    Malformed { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(err) => match err {
                AuthError::UserNotFound(_) | AuthError::PermissionNotFound => {
                    StatusCode::NOT_FOUND
                }
                AuthError::EmailTaken
                | AuthError::UsernameTaken
                | AuthError::InvalidInput(_)
                | AuthError::InactiveUser => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::PermissionDenied => StatusCode::FORBIDDEN,
                AuthError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Calendar(err) => match err {
                CalendarError::EventNotFound { .. } | CalendarError::VersionNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                CalendarError::Conflict { .. } => StatusCode::CONFLICT,
                CalendarError::Validation(_) => StatusCode::BAD_REQUEST,
                CalendarError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Malformed { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        let body = match self {
            ApiError::Validation(errors) => {
                return ValidationErrorResponse::from(errors).into_response();
            }
            ApiError::Calendar(CalendarError::Conflict { conflicting }) => ErrorResponse {
                error: message,
                conflicting_events: Some(conflicting),
            },
            _ => {
                if status.is_server_error() {
                    tracing::error!(error = %message, "Request failed");
                }
                ErrorResponse::new(message)
            }
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
