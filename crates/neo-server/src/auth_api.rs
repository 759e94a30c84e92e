//! Authentication endpoints: registration, login, token refresh and logout.

use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use neo_auth::{Credential, NewUser, TokenPair, User, UserResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::{ApiError, AppState, MessageResponse},
    extract::{ApiJson, CurrentUser},
    validation::validate_username,
};

/// Creates the authentication routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

// ==================== Request/Response Types ====================

/// Request to register an account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

/// Login credentials. One of `email` or `username` is required.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub password: String,
}

impl LoginRequest {
    /// Which identity the client is logging in with.
    ///
    /// An explicit email wins; a username containing `@` is taken as an email.
    pub fn credential(&self) -> Result<Credential, ApiError> {
        if let Some(email) = non_empty(&self.email) {
            return Ok(Credential::Email(email.to_string()));
        }
        match non_empty(&self.username) {
            Some(name) if name.contains('@') => Ok(Credential::Email(name.to_string())),
            Some(name) => Ok(Credential::Username(name.to_string())),
            None => Err(ApiError::BadRequest(
                "Email or username is required".to_string(),
            )),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Request to exchange a refresh token.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// A user together with freshly issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

impl AuthResponse {
    fn new(user: &User, tokens: TokenPair) -> Self {
        Self {
            user: user.to_response(),
            tokens,
        }
    }
}

// ==================== Handlers ====================

/// Registers an account and logs it in.
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let (user, tokens) = state.auth.register(NewUser {
        email: req.email,
        username: req.username,
        password: req.password,
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(&user, tokens))))
}

/// Logs in with a JSON or form-encoded body.
async fn login(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    let req: LoginRequest = if is_form {
        let Form(req) = Form::<LoginRequest>::from_request(request, &state).await?;
        req
    } else {
        let ApiJson(req) = ApiJson::<LoginRequest>::from_request(request, &state).await?;
        req
    };

    let credential = req.credential()?;
    let (user, tokens) = state.auth.login(&credential, &req.password)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse::new(&user, tokens)))
}

/// Returns the authenticated user.
async fn me(current: CurrentUser) -> impl IntoResponse {
    Json(current.user.to_response())
}

/// Rotates a refresh token into a new token pair.
async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, tokens) = state.auth.refresh(&req.refresh_token)?;

    tracing::info!(user_id = user.id, "Tokens refreshed");

    Ok(Json(AuthResponse::new(&user, tokens)))
}

/// Revokes the access token and its refresh token.
async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.sessions.revoke(&current.token)?;

    tracing::info!(user_id = current.user.id, "User logged out");

    Ok(MessageResponse::new("Successfully logged out"))
}
