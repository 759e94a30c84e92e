//! User account endpoints.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use neo_auth::{UserChanges, UserResponse};
use neo_types::Page;
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::{ApiError, AppState},
    extract::{ApiJson, ApiQuery, CurrentUser},
    validation::validate_username,
};

/// Creates the user routes.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(read_me).put(update_me))
}

/// Changes to the caller's own account. Absent fields are left alone.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            email: req.email,
            username: req.username,
            is_active: req.is_active,
            password: req.password,
        }
    }
}

/// Lists users by id.
async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
) -> impl IntoResponse {
    let users: Vec<UserResponse> = state
        .auth
        .users
        .list(page.normalized())
        .iter()
        .map(|u| u.to_response())
        .collect();
    Json(users)
}

/// Returns the caller's account.
async fn read_me(current: CurrentUser) -> impl IntoResponse {
    Json(current.user.to_response())
}

/// Updates the caller's account.
async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let deactivating = req.is_active == Some(false);
    let user = state.auth.users.update(current.user.id, req.into())?;

    if deactivating {
        state.auth.sessions.revoke_user(user.id);
    }

    tracing::info!(user_id = user.id, "User updated");

    Ok(Json(user.to_response()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_validation_skips_absent_fields() {
        assert!(UpdateUserRequest::default().validate().is_ok());

        let req = UpdateUserRequest {
            username: Some("bad name".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateUserRequest {
            password: Some("longenough".into()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }
}
