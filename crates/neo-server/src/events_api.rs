//! Event endpoints: CRUD, sharing, and version history.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use neo_auth::{AuthError, EventPermission, Role};
use neo_calendar::{Event, EventUpdate, EventVersion, NewEvent};
use neo_types::{EventId, Page, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    api::{ApiError, AppState, MessageResponse},
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
};

/// Creates the event routes.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{event_id}",
            get(read_event).put(update_event).delete(delete_event),
        )
        .route("/events/{event_id}/share", post(share_event))
        .route("/events/{event_id}/permissions", get(list_permissions))
        .route(
            "/events/{event_id}/permissions/{user_id}",
            delete(revoke_permission),
        )
        .route("/events/{event_id}/history", get(list_versions))
        .route("/events/{event_id}/history/{version}", get(read_version))
        .route("/events/{event_id}/diff/{version1}/{version2}", get(diff_versions))
}

// ==================== Request/Response Types ====================

/// An event with its sharing state and, for single reads, its history.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub permissions: Vec<EventPermission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<EventVersion>>,
}

/// One user to share an event with.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareEntry {
    pub user_id: UserId,
    pub role: String,
}

/// Share with a single user or with several at once.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShareRequest {
    Many { users: Vec<ShareEntry> },
    One(ShareEntry),
}

impl ShareRequest {
    fn into_entries(self) -> Vec<ShareEntry> {
        match self {
            ShareRequest::Many { users } => users,
            ShareRequest::One(entry) => vec![entry],
        }
    }
}

// ==================== Helpers ====================

/// Loads an event and checks the caller holds at least `required` on it.
///
/// A missing event is reported before a missing permission.
fn authorize(
    state: &AppState,
    user: UserId,
    event_id: EventId,
    required: Role,
) -> Result<(Event, Role), ApiError> {
    let event = state.calendar.get(event_id)?;
    let role = state.auth.require(user, event_id, event.owner_id, required)?;
    Ok((event, role))
}

fn with_permissions(state: &AppState, event: Event) -> EventResponse {
    let permissions = state.auth.grants.list(event.id);
    EventResponse {
        event,
        permissions,
        versions: None,
    }
}

// ==================== Event Handlers ====================

/// Creates an event owned by the caller.
async fn create_event(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state.calendar.create(current.user.id, req)?;

    tracing::info!(event_id = event.id, user_id = current.user.id, "Event created");

    Ok((StatusCode::CREATED, Json(with_permissions(&state, event))))
}

/// Lists events the caller owns or has been shared.
async fn list_events(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
) -> impl IntoResponse {
    let shared = state.auth.grants.events_for(current.user.id);
    let events: Vec<EventResponse> = state
        .calendar
        .list_for_user(current.user.id, &shared, page.normalized())
        .into_iter()
        .map(|event| with_permissions(&state, event))
        .collect();
    Json(events)
}

/// Reads an event with its permissions and history.
async fn read_event(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> Result<impl IntoResponse, ApiError> {
    let (event, _) = authorize(&state, current.user.id, event_id, Role::Viewer)?;
    let versions = state.calendar.versions(event_id)?;

    let mut response = with_permissions(&state, event);
    response.versions = Some(versions);
    Ok(Json(response))
}

/// Updates an event. Requires editor.
async fn update_event(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(req): ApiJson<EventUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Editor)?;

    let event = state.calendar.update(event_id, current.user.id, req)?;

    tracing::info!(event_id, user_id = current.user.id, "Event updated");

    Ok(Json(with_permissions(&state, event)))
}

/// Deletes an event with its history and grants. Requires owner.
async fn delete_event(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Owner)?;

    state.calendar.delete(event_id)?;
    let revoked = state.auth.grants.remove_event(event_id);

    tracing::info!(event_id, user_id = current.user.id, revoked, "Event deleted");

    Ok(MessageResponse::new("Event deleted"))
}

// ==================== Permission Handlers ====================

/// Grants roles on an event. Requires owner.
///
/// Every entry is checked before any grant is written.
async fn share_event(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(req): ApiJson<ShareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Owner)?;

    let entries = req.into_entries();
    if entries.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one user must be provided".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(entries.len());
    if !entries.iter().all(|entry| seen.insert(entry.user_id)) {
        return Err(ApiError::BadRequest(
            "Duplicate user_ids are not allowed".to_string(),
        ));
    }

    let mut grants = Vec::with_capacity(entries.len());
    for entry in entries {
        let role: Role = entry.role.parse()?;
        if !state.auth.users.exists(entry.user_id) {
            return Err(AuthError::UserNotFound(entry.user_id).into());
        }
        grants.push((entry.user_id, role));
    }

    let permissions = write_grants(&state, event_id, grants, current.user.id)?;
    Ok(Json(permissions))
}

/// Writes grants, then confirms the event was not deleted meanwhile.
///
/// Deletion removes the event before its grants, so a grant written after
/// that cleanup is caught here and dropped.
fn write_grants(
    state: &AppState,
    event_id: EventId,
    grants: Vec<(UserId, Role)>,
    granted_by: UserId,
) -> Result<Vec<EventPermission>, ApiError> {
    let permissions: Vec<EventPermission> = grants
        .into_iter()
        .map(|(user_id, role)| {
            tracing::info!(event_id, user_id, role = %role, "Event shared");
            state.auth.grants.grant(event_id, user_id, role, granted_by)
        })
        .collect();

    if let Err(err) = state.calendar.get(event_id) {
        let dropped = state.auth.grants.remove_event(event_id);
        tracing::warn!(event_id, dropped, "Event deleted while sharing");
        return Err(err.into());
    }

    Ok(permissions)
}

/// Lists the grants on an event. Requires viewer.
async fn list_permissions(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Viewer)?;
    Ok(Json(state.auth.grants.list(event_id)))
}

/// Removes a user's grant. Requires owner.
async fn revoke_permission(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath((event_id, user_id)): ApiPath<(EventId, UserId)>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Owner)?;

    state.auth.grants.revoke(event_id, user_id)?;

    tracing::info!(event_id, user_id, "Permission removed");

    Ok(MessageResponse::new("Permission removed"))
}

// ==================== History Handlers ====================

/// Lists every version of an event. Requires viewer.
async fn list_versions(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Viewer)?;
    Ok(Json(state.calendar.versions(event_id)?))
}

/// Reads one version of an event. Requires viewer.
async fn read_version(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath((event_id, version)): ApiPath<(EventId, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Viewer)?;
    Ok(Json(state.calendar.version(event_id, version)?))
}

/// Diffs two versions of an event. Requires viewer.
async fn diff_versions(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath((event_id, version1, version2)): ApiPath<(EventId, u32, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, current.user.id, event_id, Role::Viewer)?;
    Ok(Json(state.calendar.diff(event_id, version1, version2)?))
}
