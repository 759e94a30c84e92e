//! Shared helpers for end-to-end tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use neo_server::{
    api::{create_app, App, AppState},
    config::ServerConfig,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub fn create_test_app() -> App {
    let config = ServerConfig::default();
    create_app(AppState::from_config(&config), &config)
}

pub async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
}

/// Sends a request and returns the raw response.
pub async fn call(
    app: &App,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Sends a request and returns status and JSON body.
pub async fn send(
    app: &App,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = call(app, method, uri, token, body).await;
    let status = response.status();
    (status, json_body(response).await)
}

/// A registered account and its tokens.
pub struct TestUser {
    pub id: u64,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    pub fn token(&self) -> Option<&str> {
        Some(&self.access_token)
    }
}

pub async fn register(app: &App, username: &str) -> TestUser {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": format!("{}@example.com", username),
            "username": username,
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    TestUser {
        id: body["user"]["id"].as_u64().unwrap(),
        username: username.to_string(),
        access_token: body["tokens"]["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["tokens"]["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// An event body on 2025-05-`day` from `start`:00 to `end`:00 UTC.
pub fn event_body(title: &str, day: u32, start: u32, end: u32) -> Value {
    json!({
        "title": title,
        "start_time": format!("2025-05-{:02}T{:02}:00:00Z", day, start),
        "end_time": format!("2025-05-{:02}T{:02}:00:00Z", day, end),
    })
}

pub async fn create_event(app: &App, user: &TestUser, body: Value) -> Value {
    let (status, event) = send(app, "POST", "/api/events", user.token(), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", event);
    event
}

pub async fn share(app: &App, owner: &TestUser, event_id: u64, user: &TestUser, role: &str) {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/events/{}/share", event_id),
        owner.token(),
        Some(json!({"user_id": user.id, "role": role})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "share failed: {}", body);
}
