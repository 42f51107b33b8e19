//! End-to-end HTTP API integration tests
//!
//! These tests verify the collaborator endpoints served next to the
//! broadcast channel:
//! - Health check and agent directory
//! - Command submission and task id allocation
//! - Command validation on direct execution
//! - Voice transcription

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use omnidash_api::api::{router, AppState};
use omnidash_api::config::ServerConfig;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

/// Setup test application with routes
fn setup_app() -> Router {
    let config = ServerConfig {
        voice_delay: Duration::ZERO,
        ..ServerConfig::default()
    };
    router(AppState::new(&config))
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_agent_directory() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/agents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let agents = body["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 4);
    assert_eq!(agents[0]["id"], "agent-1");
    assert_eq!(agents[0]["type"], "phone");
    assert_eq!(agents[1]["status"], "active");
    assert_eq!(agents[1]["progress"], 65.0);
    assert_eq!(agents[2]["lastAction"], "Sent follow-up emails");
}

#[tokio::test]
async fn test_submit_command_allocates_task() {
    let app = setup_app();

    let response = app
        .oneshot(post_json(
            "/api/agents",
            json!({ "command": "Call Sarah Johnson" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["taskId"].as_str().unwrap().starts_with("task-"));
    assert_eq!(body["status"], "processing");
    assert_eq!(body["message"], "Command received and agents activated");
    assert!(body["estimatedCompletion"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_submit_command_requires_command() {
    let app = setup_app();

    let response = app
        .oneshot(post_json("/api/agents", json!({ "text": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_execute_rejects_blank_command() {
    let app = setup_app();

    let response = app
        .oneshot(post_json("/api/execute", json!({ "command": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Invalid command");
}

#[tokio::test]
async fn test_execute_assigns_demo_agents() {
    let app = setup_app();

    let response = app
        .oneshot(post_json(
            "/api/execute",
            json!({ "command": "Book a table for two" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "processing");
    assert_eq!(body["assignedAgents"], json!(["agent-1", "agent-2"]));
    assert!(body["estimatedCompletionTime"].as_i64().is_some());
}

#[tokio::test]
async fn test_voice_requires_audio() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/voice/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "No audio file provided");
}

#[tokio::test]
async fn test_voice_returns_transcript() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/voice/process")
                .header("content-type", "audio/wav")
                .body(Body::from(vec![0u8; 64]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["text"].as_str().unwrap().starts_with("Call Sarah Johnson"));
    assert_eq!(body["confidence"], 0.94);
    assert_eq!(body["intent"], "multi_action_request");
    assert_eq!(body["entities"]["contact"], "Sarah Johnson");
    assert_eq!(body["suggestedAgents"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unparsable_body_uses_error_shape() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/execute")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].is_string());
}
