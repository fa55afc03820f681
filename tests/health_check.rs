//! Integration tests for the staffdesk server plumbing

mod common;

use common::spawn_app;
use serde_json::Value;

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/health_check"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/health_check"))
        .send()
        .await
        .expect("Failed to execute request");

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Missing x-request-id header");
    assert!(uuid::Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn unknown_route_returns_404_envelope() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/nowhere"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn malformed_json_returns_400_envelope() {
    let app = spawn_app();

    let response = app
        .client
        .post(app.url("/users/create"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Malformed request body"));
}
