//! Shared helpers for the HTTP integration tests

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use canteen_api::{AppConfig, AppState, prepare_state, routes::create_router};
use common::database::{DatabaseConfig, init_pool};
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "canteen-test-boundary";

/// Router and state over a fresh in-memory database with the fallback product seeded
pub async fn test_app() -> (Router, AppState) {
    let pool = init_pool(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to open in-memory database");
    let state = prepare_state(pool, &AppConfig::default())
        .await
        .expect("Failed to prepare state");

    (create_router(state.clone()), state)
}

/// Send a request and decode the JSON response body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    json_request(app, Method::PUT, uri, body).await
}

async fn json_request(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Upload legacy documents as `files` fields of a multipart form
pub async fn upload(app: &Router, documents: &[String]) -> (StatusCode, Value) {
    let mut body = String::new();
    for (index, document) in documents.iter().enumerate() {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"user{index}.json\"\r\nContent-Type: application/json\r\n\r\n{document}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Create a user and return its id
pub async fn create_user(app: &Router, display_name: &str, usernames: &[&str]) -> i64 {
    let (status, body) = post_json(
        app,
        "/user",
        serde_json::json!({ "display_name": display_name, "usernames": usernames }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

/// Create a product and return its id
pub async fn create_product(app: &Router, name: &str, price: i64, barcode: Option<&str>) -> i64 {
    let (status, body) = post_json(
        app,
        "/product",
        serde_json::json!({ "name": name, "price": price, "barcode": barcode }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

/// Create a purchase from `(product_id, quantity)` lines and return its id
pub async fn create_purchase(app: &Router, user_id: i64, lines: &[(i64, i64)]) -> i64 {
    let details: Vec<Value> = lines
        .iter()
        .map(|(product_id, quantity)| {
            serde_json::json!({ "product_id": product_id, "quantity": quantity })
        })
        .collect();
    let (status, body) = post_json(
        app,
        "/purchase",
        serde_json::json!({ "user_id": user_id, "details": details }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}
