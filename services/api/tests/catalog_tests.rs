//! Users, aliases and products over HTTP

mod support;

use axum::http::StatusCode;
use canteen_api::models::{Product, User, UsernameWithUser};
use serde_json::json;
use support::{create_product, create_user, delete, get, post_json, put_json, test_app};

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_fallback_product_is_seeded() {
    let (app, _) = test_app().await;

    let (status, body) = get(&app, "/product/1").await;
    assert_eq!(status, StatusCode::OK);
    let product: Product = serde_json::from_value(body).unwrap();
    assert_eq!(product.name, "其他");
    assert_eq!(product.price, 1);
    assert_eq!(product.barcode, "CC-Food-1");
}

#[tokio::test]
async fn test_create_and_get_user() {
    let (app, _) = test_app().await;

    let id = create_user(&app, "Alice", &["alice", "ali"]).await;

    let (status, body) = get(&app, &format!("/user/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let user: User = serde_json::from_value(body).unwrap();
    assert_eq!(user.display_name, "Alice");
    assert!(!user.is_disabled);
    let names: Vec<&str> = user.usernames.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["alice", "ali"]);
    assert!(user.purchases.is_empty());
    assert!(user.payments.is_empty());

    let (status, body) = get(&app, "/user/byUsername/ali").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
}

#[tokio::test]
async fn test_duplicate_username_is_rejected_atomically() {
    let (app, _) = test_app().await;
    create_user(&app, "Alice", &["alice"]).await;

    let (status, body) = post_json(
        &app,
        "/user",
        json!({ "display_name": "Impostor", "usernames": ["bob", "alice"] }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (_, users) = get(&app, "/user").await;
    assert_eq!(users.as_array().unwrap().len(), 1);
    let (status, _) = get(&app, "/user/byUsername/bob").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_soft_deleted_user_is_hidden() {
    let (app, _) = test_app().await;
    let id = create_user(&app, "Alice", &["alice"]).await;

    let (status, body) = delete(&app, &format!("/user/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = get(&app, &format!("/user/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, users) = get(&app, "/user").await;
    assert!(users.as_array().unwrap().is_empty());

    let (status, _) = delete(&app, "/user/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_path_parameter() {
    let (app, _) = test_app().await;

    let (status, body) = get(&app, "/user/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = get(&app, "/purchase/id/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(&app, "/user", json!({ "usernames": "alice" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_username_lifecycle() {
    let (app, _) = test_app().await;
    let user_id = create_user(&app, "Alice", &["alice"]).await;

    let (status, body) = post_json(
        &app,
        &format!("/username/{user_id}"),
        json!({ "name": "al" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let alias_id = body["id"].as_i64().unwrap();
    assert_eq!(body["user_id"], user_id);

    let (status, body) = get(&app, &format!("/username/{alias_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let alias: UsernameWithUser = serde_json::from_value(body).unwrap();
    assert_eq!(alias.username.name, "al");
    assert_eq!(alias.user.id, user_id);
    assert_eq!(alias.user.usernames.len(), 2);

    let (_, all) = get(&app, "/username").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, _) = delete(&app, &format!("/username/{alias_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &format!("/username/{alias_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = delete(&app, &format!("/username/{alias_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(&app, "/username/999", json!({ "name": "ghost" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_without_barcode_gets_private_barcode() {
    let (app, _) = test_app().await;

    let id = create_product(&app, "Tea", 30, None).await;
    let (_, body) = get(&app, &format!("/product/{id}")).await;
    assert_eq!(body["barcode"], format!("CC-Food-{id}"));

    let id = create_product(&app, "Coffee", 50, Some("")).await;
    let (_, body) = get(&app, &format!("/product/{id}")).await;
    assert_eq!(body["barcode"], format!("CC-Food-{id}"));
}

#[tokio::test]
async fn test_product_lookup_update_and_soft_delete() {
    let (app, _) = test_app().await;
    let id = create_product(&app, "Chips", 120, Some("4901234567894")).await;

    let (status, body) = get(&app, "/product/byBarcode/4901234567894").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, body) = put_json(
        &app,
        &format!("/product/{id}"),
        json!({ "name": "Salted chips", "price": 130 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let product: Product = serde_json::from_value(body).unwrap();
    assert_eq!(product.name, "Salted chips");
    assert_eq!(product.price, 130);
    assert_eq!(product.barcode, "4901234567894");

    let (status, _) = delete(&app, &format!("/product/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, &format!("/product/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/product/byBarcode/4901234567894").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = put_json(
        &app,
        &format!("/product/{id}"),
        json!({ "name": "Back", "price": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, products) = get(&app, "/product").await;
    let ids: Vec<i64> = products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1]);
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(&app, "/product", json!({ "name": "Refund", "price": -5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("price"));
}
