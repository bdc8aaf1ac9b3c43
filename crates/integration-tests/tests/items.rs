//! Item ownership and permission checks over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use fitshop_core::Permission;
use fitshop_integration_tests::TestApp;

async fn create_item(app: &TestApp, token: &str) -> Value {
    let response = app
        .request(
            Method::POST,
            "/items",
            Some(json!({ "title": "Kettlebell", "description": "16kg cast iron", "price": 4999 })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.body
}

#[tokio::test]
async fn test_create_requires_signin() {
    let app = TestApp::new();
    let response = app
        .request(
            Method::POST,
            "/items",
            Some(json!({ "title": "Mat", "description": "", "price": 1500 })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_delete_authorization() {
    let app = TestApp::new();
    let (owner_id, owner) = app.signup("a@x.com", "Ann", "pw123").await;
    let (_, other) = app.signup("b@x.com", "Bob", "pw123").await;
    let (admin_id, admin) = app.signup("c@x.com", "Cat", "pw123").await;
    app.set_permissions(admin_id, &[Permission::User, Permission::Admin]).await;

    let item = create_item(&app, &owner).await;
    assert_eq!(item["ownerId"], owner_id.as_i32());
    let uri = format!("/items/{}", item["id"]);

    let denied = app.request(Method::DELETE, &uri, None, Some(&other)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(app.request(Method::GET, &uri, None, None).await.status, StatusCode::OK);

    let removed = app.request(Method::DELETE, &uri, None, Some(&owner)).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(app.request(Method::GET, &uri, None, None).await.status, StatusCode::NOT_FOUND);

    let second = create_item(&app, &owner).await;
    let uri = format!("/items/{}", second["id"]);
    let by_admin = app.request(Method::DELETE, &uri, None, Some(&admin)).await;
    assert_eq!(by_admin.status, StatusCode::OK);
}

#[tokio::test]
async fn test_item_delete_permission_allows_non_owner() {
    let app = TestApp::new();
    let (_, owner) = app.signup("a@x.com", "Ann", "pw123").await;
    let (mod_id, moderator) = app.signup("m@x.com", "Mod", "pw123").await;
    app.set_permissions(mod_id, &[Permission::User, Permission::ItemDelete]).await;

    let item = create_item(&app, &owner).await;
    let uri = format!("/items/{}", item["id"]);

    let edit = app
        .request(Method::PATCH, &uri, Some(json!({ "price": 1 })), Some(&moderator))
        .await;
    assert_eq!(edit.status, StatusCode::FORBIDDEN);

    let removed = app.request(Method::DELETE, &uri, None, Some(&moderator)).await;
    assert_eq!(removed.status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_updates_item() {
    let app = TestApp::new();
    let (_, owner) = app.signup("a@x.com", "Ann", "pw123").await;
    let item = create_item(&app, &owner).await;
    let uri = format!("/items/{}", item["id"]);

    let updated = app
        .request(Method::PATCH, &uri, Some(json!({ "price": 3999 })), Some(&owner))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["price"], 3999);
    assert_eq!(updated.body["title"], "Kettlebell");

    let invalid = app
        .request(Method::PATCH, &uri, Some(json!({ "price": -5 })), Some(&owner))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_item_is_not_found() {
    let app = TestApp::new();
    let (_, token) = app.signup("a@x.com", "Ann", "pw123").await;
    let response = app.request(Method::DELETE, "/items/4242", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
