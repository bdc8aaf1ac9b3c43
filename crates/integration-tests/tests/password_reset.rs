//! Password reset request and redemption over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use fitshop_integration_tests::{FRONTEND_URL, TestApp};

async fn request_reset(app: &TestApp, email: &str) -> StatusCode {
    app.request(
        Method::POST,
        "/auth/request-reset",
        Some(json!({ "email": email })),
        None,
    )
    .await
    .status
}

#[tokio::test]
async fn test_reset_flow_issues_new_session() {
    let app = TestApp::new();
    let (id, _) = app.signup("a@x.com", "Ann", "pw123").await;

    assert_eq!(request_reset(&app, "a@x.com").await, StatusCode::OK);

    let mail = app.sent_mail();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].to, "a@x.com");
    assert!(mail[0].text_body.contains(&format!("{FRONTEND_URL}/reset?resetToken=")));

    let token = app.last_reset_token().unwrap();
    assert_eq!(token.len(), 40);

    let reset = app
        .request(
            Method::POST,
            "/auth/reset",
            Some(json!({ "resetToken": token, "password": "newpw", "confirmPassword": "newpw" })),
            None,
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);
    assert_eq!(reset.body["id"], id.as_i32());
    assert!(reset.session_token().is_some());

    let old = app
        .request(
            Method::POST,
            "/auth/signin",
            Some(json!({ "email": "a@x.com", "password": "pw123" })),
            None,
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .request(
            Method::POST,
            "/auth/signin",
            Some(json!({ "email": "a@x.com", "password": "newpw" })),
            None,
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = TestApp::new();
    app.signup("a@x.com", "Ann", "pw123").await;
    request_reset(&app, "a@x.com").await;
    let token = app.last_reset_token().unwrap();

    let body = json!({ "resetToken": token, "password": "newpw", "confirmPassword": "newpw" });
    let first = app
        .request(Method::POST, "/auth/reset", Some(body.clone()), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.request(Method::POST, "/auth/reset", Some(body), None).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.error_code(), Some("INVALID_OR_EXPIRED_TOKEN"));
}

#[tokio::test]
async fn test_newer_request_replaces_older_token() {
    let app = TestApp::new();
    app.signup("a@x.com", "Ann", "pw123").await;

    request_reset(&app, "a@x.com").await;
    let first = app.last_reset_token().unwrap();
    request_reset(&app, "a@x.com").await;
    let second = app.last_reset_token().unwrap();
    assert_ne!(first, second);

    let stale = app
        .request(
            Method::POST,
            "/auth/reset",
            Some(json!({ "resetToken": first, "password": "x", "confirmPassword": "x" })),
            None,
        )
        .await;
    assert_eq!(stale.error_code(), Some("INVALID_OR_EXPIRED_TOKEN"));
}

#[tokio::test]
async fn test_mismatched_confirmation_leaves_token_usable() {
    let app = TestApp::new();
    app.signup("a@x.com", "Ann", "pw123").await;
    request_reset(&app, "a@x.com").await;
    let token = app.last_reset_token().unwrap();

    let mismatch = app
        .request(
            Method::POST,
            "/auth/reset",
            Some(json!({ "resetToken": token, "password": "one", "confirmPassword": "two" })),
            None,
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.error_code(), Some("INVALID_INPUT"));

    let ok = app
        .request(
            Method::POST,
            "/auth/reset",
            Some(json!({ "resetToken": token, "password": "two", "confirmPassword": "two" })),
            None,
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_email_is_not_found() {
    let app = TestApp::new();
    assert_eq!(request_reset(&app, "ghost@x.com").await, StatusCode::NOT_FOUND);
    assert!(app.sent_mail().is_empty());
}
