//! Request extractors whose rejections use the API's JSON error body.
//!
//! axum's own `Json` and `Path` reject with plain-text 4xx responses. These
//! wrappers route the rejection through [`AppError`] so every failure the
//! client sees carries a `code`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body. A body that fails to parse is `INVALID_INPUT`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameters. A segment that fails to parse is `BAD_REQUEST`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        response::IntoResponse,
        routing::post,
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;

    use fitshop_core::Permission;

    use super::*;

    #[derive(Deserialize)]
    struct Grant {
        permissions: Vec<Permission>,
    }

    fn app() -> Router {
        Router::new().route(
            "/{id}",
            post(
                |ApiPath(id): ApiPath<i32>, ApiJson(body): ApiJson<Grant>| async move {
                    format!("{id}:{}", body.permissions.len()).into_response()
                },
            ),
        )
    }

    async fn send(uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_unknown_enum_value_is_invalid_input() {
        let (status, body) = send("/1", r#"{"permissions":["ROOT"]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_input() {
        let (status, body) = send("/1", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_bad_path_segment_is_bad_request() {
        let (status, body) = send("/abc", r#"{"permissions":["USER"]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
