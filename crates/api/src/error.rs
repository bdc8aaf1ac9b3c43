//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{"code": "FORBIDDEN", "error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session, authorization, or account operation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bad request from client (malformed path or body).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::Unauthenticated
                | AuthError::InvalidSignature
                | AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::NotFound(_) | AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidInput(_)
                | AuthError::InvalidOrExpiredToken
                | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Task(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Auth(err) => match err {
                AuthError::Unauthenticated => "UNAUTHENTICATED",
                AuthError::Forbidden => "FORBIDDEN",
                AuthError::NotFound(_) => "NOT_FOUND",
                AuthError::InvalidInput(_) => "INVALID_INPUT",
                AuthError::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
                AuthError::InvalidSignature => "INVALID_SIGNATURE",
                AuthError::InvalidEmail(_) => "INVALID_EMAIL",
                AuthError::UserNotFound => "USER_NOT_FOUND",
                AuthError::InvalidPassword => "INVALID_PASSWORD",
                AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
                AuthError::Repository(RepositoryError::Conflict(_)) => "CONFLICT",
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Task(_) => {
                    "INTERNAL"
                }
            },
            Self::Database(RepositoryError::Conflict(_)) => "CONFLICT",
            Self::Database(_) | Self::Internal(_) => "INTERNAL",
            Self::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "code": self.code(), "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Auth(AuthError::InvalidInput(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on signout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(status(AuthError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::NotFound("item")), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AuthError::InvalidInput("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(AuthError::InvalidOrExpiredToken), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::InvalidSignature), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_taxonomy_codes_are_distinct() {
        let codes = [
            AppError::from(AuthError::Unauthenticated).code(),
            AppError::from(AuthError::Forbidden).code(),
            AppError::from(AuthError::NotFound("item")).code(),
            AppError::from(AuthError::InvalidInput("x".to_string())).code(),
            AppError::from(AuthError::InvalidOrExpiredToken).code(),
            AppError::from(AuthError::InvalidSignature).code(),
            AppError::from(AuthError::UserNotFound).code(),
            AppError::from(AuthError::InvalidPassword).code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_server_errors() {
        assert_eq!(
            status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(RepositoryError::DataCorruption("bad row".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status(AuthError::PasswordHash), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid id".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid id");

        let err = AppError::from(AuthError::NotFound("cart item"));
        assert_eq!(err.to_string(), "cart item not found");
    }
}
