//! Authentication and authorization error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors returned by session, authorization, and account operations.
///
/// Every variant is terminal for the current operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session where one is required.
    #[error("you must be logged in to do that")]
    Unauthenticated,

    /// Authenticated but lacking the permission or ownership required.
    #[error("you do not have permission to do that")]
    Forbidden,

    /// Referenced entity is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reset token never issued, already consumed, or past its expiry.
    #[error("this password reset token is invalid or expired")]
    InvalidOrExpiredToken,

    /// Session token was tampered with or signed under another secret.
    #[error("invalid session signature")]
    InvalidSignature,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] fitshop_core::EmailError),

    /// No account for the supplied email.
    #[error("no user found for that email")]
    UserNotFound,

    /// Password did not match the stored hash.
    #[error("invalid password")]
    InvalidPassword,

    /// User already exists.
    #[error("an account with that email already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// A blocking worker panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
