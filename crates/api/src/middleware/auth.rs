//! Session context extractor.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::models::SessionContext;

/// Extract the context populated by [`super::session_middleware`].
///
/// Never rejects: a route mounted outside the session layer sees an
/// anonymous context, and authorization is left to the guard functions.
///
/// ```rust,ignore
/// async fn handler(ctx: SessionContext) -> impl IntoResponse {
///     match ctx.user() {
///         Some(user) => format!("Hello, {}!", user.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_default())
    }
}
