//! Session middleware.
//!
//! Resolves the session cookie into a [`SessionContext`] once per request and
//! stores it in the request extensions. Handlers receive it through the
//! `SessionContext` extractor in [`super::auth`].
//!
//! - No cookie: anonymous context, request proceeds.
//! - Cookie with a bad signature: 401 `INVALID_SIGNATURE` and the cookie is
//!   expired, so the client can recover by signing in again.
//! - Valid cookie for a deleted account: anonymous context.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::Span;

use crate::config::SessionConfig;
use crate::error::AppError;
use crate::models::SessionContext;
use crate::services::AuthError;
use crate::state::AppState;

/// Session cookie lifetime (one year). Tokens themselves do not expire.
pub const SESSION_MAX_AGE_DAYS: i64 = 365;

/// Populate the request's [`SessionContext`] from its session cookie.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session_config = &state.config().session;

    let ctx = match jar.get(&session_config.cookie_name) {
        None => SessionContext::anonymous(),
        Some(cookie) => match resolve_session(&state, cookie.value()).await {
            Ok(ctx) => ctx,
            Err(AuthError::InvalidSignature) => {
                tracing::warn!("rejected session cookie with invalid signature");
                let jar = jar.remove(removal_cookie(session_config));
                return (jar, AppError::from(AuthError::InvalidSignature)).into_response();
            }
            Err(e) => return AppError::from(e).into_response(),
        },
    };

    if let Some(user_id) = ctx.user_id() {
        Span::current().record("user_id", user_id.as_i32());
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Verify a session token and load the account it names.
async fn resolve_session(state: &AppState, token: &str) -> Result<SessionContext, AuthError> {
    let user_id = state.codec().verify(token)?;

    match state.store().find_user_by_id(user_id).await? {
        Some(user) => Ok(SessionContext::authenticated(user)),
        None => {
            tracing::debug!(user_id = %user_id, "session names a missing account");
            Ok(SessionContext::anonymous())
        }
    }
}

/// The cookie carrying a freshly issued session token.
#[must_use]
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .http_only(true)
        .max_age(time::Duration::days(SESSION_MAX_AGE_DAYS))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.secure_cookie)
        .build()
}

/// A cookie matching [`session_cookie`]'s name and path, for `CookieJar::remove`.
#[must_use]
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .build()
}
