//! Authentication route handlers.
//!
//! Signup, signin, signout, and password reset. Successful signup, signin and
//! reset all set the session cookie and return the account as JSON.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{removal_cookie, session_cookie};
use crate::models::{SessionContext, User};
use crate::services::password_reset::RESET_REQUESTED_MESSAGE;
use crate::services::{AuthService, IssuedSession, PasswordResetManager};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    pub password: String,
    pub confirm_password: String,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<User>)> {
    let session = AuthService::new(state.store(), state.codec())
        .signup(&body.email, &body.name, &body.password)
        .await?;

    let (jar, user) = start_session(&state, jar, session);
    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// `POST /auth/signin`
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<SigninRequest>,
) -> Result<(CookieJar, Json<User>)> {
    let session = AuthService::new(state.store(), state.codec())
        .signin(&body.email, &body.password)
        .await?;

    let (jar, user) = start_session(&state, jar, session);
    Ok((jar, Json(user)))
}

/// `POST /auth/signout`
pub async fn signout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Message>) {
    clear_sentry_user();
    let jar = jar.remove(removal_cookie(&state.config().session));
    (jar, Json(Message { message: "Goodbye!" }))
}

/// `POST /auth/request-reset`
pub async fn request_reset(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RequestResetRequest>,
) -> Result<Json<Message>> {
    reset_manager(&state).request_reset(&body.email).await?;
    Ok(Json(Message {
        message: RESET_REQUESTED_MESSAGE,
    }))
}

/// `POST /auth/reset`
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<User>)> {
    let session = reset_manager(&state)
        .reset_password(&body.reset_token, &body.password, &body.confirm_password)
        .await?;

    let (jar, user) = start_session(&state, jar, session);
    Ok((jar, Json(user)))
}

/// `GET /me`: the current account, or `null` when anonymous.
pub async fn me(ctx: SessionContext) -> Json<Value> {
    match ctx.user() {
        Some(user) => Json(json!(user)),
        None => Json(Value::Null),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn reset_manager(state: &AppState) -> PasswordResetManager<'_> {
    PasswordResetManager::new(
        state.store(),
        state.codec(),
        state.email(),
        &state.config().frontend_url,
    )
}

fn start_session(state: &AppState, jar: CookieJar, session: IssuedSession) -> (CookieJar, User) {
    set_sentry_user(&session.user.id, Some(session.user.email.as_str()));
    let jar = jar.add(session_cookie(&state.config().session, session.token));
    (jar, session.user)
}
