//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! GET    /health/ready            - Store readiness
//!
//! # Auth
//! POST   /auth/signup             - Create account, set session cookie
//! POST   /auth/signin             - Sign in, set session cookie
//! POST   /auth/signout            - Clear session cookie
//! POST   /auth/request-reset      - Mail a password reset link
//! POST   /auth/reset              - Redeem reset token, set session cookie
//! GET    /me                      - Current account or null
//!
//! # Accounts (ADMIN or PERMISSIONUPDATE)
//! GET    /users                   - List accounts
//! PUT    /users/{id}/permissions  - Replace an account's permissions
//!
//! # Items
//! GET    /items                   - List items
//! GET    /items/{id}              - Item detail
//! POST   /items                   - Create (signed in)
//! PATCH  /items/{id}              - Update (owner, ADMIN, ITEMUPDATE)
//! DELETE /items/{id}              - Delete (owner, ADMIN, ITEMDELETE)
//!
//! # Cart (signed in)
//! GET    /cart                    - Caller's cart lines
//! POST   /cart                    - Add item or bump quantity
//! DELETE /cart/{id}               - Remove line (owner only)
//! ```

pub mod auth;
pub mod cart;
pub mod items;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{request_id_middleware, session_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/signout", post(auth::signout))
        .route("/request-reset", post(auth::request_reset))
        .route("/reset", post(auth::reset_password))
}

/// Create the account administration router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}/permissions", put(users::update_permissions))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(items::index).post(items::create))
        .route(
            "/{id}",
            get(items::show).patch(items::update).delete(items::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{id}", axum::routing::delete(cart::remove))
}

/// Create all API routes (without middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/me", get(auth::me))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/items", item_routes())
        .nest("/cart", cart_routes())
}

/// The full application: routes, session resolution, request IDs, tracing.
///
/// Sentry layers are added by the binary, outside this stack.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
