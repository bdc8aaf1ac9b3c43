//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 3. Request ID (honour or create `x-request-id`)
//! 4. Session (cookie -> `SessionContext`)

pub mod auth;
pub mod request_id;
pub mod session;

pub use request_id::{RequestId, request_id_middleware};
pub use session::{removal_cookie, session_cookie, session_middleware};
