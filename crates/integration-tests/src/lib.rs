//! Integration tests for Fitshop.
//!
//! Every test drives the full router returned by [`fitshop_api::routes::app`]
//! in-process with `tower::ServiceExt::oneshot`, backed by the in-memory
//! store and the outbox mail transport. No database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fitshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Signup, signin, signout, and session cookies
//! - `password_reset` - Reset request and redemption
//! - `items` - Ownership and permission checks
//! - `cart` - Add, increment, remove
//! - `users` - Permission administration

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use fitshop_api::config::{ApiConfig, DEFAULT_COOKIE_NAME, SessionConfig, StoreBackend};
use fitshop_api::db::{MemoryStore, UserStore};
use fitshop_api::services::{EmailService, OutgoingEmail};
use fitshop_api::state::AppState;
use fitshop_core::{Permission, PermissionSet, UserId};

/// Signing secret shared by every test app.
pub const TEST_SECRET: &str = "k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga";

/// Frontend URL used when building reset links.
pub const FRONTEND_URL: &str = "https://shop.test";

/// A running application plus handles to its store and mail outbox.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    email: EmailService,
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The session token set by this response, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<String> {
        self.set_cookies()
            .find_map(|c| c.strip_prefix(&format!("{DEFAULT_COOKIE_NAME}=")).map(String::from))
            .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
            .filter(|token| !token.is_empty())
    }

    /// Whether this response expires the session cookie.
    #[must_use]
    pub fn clears_session(&self) -> bool {
        self.set_cookies().any(|c| {
            c.starts_with(&format!("{DEFAULT_COOKIE_NAME}=")) && c.contains("Max-Age=0")
        })
    }

    /// The machine-readable error code of an error body.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }

    fn set_cookies(&self) -> impl Iterator<Item = &str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// Build a fresh application with empty storage.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is rejected.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let config = ApiConfig {
            store: StoreBackend::Memory,
            host: [127, 0, 0, 1].into(),
            port: 0,
            frontend_url: Url::parse(FRONTEND_URL).expect("valid frontend url"),
            session: SessionConfig {
                app_secret: SecretString::from(TEST_SECRET),
                cookie_name: DEFAULT_COOKIE_NAME.to_string(),
                secure_cookie: true,
            },
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let store = Arc::new(MemoryStore::new());
        let email = EmailService::outbox();
        let state = AppState::new(config, store.clone(), email.clone())
            .expect("test secret is a valid key");

        Self {
            router: fitshop_api::routes::app(state),
            store,
            email,
        }
    }

    /// Send a request, optionally with a JSON body and a session token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    #[allow(clippy::expect_used)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{DEFAULT_COOKIE_NAME}={token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sign up and return the new account's ID and session token.
    ///
    /// # Panics
    ///
    /// Panics if signup does not succeed.
    #[allow(clippy::expect_used)]
    pub async fn signup(&self, email: &str, name: &str, password: &str) -> (UserId, String) {
        let response = self
            .request(
                Method::POST,
                "/auth/signup",
                Some(serde_json::json!({ "email": email, "name": name, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        let id = response.body["id"].as_i64().expect("account id");
        let token = response.session_token().expect("session cookie");
        (UserId::new(i32::try_from(id).expect("id fits")), token)
    }

    /// Replace an account's permissions directly in storage.
    ///
    /// # Panics
    ///
    /// Panics if the account does not exist.
    #[allow(clippy::expect_used)]
    pub async fn set_permissions(&self, id: UserId, permissions: &[Permission]) {
        let set: PermissionSet = permissions.iter().copied().collect();
        self.store
            .update_permissions(id, &set)
            .await
            .expect("account exists");
    }

    /// Every email sent so far.
    #[must_use]
    pub fn sent_mail(&self) -> Vec<OutgoingEmail> {
        self.email.sent()
    }

    /// The reset token from the most recent reset email.
    #[must_use]
    pub fn last_reset_token(&self) -> Option<String> {
        let mail = self.sent_mail().pop()?;
        let (_, rest) = mail.text_body.split_once("resetToken=")?;
        Some(rest.chars().take_while(char::is_ascii_hexdigit).collect())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
