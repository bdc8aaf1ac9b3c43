//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Store;
use crate::services::{EmailService, TokenCodec};

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("session secret rejected by the MAC")]
    SigningKey,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything inside is
/// immutable after startup; the store does its own synchronization.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    codec: TokenCodec,
    email: EmailService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing key cannot be used.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn Store>,
        email: EmailService,
    ) -> Result<Self, StateError> {
        let codec =
            TokenCodec::new(&config.session.app_secret).map_err(|_| StateError::SigningKey)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                codec,
                email,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// The configured store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Session token codec keyed with the configured secret.
    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.inner.codec
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }
}
