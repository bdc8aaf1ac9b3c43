//! Password reset credentials.
//!
//! Lifecycle per account:
//!
//! - `request_reset` issues a credential (overwriting any earlier one) and
//!   mails a link to the frontend.
//! - `reset_password` consumes it. The credential is cleared in the same
//!   conditional write that stores the new password hash, so a token can be
//!   redeemed at most once even under concurrent submissions.
//! - An expired credential stays stored until overwritten or consumed; it is
//!   simply never matched again.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::instrument;
use url::Url;

use fitshop_core::Email;

use crate::db::Store;
use crate::models::ResetCredential;
use crate::services::auth::{AuthError, AuthService, IssuedSession, TokenCodec, hash_password, validate_password};
use crate::services::email::EmailService;

/// Bytes of randomness in a reset token (hex-encoded to twice as many chars).
const RESET_TOKEN_BYTES: usize = 20;

/// Generic acknowledgement returned once a reset has been requested.
pub const RESET_REQUESTED_MESSAGE: &str = "Check your email for a password reset link.";

/// Issues and redeems password reset credentials.
pub struct PasswordResetManager<'a> {
    store: &'a dyn Store,
    codec: &'a TokenCodec,
    email: &'a EmailService,
    frontend_url: &'a Url,
}

impl<'a> PasswordResetManager<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        codec: &'a TokenCodec,
        email: &'a EmailService,
        frontend_url: &'a Url,
    ) -> Self {
        Self {
            store,
            codec,
            email,
            frontend_url,
        }
    }

    /// Issue a reset credential for `email` and mail the link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no account has this email, including
    /// when the email is malformed. Mail delivery failures are logged, not
    /// returned.
    pub async fn request_reset(&self, email: &str) -> Result<(), AuthError> {
        self.request_reset_at(email, Utc::now()).await
    }

    /// [`request_reset`](Self::request_reset) with an explicit issuance time.
    ///
    /// # Errors
    ///
    /// See [`request_reset`](Self::request_reset).
    #[instrument(skip(self, email), fields(user_id))]
    pub async fn request_reset_at(&self, email: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        // A malformed address can't belong to an account.
        let email = Email::parse(email).map_err(|_| AuthError::NotFound("user"))?;
        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound("user"))?;
        tracing::Span::current().record("user_id", user.id.as_i32());

        let credential = ResetCredential::issued_at(generate_reset_token(), now);
        self.store.set_reset_token(user.id, &credential).await?;

        let link = reset_link(self.frontend_url, &credential.token);
        if let Err(e) = self
            .email
            .send_password_reset(user.email.as_str(), &user.name, &link)
            .await
        {
            tracing::error!(error = %e, "Failed to send password reset email");
        }

        tracing::info!(expires_at = %credential.expires_at, "password reset requested");
        Ok(())
    }

    /// Redeem a reset token, set a new password, and sign the account in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if the passwords differ or are empty
    /// and `AuthError::InvalidOrExpiredToken` if the token does not match a
    /// live credential.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<IssuedSession, AuthError> {
        self.reset_password_at(token, password, confirm_password, Utc::now())
            .await
    }

    /// [`reset_password`](Self::reset_password) evaluated at `now`.
    ///
    /// # Errors
    ///
    /// See [`reset_password`](Self::reset_password).
    #[instrument(skip_all, fields(user_id))]
    pub async fn reset_password_at(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        if password != confirm_password {
            return Err(AuthError::InvalidInput("passwords don't match".to_string()));
        }
        validate_password(password)?;

        // Hash first so the lookup and the conditional write below run back to back.
        let password_hash = hash_password(password.to_string()).await?;

        let user = self
            .store
            .find_user_by_reset_token(token, now)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;
        tracing::Span::current().record("user_id", user.id.as_i32());

        // Another redemption won the race, or a newer request replaced the credential.
        let user = self
            .store
            .complete_password_reset(user.id, token, &password_hash, now)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        tracing::info!("password reset completed");
        Ok(AuthService::new(self.store, self.codec).issue(user))
    }
}

/// 20 random bytes, hex-encoded.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// `<frontend>/reset?resetToken=<token>`
fn reset_link(frontend_url: &Url, token: &str) -> String {
    format!(
        "{}/reset?resetToken={token}",
        frontend_url.as_str().trim_end_matches('/')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use secrecy::SecretString;

    use super::*;
    use crate::db::{MemoryStore, UserStore};
    use crate::models::NewUser;

    struct Fixture {
        store: MemoryStore,
        codec: TokenCodec,
        email: EmailService,
        frontend: Url,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            store
                .create_user(NewUser {
                    email: Email::parse("a@x.com").unwrap(),
                    name: "Ann".to_string(),
                    password_hash: hash_password("old-password".to_string()).await.unwrap(),
                    permissions: fitshop_core::PermissionSet::signup_default(),
                })
                .await
                .unwrap();
            Self {
                store,
                codec: TokenCodec::new(&SecretString::from(
                    "k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga".to_string(),
                ))
                .unwrap(),
                email: EmailService::outbox(),
                frontend: Url::parse("https://shop.test/").unwrap(),
            }
        }

        fn manager(&self) -> PasswordResetManager<'_> {
            PasswordResetManager::new(&self.store, &self.codec, &self.email, &self.frontend)
        }

        /// Token from the most recent reset email.
        fn mailed_token(&self) -> String {
            let sent = self.email.sent();
            let body = &sent.last().unwrap().text_body;
            let start = body.find("resetToken=").unwrap() + "resetToken=".len();
            body[start..start + RESET_TOKEN_BYTES * 2].to_string()
        }
    }

    #[test]
    fn test_reset_token_format() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_reset_link_format() {
        let frontend = Url::parse("https://shop.test").unwrap();
        assert_eq!(
            reset_link(&frontend, "abc"),
            "https://shop.test/reset?resetToken=abc"
        );
    }

    #[tokio::test]
    async fn test_request_reset_unknown_email() {
        let fx = Fixture::new().await;
        let result = fx.manager().request_reset("nobody@x.com").await;
        assert!(matches!(result, Err(AuthError::NotFound("user"))));
        assert!(fx.email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_request_reset_malformed_email_is_not_found() {
        let fx = Fixture::new().await;
        for email in ["", "not-an-email", "a@b@c"] {
            let result = fx.manager().request_reset(email).await;
            assert!(matches!(result, Err(AuthError::NotFound("user"))), "{email}");
        }
        assert!(fx.email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_request_reset_mails_link() {
        let fx = Fixture::new().await;
        fx.manager().request_reset("A@x.com").await.unwrap();

        let sent = fx.email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert!(sent[0].text_body.contains("https://shop.test/reset?resetToken="));
    }

    #[tokio::test]
    async fn test_token_accepted_just_before_expiry() {
        let fx = Fixture::new().await;
        let issued = Utc::now();
        fx.manager().request_reset_at("a@x.com", issued).await.unwrap();
        let token = fx.mailed_token();

        let session = fx
            .manager()
            .reset_password_at(&token, "new-pw", "new-pw", issued + Duration::seconds(3599))
            .await
            .unwrap();
        assert_eq!(fx.codec.verify(&session.token).unwrap(), session.user.id);
    }

    #[tokio::test]
    async fn test_token_rejected_after_expiry() {
        let fx = Fixture::new().await;
        let issued = Utc::now();
        fx.manager().request_reset_at("a@x.com", issued).await.unwrap();
        let token = fx.mailed_token();

        let result = fx
            .manager()
            .reset_password_at(&token, "new-pw", "new-pw", issued + Duration::seconds(3601))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let fx = Fixture::new().await;
        fx.manager().request_reset("a@x.com").await.unwrap();
        let token = fx.mailed_token();

        fx.manager().reset_password(&token, "new-pw", "new-pw").await.unwrap();
        let second = fx.manager().reset_password(&token, "other", "other").await;
        assert!(matches!(second, Err(AuthError::InvalidOrExpiredToken)));
    }

    #[tokio::test]
    async fn test_new_request_overwrites_previous_token() {
        let fx = Fixture::new().await;
        fx.manager().request_reset("a@x.com").await.unwrap();
        let first = fx.mailed_token();
        fx.manager().request_reset("a@x.com").await.unwrap();
        let second = fx.mailed_token();

        let stale = fx.manager().reset_password(&first, "new-pw", "new-pw").await;
        assert!(matches!(stale, Err(AuthError::InvalidOrExpiredToken)));
        fx.manager().reset_password(&second, "new-pw", "new-pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_mismatched_confirmation() {
        let fx = Fixture::new().await;
        fx.manager().request_reset("a@x.com").await.unwrap();
        let token = fx.mailed_token();

        let result = fx.manager().reset_password(&token, "new-pw", "new-pq").await;
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));

        // The credential survives a rejected attempt.
        fx.manager().reset_password(&token, "new-pw", "new-pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let fx = Fixture::new().await;
        let result = fx.manager().reset_password(&"0".repeat(40), "pw", "pw").await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    }

    #[tokio::test]
    async fn test_reset_changes_password() {
        let fx = Fixture::new().await;
        fx.manager().request_reset("a@x.com").await.unwrap();
        let token = fx.mailed_token();
        fx.manager().reset_password(&token, "new-pw", "new-pw").await.unwrap();

        let auth = AuthService::new(&fx.store, &fx.codec);
        assert!(matches!(
            auth.signin("a@x.com", "old-password").await,
            Err(AuthError::InvalidPassword)
        ));
        auth.signin("a@x.com", "new-pw").await.unwrap();
    }
}
