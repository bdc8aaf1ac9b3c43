//! Authentication service.
//!
//! Password signup and signin, session token issuance, and account
//! administration (listing accounts, replacing permission sets).

mod error;
pub mod token;

pub use error::AuthError;
pub use token::TokenCodec;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use fitshop_core::{Email, PermissionSet, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, SessionContext, User};
use crate::services::guard::{PERMISSION_ADMIN_PERMISSIONS, require_any_permission};

/// An account together with a freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    codec: &'a TokenCodec,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, codec: &'a TokenCodec) -> Self {
        Self { store, codec }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new account. The account always starts with exactly `{USER}`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidInput` if the password or name is empty.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password), fields(user_id))]
    pub async fn signup(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<IssuedSession, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::InvalidInput("name must not be empty".to_string()));
        }

        let password_hash = hash_password(password.to_string()).await?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                name: name.to_string(),
                password_hash,
                permissions: PermissionSet::signup_default(),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::Span::current().record("user_id", user.id.as_i32());
        tracing::info!("account created");

        Ok(self.issue(user))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    /// Returns `AuthError::InvalidPassword` if the password is wrong.
    #[instrument(skip(self, password), fields(user_id))]
    pub async fn signin(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .store
            .find_password_hash(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(password.to_string(), password_hash).await?;

        tracing::Span::current().record("user_id", user.id.as_i32());
        Ok(self.issue(user))
    }

    /// Wrap an account with a new session token.
    #[must_use]
    pub fn issue(&self, user: User) -> IssuedSession {
        let token = self.codec.issue(user.id);
        IssuedSession { user, token }
    }

    // =========================================================================
    // Account Administration
    // =========================================================================

    /// List all accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` unless the caller holds `ADMIN` or
    /// `PERMISSIONUPDATE`.
    pub async fn list_users(&self, ctx: &SessionContext) -> Result<Vec<User>, AuthError> {
        require_any_permission(ctx, PERMISSION_ADMIN_PERMISSIONS)?;
        Ok(self.store.list_users().await?)
    }

    /// Replace the permission set of `target`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` unless the caller holds `ADMIN` or
    /// `PERMISSIONUPDATE`, `AuthError::InvalidInput` for an empty set, and
    /// `AuthError::NotFound` if the target does not exist.
    #[instrument(skip(self, ctx), fields(caller = ?ctx.user_id()))]
    pub async fn update_permissions(
        &self,
        ctx: &SessionContext,
        target: UserId,
        permissions: PermissionSet,
    ) -> Result<User, AuthError> {
        require_any_permission(ctx, PERMISSION_ADMIN_PERMISSIONS)?;
        if permissions.is_empty() {
            return Err(AuthError::InvalidInput(
                "an account must keep at least one permission".to_string(),
            ));
        }

        let user = self
            .store
            .update_permissions(target, &permissions)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::NotFound("user"),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(target_user = %user.id, "permissions updated");
        Ok(user)
    }
}

/// Validate password meets requirements.
pub(crate) fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(())
}

/// Hash a password with Argon2id on a blocking worker.
pub(crate) async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    })
    .await?
}

/// Verify a password against a stored hash on a blocking worker.
async fn verify_password(password: String, hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash).map_err(|_| AuthError::PasswordHash)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidPassword)
    })
    .await?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitshop_core::Permission;
    use secrecy::SecretString;

    use super::*;
    use crate::db::{MemoryStore, UserStore};

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from("k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_signup_grants_exactly_user() {
        let store = MemoryStore::new();
        let codec = codec();
        let auth = AuthService::new(&store, &codec);

        let session = auth.signup("A@X.com", "Ann", "pw123").await.unwrap();

        assert_eq!(session.user.email.as_str(), "a@x.com");
        assert_eq!(session.user.permissions, PermissionSet::signup_default());
        assert_eq!(codec.verify(&session.token).unwrap(), session.user.id);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let codec = codec();
        let auth = AuthService::new(&store, &codec);
        auth.signup("a@x.com", "Ann", "pw123").await.unwrap();

        let result = auth.signup("a@x.com", "Ann", "pw456").await;
        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_signup_rejects_empty_password() {
        let store = MemoryStore::new();
        let codec = codec();
        let auth = AuthService::new(&store, &codec);

        let result = auth.signup("a@x.com", "Ann", "").await;
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_signin_distinguishes_failures() {
        let store = MemoryStore::new();
        let codec = codec();
        let auth = AuthService::new(&store, &codec);
        let created = auth.signup("a@x.com", "Ann", "pw123").await.unwrap();

        assert!(matches!(
            auth.signin("b@x.com", "pw123").await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            auth.signin("a@x.com", "wrong").await,
            Err(AuthError::InvalidPassword)
        ));

        let session = auth.signin("A@x.com", "pw123").await.unwrap();
        assert_eq!(session.user.id, created.user.id);
        assert_eq!(codec.verify(&session.token).unwrap(), created.user.id);
    }

    #[tokio::test]
    async fn test_update_permissions_requires_admin() {
        let store = MemoryStore::new();
        let codec = codec();
        let auth = AuthService::new(&store, &codec);
        let ann = auth.signup("a@x.com", "Ann", "pw123").await.unwrap().user;
        let bob = auth.signup("b@x.com", "Bob", "pw123").await.unwrap().user;
        let grant: PermissionSet = [Permission::User, Permission::ItemDelete].into_iter().collect();

        let as_bob = SessionContext::authenticated(bob.clone());
        assert!(matches!(
            auth.update_permissions(&as_bob, ann.id, grant.clone()).await,
            Err(AuthError::Forbidden)
        ));

        let admin = store
            .update_permissions(bob.id, &[Permission::Admin].into_iter().collect())
            .await
            .unwrap();
        let as_admin = SessionContext::authenticated(admin);
        let updated = auth.update_permissions(&as_admin, ann.id, grant.clone()).await.unwrap();
        assert_eq!(updated.permissions, grant);

        assert!(matches!(
            auth.update_permissions(&as_admin, ann.id, PermissionSet::default()).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.update_permissions(&as_admin, UserId::new(999), grant).await,
            Err(AuthError::NotFound("user"))
        ));
    }
}
