//! Account persistence.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use fitshop_core::{Email, PermissionSet, UserId};

use super::{PgStore, RepositoryError, map_unique_violation};
use crate::models::{NewUser, ResetCredential, User};

/// Store operations on accounts.
pub trait UserStore: Send + Sync {
    /// Create an account.
    ///
    /// Fails with `RepositoryError::Conflict` if the email is taken.
    fn create_user(&self, new_user: NewUser) -> BoxFuture<'_, Result<User, RepositoryError>>;

    fn find_user_by_id(&self, id: UserId) -> BoxFuture<'_, Result<Option<User>, RepositoryError>>;

    fn find_user_by_email<'a>(
        &'a self,
        email: &'a Email,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>>;

    /// Fetch an account together with its password hash.
    fn find_password_hash<'a>(
        &'a self,
        email: &'a Email,
    ) -> BoxFuture<'a, Result<Option<(User, String)>, RepositoryError>>;

    /// All accounts, oldest first.
    fn list_users(&self) -> BoxFuture<'_, Result<Vec<User>, RepositoryError>>;

    /// Replace an account's permission set.
    ///
    /// Fails with `RepositoryError::NotFound` if the account does not exist.
    fn update_permissions<'a>(
        &'a self,
        id: UserId,
        permissions: &'a PermissionSet,
    ) -> BoxFuture<'a, Result<User, RepositoryError>>;

    /// Attach a reset credential, overwriting any previous one.
    ///
    /// Fails with `RepositoryError::NotFound` if the account does not exist.
    fn set_reset_token<'a>(
        &'a self,
        id: UserId,
        credential: &'a ResetCredential,
    ) -> BoxFuture<'a, Result<(), RepositoryError>>;

    /// Find the account whose reset token equals `token` and has not expired at `now`.
    fn find_user_by_reset_token<'a>(
        &'a self,
        token: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>>;

    /// Store a new password hash and clear the reset credential, provided the
    /// account still holds `token` and it has not expired at `now`. Returns
    /// `None` otherwise.
    fn complete_password_reset<'a>(
        &'a self,
        id: UserId,
        token: &'a str,
        password_hash: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;
        let permissions = PermissionSet::from_strings(&row.permissions)
            .map_err(|e| RepositoryError::DataCorruption(format!("user {}: {e}", row.id)))?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            permissions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl UserStore for PgStore {
    fn create_user(&self, new_user: NewUser) -> BoxFuture<'_, Result<User, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, UserRow>(
                r"
                INSERT INTO users (email, name, password_hash, permissions)
                VALUES ($1, $2, $3, $4)
                RETURNING id, email, name, permissions, created_at, updated_at
                ",
            )
            .bind(new_user.email.as_str())
            .bind(&new_user.name)
            .bind(&new_user.password_hash)
            .bind(new_user.permissions.to_strings())
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_unique_violation(e, "email"))?;

            row.try_into()
        })
    }

    fn find_user_by_id(&self, id: UserId) -> BoxFuture<'_, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(
                r"
                SELECT id, email, name, permissions, created_at, updated_at
                FROM users
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
        })
    }

    fn find_user_by_email<'a>(
        &'a self,
        email: &'a Email,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(
                r"
                SELECT id, email, name, permissions, created_at, updated_at
                FROM users
                WHERE email = $1
                ",
            )
            .bind(email.as_str())
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
        })
    }

    fn find_password_hash<'a>(
        &'a self,
        email: &'a Email,
    ) -> BoxFuture<'a, Result<Option<(User, String)>, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, UserWithHashRow>(
                r"
                SELECT id, email, name, permissions, created_at, updated_at, password_hash
                FROM users
                WHERE email = $1
                ",
            )
            .bind(email.as_str())
            .fetch_optional(self.pool())
            .await?;

            let Some(row) = row else {
                return Ok(None);
            };
            Ok(Some((row.user.try_into()?, row.password_hash)))
        })
    }

    fn list_users(&self) -> BoxFuture<'_, Result<Vec<User>, RepositoryError>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(
                r"
                SELECT id, email, name, permissions, created_at, updated_at
                FROM users
                ORDER BY id ASC
                ",
            )
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
        })
    }

    fn update_permissions<'a>(
        &'a self,
        id: UserId,
        permissions: &'a PermissionSet,
    ) -> BoxFuture<'a, Result<User, RepositoryError>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(
                r"
                UPDATE users
                SET permissions = $2, updated_at = now()
                WHERE id = $1
                RETURNING id, email, name, permissions, created_at, updated_at
                ",
            )
            .bind(id)
            .bind(permissions.to_strings())
            .fetch_optional(self.pool())
            .await?
            .ok_or(RepositoryError::NotFound)?
            .try_into()
        })
    }

    fn set_reset_token<'a>(
        &'a self,
        id: UserId,
        credential: &'a ResetCredential,
    ) -> BoxFuture<'a, Result<(), RepositoryError>> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE users
                SET reset_token = $2, reset_token_expiry = $3, updated_at = now()
                WHERE id = $1
                ",
            )
            .bind(id)
            .bind(&credential.token)
            .bind(credential.expires_at)
            .execute(self.pool())
            .await
            .map_err(|e| map_unique_violation(e, "reset token"))?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn find_user_by_reset_token<'a>(
        &'a self,
        token: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(
                r"
                SELECT id, email, name, permissions, created_at, updated_at
                FROM users
                WHERE reset_token = $1 AND reset_token_expiry >= $2
                ",
            )
            .bind(token)
            .bind(now)
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
        })
    }

    fn complete_password_reset<'a>(
        &'a self,
        id: UserId,
        token: &'a str,
        password_hash: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Option<User>, RepositoryError>> {
        Box::pin(async move {
            sqlx::query_as::<_, UserRow>(
                r"
                UPDATE users
                SET password_hash = $3,
                    reset_token = NULL,
                    reset_token_expiry = NULL,
                    updated_at = now()
                WHERE id = $1 AND reset_token = $2 AND reset_token_expiry >= $4
                RETURNING id, email, name, permissions, created_at, updated_at
                ",
            )
            .bind(id)
            .bind(token)
            .bind(password_hash)
            .bind(now)
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
        })
    }
}
