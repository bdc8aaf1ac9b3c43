//! Account domain types.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use fitshop_core::{Email, PermissionSet, UserId};

/// How long a password reset credential stays valid after issuance.
pub const RESET_TOKEN_TTL_SECONDS: i64 = 3600;

/// An account (domain type).
///
/// The password hash and any reset credential are deliberately absent: they
/// are only ever read through dedicated Store methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique account ID.
    pub id: UserId,
    /// Lowercased, unique email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Permissions held by this account.
    pub permissions: PermissionSet,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub password_hash: String,
    pub permissions: PermissionSet,
}

/// A single-use, time-bound password reset credential.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetCredential {
    /// 40 hex characters (20 random bytes).
    pub token: String,
    /// The credential is accepted up to and including this instant.
    pub expires_at: DateTime<Utc>,
}

impl ResetCredential {
    /// Build a credential for `token` issued at `issued_at`.
    #[must_use]
    pub fn issued_at(token: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            token,
            expires_at: issued_at + Duration::seconds(RESET_TOKEN_TTL_SECONDS),
        }
    }

    /// Whether the credential is still accepted at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at >= now
    }
}

impl std::fmt::Debug for ResetCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetCredential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
