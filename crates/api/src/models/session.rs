//! Per-request session context.

use fitshop_core::UserId;

use super::User;

/// The identity attached to a single request.
///
/// Built once by the session middleware and never mutated afterwards;
/// handlers only ever see it by shared reference. A request without a
/// session cookie, or whose account no longer exists, is anonymous.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    identity: Option<User>,
}

impl SessionContext {
    /// A context with no identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { identity: None }
    }

    /// A context for a resolved account, permissions included.
    #[must_use]
    pub const fn authenticated(user: User) -> Self {
        Self {
            identity: Some(user),
        }
    }

    /// The resolved account, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    /// The resolved account ID, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|user| user.id)
    }
}
