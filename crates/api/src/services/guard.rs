//! Authorization checks over a [`SessionContext`].
//!
//! All checks are pure functions of the context. They return the acting user
//! on success so callers don't have to unwrap the identity a second time.

use fitshop_core::{Permission, UserId};

use crate::models::{SessionContext, User};
use crate::services::AuthError;

/// Permissions that may edit any item.
pub const ITEM_UPDATE_PERMISSIONS: &[Permission] = &[Permission::Admin, Permission::ItemUpdate];

/// Permissions that may delete any item.
pub const ITEM_DELETE_PERMISSIONS: &[Permission] = &[Permission::Admin, Permission::ItemDelete];

/// Permissions that may view accounts and change their permissions.
pub const PERMISSION_ADMIN_PERMISSIONS: &[Permission] =
    &[Permission::Admin, Permission::PermissionUpdate];

/// Fail unless the request carries an identity.
///
/// # Errors
///
/// Returns `AuthError::Unauthenticated` for an anonymous context.
pub fn require_authenticated(ctx: &SessionContext) -> Result<&User, AuthError> {
    ctx.user().ok_or(AuthError::Unauthenticated)
}

/// Fail unless the identity holds at least one of `allowed`.
///
/// An empty `allowed` set admits nobody.
///
/// # Errors
///
/// Returns `AuthError::Unauthenticated` for an anonymous context and
/// `AuthError::Forbidden` if no permission matches.
pub fn require_any_permission<'a>(
    ctx: &'a SessionContext,
    allowed: &[Permission],
) -> Result<&'a User, AuthError> {
    let user = require_authenticated(ctx)?;
    if user.permissions.intersects(allowed) {
        Ok(user)
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Pass if the identity owns the resource, otherwise fall back to
/// [`require_any_permission`].
///
/// # Errors
///
/// Returns `AuthError::Unauthenticated` for an anonymous context and
/// `AuthError::Forbidden` for a non-owner without a matching permission.
pub fn require_ownership_or_permission<'a>(
    ctx: &'a SessionContext,
    owner: UserId,
    allowed: &[Permission],
) -> Result<&'a User, AuthError> {
    let user = require_authenticated(ctx)?;
    if user.id == owner {
        return Ok(user);
    }
    require_any_permission(ctx, allowed)
}
