//! Cart reconciliation.

use tracing::instrument;

use fitshop_core::{CartItemId, ItemId};

use crate::db::{RepositoryError, Store};
use crate::models::{CartLine, SessionContext};
use crate::services::AuthError;
use crate::services::guard::{require_authenticated, require_ownership_or_permission};

/// Adds and removes lines in the caller's cart.
pub struct CartReconciler<'a> {
    store: &'a dyn Store,
}

impl<'a> CartReconciler<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The caller's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` for an anonymous caller.
    pub async fn list(&self, ctx: &SessionContext) -> Result<Vec<CartLine>, AuthError> {
        let user = require_authenticated(ctx)?;
        Ok(self.store.list_cart_items(user.id).await?)
    }

    /// Put `item_id` in the caller's cart, or bump its quantity by one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` for an anonymous caller and
    /// `AuthError::NotFound` if the item does not exist.
    #[instrument(skip(self, ctx), fields(user_id = ?ctx.user_id()))]
    pub async fn add_item(
        &self,
        ctx: &SessionContext,
        item_id: ItemId,
    ) -> Result<CartLine, AuthError> {
        let user = require_authenticated(ctx)?;

        let line = self
            .store
            .add_or_increment_cart_item(user.id, item_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::NotFound("item"),
                other => AuthError::Repository(other),
            })?;

        tracing::debug!(cart_item_id = %line.id, quantity = line.quantity, "cart line updated");
        Ok(line)
    }

    /// Remove one of the caller's cart lines. Only the owner may do this.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the line does not exist and
    /// `AuthError::Forbidden` if it belongs to someone else.
    #[instrument(skip(self, ctx), fields(user_id = ?ctx.user_id()))]
    pub async fn remove_item(
        &self,
        ctx: &SessionContext,
        cart_item_id: CartItemId,
    ) -> Result<CartLine, AuthError> {
        require_authenticated(ctx)?;

        let line = self
            .store
            .find_cart_item(cart_item_id)
            .await?
            .ok_or(AuthError::NotFound("cart item"))?;
        require_ownership_or_permission(ctx, line.owner_id, &[])?;

        self.store
            .delete_cart_item(cart_item_id)
            .await?
            .ok_or(AuthError::NotFound("cart item"))
    }
}
