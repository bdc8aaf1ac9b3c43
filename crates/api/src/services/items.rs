//! Item listing and ownership-gated mutation.

use tracing::instrument;

use fitshop_core::ItemId;

use crate::db::Store;
use crate::models::{Item, ItemUpdate, NewItem, SessionContext};
use crate::services::AuthError;
use crate::services::guard::{
    ITEM_DELETE_PERMISSIONS, ITEM_UPDATE_PERMISSIONS, require_authenticated,
    require_ownership_or_permission,
};

/// Fields a caller supplies when creating an item.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub title: String,
    pub description: String,
    pub price: i32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub large_image: Option<String>,
}

pub struct ItemService<'a> {
    store: &'a dyn Store,
}

impl<'a> ItemService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Store failures only.
    pub async fn list(&self) -> Result<Vec<Item>, AuthError> {
        Ok(self.store.list_items().await?)
    }

    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the item does not exist.
    pub async fn get(&self, id: ItemId) -> Result<Item, AuthError> {
        self.store
            .find_item(id)
            .await?
            .ok_or(AuthError::NotFound("item"))
    }

    /// Create an item owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` for an anonymous caller and
    /// `AuthError::InvalidInput` for an empty title or negative price.
    #[instrument(skip(self, ctx, draft), fields(user_id = ?ctx.user_id()))]
    pub async fn create(&self, ctx: &SessionContext, draft: ItemDraft) -> Result<Item, AuthError> {
        let user = require_authenticated(ctx)?;
        validate(Some(&draft.title), Some(draft.price))?;

        let item = self
            .store
            .create_item(NewItem {
                owner_id: user.id,
                title: draft.title,
                description: draft.description,
                price: draft.price,
                image: draft.image,
                large_image: draft.large_image,
            })
            .await?;

        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// Edit an item. Allowed for its owner, `ADMIN`, or `ITEMUPDATE`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the item does not exist and
    /// `AuthError::Forbidden` if the caller may not edit it.
    #[instrument(skip(self, ctx, update), fields(user_id = ?ctx.user_id()))]
    pub async fn update(
        &self,
        ctx: &SessionContext,
        id: ItemId,
        update: ItemUpdate,
    ) -> Result<Item, AuthError> {
        let item = self.get(id).await?;
        require_ownership_or_permission(ctx, item.owner_id, ITEM_UPDATE_PERMISSIONS)?;
        validate(update.title.as_ref(), update.price)?;

        self.store
            .update_item(id, &update)
            .await?
            .ok_or(AuthError::NotFound("item"))
    }

    /// Delete an item. Allowed for its owner, `ADMIN`, or `ITEMDELETE`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the item does not exist and
    /// `AuthError::Forbidden` if the caller may not delete it.
    #[instrument(skip(self, ctx), fields(user_id = ?ctx.user_id()))]
    pub async fn delete(&self, ctx: &SessionContext, id: ItemId) -> Result<Item, AuthError> {
        let item = self.get(id).await?;
        require_ownership_or_permission(ctx, item.owner_id, ITEM_DELETE_PERMISSIONS)?;

        let removed = self
            .store
            .delete_item(id)
            .await?
            .ok_or(AuthError::NotFound("item"))?;
        tracing::info!(item_id = %removed.id, "item deleted");
        Ok(removed)
    }
}

fn validate(title: Option<&String>, price: Option<i32>) -> Result<(), AuthError> {
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(AuthError::InvalidInput("title must not be empty".to_string()));
    }
    if price.is_some_and(|p| p < 0) {
        return Err(AuthError::InvalidInput("price must not be negative".to_string()));
    }
    Ok(())
}
