//! Cart line persistence.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use fitshop_core::{CartItemId, ItemId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::CartLine;

/// Store operations on cart lines.
pub trait CartStore: Send + Sync {
    /// Create the `(owner, item)` line with quantity 1, or increment it if it
    /// already exists, as one atomic operation.
    fn add_or_increment_cart_item(
        &self,
        owner: UserId,
        item: ItemId,
    ) -> BoxFuture<'_, Result<CartLine, RepositoryError>>;

    fn find_cart_item(
        &self,
        id: CartItemId,
    ) -> BoxFuture<'_, Result<Option<CartLine>, RepositoryError>>;

    /// Lines owned by `owner`, oldest first.
    fn list_cart_items(&self, owner: UserId) -> BoxFuture<'_, Result<Vec<CartLine>, RepositoryError>>;

    /// Delete a line. Returns the removed line, or `None` if it did not exist.
    fn delete_cart_item(
        &self,
        id: CartItemId,
    ) -> BoxFuture<'_, Result<Option<CartLine>, RepositoryError>>;
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    user_id: UserId,
    item_id: ItemId,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.user_id,
            item_id: row.item_id,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

impl CartStore for PgStore {
    fn add_or_increment_cart_item(
        &self,
        owner: UserId,
        item: ItemId,
    ) -> BoxFuture<'_, Result<CartLine, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, CartLineRow>(
                r"
                INSERT INTO cart_items (user_id, item_id, quantity)
                VALUES ($1, $2, 1)
                ON CONFLICT (user_id, item_id)
                DO UPDATE SET quantity = cart_items.quantity + 1
                RETURNING id, user_id, item_id, quantity, created_at
                ",
            )
            .bind(owner)
            .bind(item)
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::Database(e)
            })?;

            Ok(row.into())
        })
    }

    fn find_cart_item(
        &self,
        id: CartItemId,
    ) -> BoxFuture<'_, Result<Option<CartLine>, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, CartLineRow>(
                r"
                SELECT id, user_id, item_id, quantity, created_at
                FROM cart_items
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

            Ok(row.map(CartLine::from))
        })
    }

    fn list_cart_items(&self, owner: UserId) -> BoxFuture<'_, Result<Vec<CartLine>, RepositoryError>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, CartLineRow>(
                r"
                SELECT id, user_id, item_id, quantity, created_at
                FROM cart_items
                WHERE user_id = $1
                ORDER BY created_at ASC, id ASC
                ",
            )
            .bind(owner)
            .fetch_all(self.pool())
            .await?;

            Ok(rows.into_iter().map(CartLine::from).collect())
        })
    }

    fn delete_cart_item(
        &self,
        id: CartItemId,
    ) -> BoxFuture<'_, Result<Option<CartLine>, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, CartLineRow>(
                r"
                DELETE FROM cart_items
                WHERE id = $1
                RETURNING id, user_id, item_id, quantity, created_at
                ",
            )
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

            Ok(row.map(CartLine::from))
        })
    }
}
