//! Item persistence.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use fitshop_core::{ItemId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{Item, ItemUpdate, NewItem};

/// Store operations on items.
pub trait ItemStore: Send + Sync {
    fn create_item(&self, new_item: NewItem) -> BoxFuture<'_, Result<Item, RepositoryError>>;

    fn find_item(&self, id: ItemId) -> BoxFuture<'_, Result<Option<Item>, RepositoryError>>;

    /// All items, newest first.
    fn list_items(&self) -> BoxFuture<'_, Result<Vec<Item>, RepositoryError>>;

    /// Apply a partial update. Returns `None` if the item does not exist.
    fn update_item<'a>(
        &'a self,
        id: ItemId,
        update: &'a ItemUpdate,
    ) -> BoxFuture<'a, Result<Option<Item>, RepositoryError>>;

    /// Delete an item (and any cart lines pointing at it). Returns the removed item.
    fn delete_item(&self, id: ItemId) -> BoxFuture<'_, Result<Option<Item>, RepositoryError>>;
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: ItemId,
    owner_id: UserId,
    title: String,
    description: String,
    price: i32,
    image: Option<String>,
    large_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            price: row.price,
            image: row.image,
            large_image: row.large_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl ItemStore for PgStore {
    fn create_item(&self, new_item: NewItem) -> BoxFuture<'_, Result<Item, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, ItemRow>(
                r"
                INSERT INTO items (owner_id, title, description, price, image, large_image)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, owner_id, title, description, price, image, large_image,
                          created_at, updated_at
                ",
            )
            .bind(new_item.owner_id)
            .bind(&new_item.title)
            .bind(&new_item.description)
            .bind(new_item.price)
            .bind(&new_item.image)
            .bind(&new_item.large_image)
            .fetch_one(self.pool())
            .await?;

            Ok(row.into())
        })
    }

    fn find_item(&self, id: ItemId) -> BoxFuture<'_, Result<Option<Item>, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, ItemRow>(
                r"
                SELECT id, owner_id, title, description, price, image, large_image,
                       created_at, updated_at
                FROM items
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

            Ok(row.map(Item::from))
        })
    }

    fn list_items(&self) -> BoxFuture<'_, Result<Vec<Item>, RepositoryError>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, ItemRow>(
                r"
                SELECT id, owner_id, title, description, price, image, large_image,
                       created_at, updated_at
                FROM items
                ORDER BY created_at DESC, id DESC
                ",
            )
            .fetch_all(self.pool())
            .await?;

            Ok(rows.into_iter().map(Item::from).collect())
        })
    }

    fn update_item<'a>(
        &'a self,
        id: ItemId,
        update: &'a ItemUpdate,
    ) -> BoxFuture<'a, Result<Option<Item>, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, ItemRow>(
                r"
                UPDATE items
                SET title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    price = COALESCE($4, price),
                    image = COALESCE($5, image),
                    large_image = COALESCE($6, large_image),
                    updated_at = now()
                WHERE id = $1
                RETURNING id, owner_id, title, description, price, image, large_image,
                          created_at, updated_at
                ",
            )
            .bind(id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.price)
            .bind(&update.image)
            .bind(&update.large_image)
            .fetch_optional(self.pool())
            .await?;

            Ok(row.map(Item::from))
        })
    }

    fn delete_item(&self, id: ItemId) -> BoxFuture<'_, Result<Option<Item>, RepositoryError>> {
        Box::pin(async move {
            // cart_items.item_id cascades
            let row = sqlx::query_as::<_, ItemRow>(
                r"
                DELETE FROM items
                WHERE id = $1
                RETURNING id, owner_id, title, description, price, image, large_image,
                          created_at, updated_at
                ",
            )
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

            Ok(row.map(Item::from))
        })
    }
}
