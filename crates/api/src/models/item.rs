//! Item domain types.
//!
//! Only ownership matters to authorization; the remaining fields are carried
//! through to the Store untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fitshop_core::{ItemId, UserId};

/// A listed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// Account that created the item. Immutable after creation.
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    /// Price in cents.
    pub price: i32,
    pub image: Option<String>,
    pub large_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item. The owner comes from the session, not the client.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub price: i32,
    pub image: Option<String>,
    pub large_image: Option<String>,
}

/// Partial update of an item. `None` leaves the field unchanged.
///
/// There is no way to change `owner_id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i32>,
    pub image: Option<String>,
    pub large_image: Option<String>,
}

impl ItemUpdate {
    /// Apply the update to an in-memory item.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            item.description.clone_from(description);
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(image) = &self.image {
            item.image = Some(image.clone());
        }
        if let Some(large_image) = &self.large_image {
            item.large_image = Some(large_image.clone());
        }
    }
}
