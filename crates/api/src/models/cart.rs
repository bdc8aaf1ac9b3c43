//! Cart line domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fitshop_core::{CartItemId, ItemId, UserId};

/// A per-account, per-item quantity record.
///
/// At most one line exists per `(owner_id, item_id)`; `quantity` is at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartItemId,
    pub owner_id: UserId,
    pub item_id: ItemId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}
