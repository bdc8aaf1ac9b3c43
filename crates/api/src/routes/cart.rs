//! Cart handlers.

use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;

use fitshop_core::{CartItemId, ItemId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{CartLine, SessionContext};
use crate::services::CartReconciler;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub item_id: ItemId,
}

/// `GET /cart`
pub async fn show(State(state): State<AppState>, ctx: SessionContext) -> Result<Json<Vec<CartLine>>> {
    Ok(Json(CartReconciler::new(state.store()).list(&ctx).await?))
}

/// `POST /cart`
pub async fn add(
    State(state): State<AppState>,
    ctx: SessionContext,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<Json<CartLine>> {
    let line = CartReconciler::new(state.store())
        .add_item(&ctx, body.item_id)
        .await?;
    Ok(Json(line))
}

/// `DELETE /cart/{id}`
pub async fn remove(
    State(state): State<AppState>,
    ctx: SessionContext,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<Json<CartLine>> {
    let line = CartReconciler::new(state.store())
        .remove_item(&ctx, id)
        .await?;
    Ok(Json(line))
}
