//! Item handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use fitshop_core::ItemId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Item, ItemUpdate, SessionContext};
use crate::services::{ItemDraft, ItemService};
use crate::state::AppState;

/// `GET /items`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    Ok(Json(ItemService::new(state.store()).list().await?))
}

/// `GET /items/{id}`
pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<ItemId>) -> Result<Json<Item>> {
    Ok(Json(ItemService::new(state.store()).get(id).await?))
}

/// `POST /items`
pub async fn create(
    State(state): State<AppState>,
    ctx: SessionContext,
    ApiJson(draft): ApiJson<ItemDraft>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = ItemService::new(state.store()).create(&ctx, draft).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PATCH /items/{id}`
pub async fn update(
    State(state): State<AppState>,
    ctx: SessionContext,
    ApiPath(id): ApiPath<ItemId>,
    ApiJson(update): ApiJson<ItemUpdate>,
) -> Result<Json<Item>> {
    Ok(Json(
        ItemService::new(state.store()).update(&ctx, id, update).await?,
    ))
}

/// `DELETE /items/{id}`
pub async fn delete(
    State(state): State<AppState>,
    ctx: SessionContext,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<Json<Item>> {
    Ok(Json(ItemService::new(state.store()).delete(&ctx, id).await?))
}
