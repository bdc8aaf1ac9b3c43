//! Account administration handlers.

use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;

use fitshop_core::{Permission, PermissionSet, UserId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{SessionContext, User};
use crate::services::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    /// Unknown names are rejected during deserialization.
    pub permissions: Vec<Permission>,
}

/// `GET /users`
pub async fn index(State(state): State<AppState>, ctx: SessionContext) -> Result<Json<Vec<User>>> {
    let users = AuthService::new(state.store(), state.codec())
        .list_users(&ctx)
        .await?;
    Ok(Json(users))
}

/// `PUT /users/{id}/permissions`
pub async fn update_permissions(
    State(state): State<AppState>,
    ctx: SessionContext,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<UpdatePermissionsRequest>,
) -> Result<Json<User>> {
    let permissions: PermissionSet = body.permissions.into_iter().collect();
    let user = AuthService::new(state.store(), state.codec())
        .update_permissions(&ctx, id, permissions)
        .await?;
    Ok(Json(user))
}
