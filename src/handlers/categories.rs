use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{require_staff, ApiResponse};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::services::catalog::CategoryUpdate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<NewCategory>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_staff(user.as_deref())?;

    let category = state
        .catalog
        .create_category(&user, payload.name, payload.parent_id)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::data(category)))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = state.catalog.list_categories().await?;

    Ok(ApiResponse::data(categories))
}

pub async fn tree(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let tree = state.catalog.category_tree().await?;

    Ok(ApiResponse::data(tree))
}

pub async fn update(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_staff(user.as_deref())?;

    let category = state.catalog.update_category(&user, id, payload).await?;

    Ok(ApiResponse::data(category))
}
