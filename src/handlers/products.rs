use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{require_auth, ApiResponse, Pagination};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::services::catalog::{NewProduct, ProductFilters};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_auth(user.as_deref())?;

    let product = state.catalog.create_product(&user, payload).await?;

    Ok((StatusCode::CREATED, ApiResponse::data(product)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    let filters = ProductFilters {
        category_id: query.category_id,
        vendor_id: query.vendor_id,
        search: query.search,
    };

    let products = state
        .catalog
        .list_products(filters, pagination.limit(), pagination.offset())
        .await?;

    Ok(ApiResponse::data(products))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.catalog.get_product(id).await?;

    Ok(ApiResponse::data(product))
}
