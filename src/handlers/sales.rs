use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{require_auth, require_customer, ApiResponse, Pagination};
use crate::auth::AuthUser;
use crate::db::models::{Payment, Sale};
use crate::domain::sale::SaleStatus;
use crate::error::AppError;
use crate::services::sales::{NewSale, SaleFilters};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdditionalPaymentRequest {
    pub sale_id: Uuid,
    pub amount: BigDecimal,
}

// Kept flat: axum's Query extractor cannot deserialize nested/flattened
// structs from a query string.
#[derive(Debug, Deserialize)]
pub struct SaleListQuery {
    pub status: Option<SaleStatus>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub payments: Vec<Payment>,
}

pub async fn initialize(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<NewSale>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_customer(user.as_deref())?;

    let initiated = state.sales.initiate_sale(user.id, payload).await?;

    Ok(ApiResponse::data(initiated))
}

/// Verification target for both the gateway callback redirect and manual
/// polling; safe to hit any number of times for the same reference.
pub async fn verify(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.sales.verify(&reference).await?;

    Ok(ApiResponse::data_with_message(
        snapshot,
        "Payment verified successfully",
    ))
}

pub async fn additional_payment(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<AdditionalPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_customer(user.as_deref())?;

    let initiated = state
        .sales
        .make_additional_payment(user.id, payload.sale_id, payload.amount)
        .await?;

    Ok(ApiResponse::data(initiated))
}

pub async fn list(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_auth(user.as_deref())?;

    let pagination = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    let filters = SaleFilters {
        status: query.status,
        customer_id: query.customer_id,
        product_id: query.product_id,
    };

    let sales = state
        .sales
        .list_sales(&user, filters, pagination.limit(), pagination.offset())
        .await?;

    Ok(ApiResponse::data(sales))
}

pub async fn get(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_auth(user.as_deref())?;

    let (sale, payments) = state.sales.get_sale(&user, id).await?;

    Ok(ApiResponse::data(SaleDetail { sale, payments }))
}

pub async fn cancel(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_auth(user.as_deref())?;

    state.sales.cancel_sale(&user, id).await?;

    Ok(ApiResponse::message("Sale cancelled successfully"))
}
