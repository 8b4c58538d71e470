use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{require_customer, ApiResponse};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::services::customers::NewAddress;
use crate::AppState;

pub async fn me(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_customer(user.as_deref())?;

    let customer = state.customers.get_customer(user.id).await?;

    Ok(ApiResponse::data(customer))
}

pub async fn add_address(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<NewAddress>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_customer(user.as_deref())?;

    let address = state.customers.add_address(user.id, payload).await?;

    Ok((StatusCode::CREATED, ApiResponse::data(address)))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_customer(user.as_deref())?;

    let addresses = state.customers.list_addresses(user.id).await?;

    Ok(ApiResponse::data(addresses))
}
