use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::auth::ActorType;
use crate::error::AppError;
use crate::services::customers::{RegisterCustomer, RegisterUser, RegisterVendor};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account fields plus the freshly issued bearer token. Password hashes
/// never serialize off the models, so embedding the row is safe.
#[derive(Debug, Serialize)]
pub struct AuthPayload<T: Serialize> {
    #[serde(flatten)]
    pub account: T,
    pub token: String,
}

fn issue<T: Serialize>(
    state: &AppState,
    id: uuid::Uuid,
    actor: ActorType,
    account: T,
) -> Result<AuthPayload<T>, AppError> {
    let token = state
        .tokens
        .issue(id, actor)
        .map_err(|e| AppError::Internal(format!("token issuance failed: {}", e)))?;

    Ok(AuthPayload { account, token })
}

pub async fn register_customer(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCustomer>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state.customers.register_customer(payload).await?;
    let payload = issue(&state, customer.id, ActorType::Customer, customer)?;

    Ok((StatusCode::CREATED, ApiResponse::data(payload)))
}

pub async fn login_customer(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .customers
        .login_customer(&payload.email, &payload.password)
        .await?;
    let payload = issue(&state, customer.id, ActorType::Customer, customer)?;

    Ok(ApiResponse::data(payload))
}

pub async fn register_vendor(
    State(state): State<AppState>,
    Json(payload): Json<RegisterVendor>,
) -> Result<impl IntoResponse, AppError> {
    let vendor = state.customers.register_vendor(payload).await?;
    let payload = issue(&state, vendor.id, ActorType::Vendor, vendor)?;

    Ok((StatusCode::CREATED, ApiResponse::data(payload)))
}

pub async fn login_vendor(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let vendor = state
        .customers
        .login_vendor(&payload.email, &payload.password)
        .await?;
    let payload = issue(&state, vendor.id, ActorType::Vendor, vendor)?;

    Ok(ApiResponse::data(payload))
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.customers.register_user(payload).await?;
    let payload = issue(&state, user.id, ActorType::User, user)?;

    Ok((StatusCode::CREATED, ApiResponse::data(payload)))
}

pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .customers
        .login_user(&payload.email, &payload.password)
        .await?;
    let payload = issue(&state, user.id, ActorType::User, user)?;

    Ok(ApiResponse::data(payload))
}
