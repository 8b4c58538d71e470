use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{require_auth, require_customer, ApiResponse, Pagination};
use crate::auth::AuthUser;
use crate::db::models::KycRequestStatus;
use crate::error::AppError;
use crate::services::kyc::{KycSubmission, ReviewDecision};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct KycListQuery {
    pub status: Option<KycRequestStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

pub async fn submit(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<KycSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_customer(user.as_deref())?;

    let request = state.kyc.submit(user.id, payload).await?;

    Ok((StatusCode::CREATED, ApiResponse::data(request)))
}

pub async fn list(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(query): Query<KycListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_auth(user.as_deref())?;

    let pagination = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let requests = state
        .kyc
        .list(&user, query.status, pagination.limit(), pagination.offset())
        .await?;

    Ok(ApiResponse::data(requests))
}

pub async fn review(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_auth(user.as_deref())?;

    let request = state.kyc.review(&user, id, payload.decision).await?;

    Ok(ApiResponse::data(request))
}
