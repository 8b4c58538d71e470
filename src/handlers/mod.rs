pub mod auth;
pub mod categories;
pub mod customers;
pub mod kyc;
pub mod products;
pub mod sales;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{ActorType, AuthUser};
use crate::error::AppError;
use crate::AppState;

/// Uniform response envelope: `{success, data}` or `{success, message}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    pub fn data_with_message(data: T, message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        })
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn message(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// The auth middleware only attaches an identity when a valid token is
/// present; handlers that need one turn its absence into a 401 here.
pub fn require_auth(user: Option<&AuthUser>) -> Result<AuthUser, AppError> {
    user.cloned()
        .ok_or_else(|| AppError::Unauthorized("Not authorized to access this route".to_string()))
}

pub fn require_customer(user: Option<&AuthUser>) -> Result<AuthUser, AppError> {
    let user = require_auth(user)?;
    if user.actor != ActorType::Customer {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(user)
}

pub fn require_staff(user: Option<&AuthUser>) -> Result<AuthUser, AppError> {
    let user = require_auth(user)?;
    if !user.is_staff() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(user)
}

#[derive(Debug, Serialize)]
pub struct DbPoolStats {
    pub active_connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub db: String,
    pub db_pool: DbPoolStats,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let pool = &state.db;
    let pool_stats = DbPoolStats {
        active_connections: pool.size(),
        idle_connections: pool.num_idle() as u32,
        max_connections: pool.options().get_max_connections(),
    };

    let health_response = HealthStatus {
        status: if db_status == "connected" {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        db: db_status.to_string(),
        db_pool: pool_stats,
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination {
            limit: None,
            offset: None,
        };
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 0);

        let p = Pagination {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(p.limit(), 100);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn require_auth_rejects_anonymous() {
        assert!(require_auth(None).is_err());
    }

    #[test]
    fn require_customer_rejects_other_actors() {
        let staff = AuthUser {
            id: Uuid::new_v4(),
            actor: ActorType::User,
            role: Some(crate::db::models::StaffRole::Admin),
        };

        assert!(require_customer(Some(&staff)).is_err());
        assert!(require_staff(Some(&staff)).is_ok());
    }

    #[test]
    fn envelope_omits_empty_fields() {
        let Json(body) = ApiResponse::data(serde_json::json!({"k": "v"}));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("message").is_none());

        let Json(body) = ApiResponse::message("done");
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["message"], "done");
    }
}
