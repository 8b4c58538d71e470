use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Reconciliation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            // A gateway that answered but rejected the charge is a caller
            // failure (400); an unreachable gateway is an upstream one.
            AppError::Gateway(GatewayError::Rejected(_)) => StatusCode::BAD_REQUEST,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            // Money moved at the gateway but the local apply failed; the
            // caller must retry Verify with the same reference.
            AppError::Reconciliation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to put on the wire. Storage and internal failures are
    /// collapsed so no query text or connection detail leaks.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation("Invalid input".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_business_rule_error_status_code() {
        let error = AppError::BusinessRule("Insufficient product quantity".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::NotFound("Sale not found".to_string());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_forbidden_error_status_code() {
        let error = AppError::Forbidden("Not authorized to cancel this sale".to_string());
        assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_database_error_status_code() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_database_error_hides_detail() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(error.public_message(), "Internal server error");
    }

    #[test]
    fn test_gateway_rejection_is_bad_request() {
        let error = AppError::Gateway(GatewayError::Rejected(
            "Payment was not successful".to_string(),
        ));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_gateway_transport_error_is_bad_gateway() {
        let error = AppError::Gateway(GatewayError::CircuitOpen);
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_reconciliation_error_is_retriable_500() {
        let error = AppError::Reconciliation("payment applied to cancelled sale".to_string());
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_response_envelope() {
        let error = AppError::BusinessRule("Payment amount exceeds remaining balance".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
