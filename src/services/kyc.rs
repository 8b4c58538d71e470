//! Identity verification workflow: customers submit a document reference,
//! staff review it, and an approval flips the customer's KYC status, which
//! in turn gates partial payments. The review and the status flip share a
//! transaction so a request can never be approved without the customer
//! becoming verified.

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::models::{KycRequest, KycRequestStatus};
use crate::db::queries;
use crate::domain::sale::KycStatus;
use crate::error::AppError;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct KycSubmission {
    pub doc_ref: String,
    pub doc_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Clone)]
pub struct KycService {
    pool: PgPool,
}

impl KycService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(
        &self,
        customer_id: Uuid,
        submission: KycSubmission,
    ) -> Result<KycRequest, AppError> {
        let doc_ref = validation::sanitize_string(&submission.doc_ref);
        validation::validate_required("doc_ref", &doc_ref)
            .and_then(|_| {
                validation::validate_max_len("doc_ref", &doc_ref, validation::DOC_REF_MAX_LEN)
            })
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let now = Utc::now();
        let request = KycRequest {
            id: Uuid::new_v4(),
            customer_id,
            doc_ref,
            doc_type: submission.doc_type,
            status: KycRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let created = queries::insert_kyc_request(&self.pool, &request).await?;
        tracing::info!(kyc_id = %created.id, %customer_id, "kyc document submitted");
        Ok(created)
    }

    pub async fn list(
        &self,
        actor: &AuthUser,
        status: Option<KycRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KycRequest>, AppError> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        Ok(queries::list_kyc_requests(&self.pool, status, limit, offset).await?)
    }

    /// Reviews a pending request exactly once. The request row is locked
    /// so two staff members racing a decision cannot both apply one.
    pub async fn review(
        &self,
        actor: &AuthUser,
        request_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<KycRequest, AppError> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let request = queries::get_kyc_request_for_update(&mut tx, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("KYC request not found".to_string()))?;

        if request.status != KycRequestStatus::Pending {
            return Err(AppError::BusinessRule(
                "KYC request has already been reviewed".to_string(),
            ));
        }

        let (request_status, customer_status) = match decision {
            ReviewDecision::Approve => (KycRequestStatus::Approved, KycStatus::Verified),
            ReviewDecision::Reject => (KycRequestStatus::Rejected, KycStatus::Rejected),
        };

        queries::update_kyc_request_status(&mut tx, request_id, request_status).await?;

        let updated = queries::set_customer_kyc_status(&mut tx, request.customer_id, customer_status)
            .await?;
        if updated == 0 {
            return Err(AppError::NotFound("Customer not found".to_string()));
        }

        tx.commit().await?;

        tracing::info!(
            kyc_id = %request_id,
            customer_id = %request.customer_id,
            decision = ?decision,
            "kyc request reviewed"
        );

        queries::get_kyc_request(&self.pool, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("KYC request not found".to_string()))
    }
}
