//! Payment gateway boundary. The orchestrator only sees the
//! [`PaymentGateway`] port; the hosted-payment-page processor behind it is
//! an implementation detail of the adapter.

pub mod paystack;

pub use paystack::PaystackClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
    #[error("Invalid response from payment gateway: {0}")]
    InvalidResponse(String),
    #[error("Payment gateway circuit breaker is open")]
    CircuitOpen,
}

/// Audit trail carried through the gateway and back on its callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeMetadata {
    pub sale_id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
}

/// A charge the gateway agreed to collect: the reference is the
/// idempotency key for everything that follows.
#[derive(Debug, Clone)]
pub struct InitializedCharge {
    pub reference: String,
    pub authorization_url: String,
}

/// Gateway-side ground truth for a reference.
#[derive(Debug, Clone)]
pub struct ConfirmedCharge {
    /// True only when the processor reports the terminal "success" state.
    pub success: bool,
    pub status: String,
    pub amount_minor_units: i64,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a hosted-page charge for `amount_minor_units` against the
    /// payer's email. Metadata must round-trip for audit.
    async fn initialize(
        &self,
        payer_email: &str,
        amount_minor_units: i64,
        metadata: ChargeMetadata,
    ) -> Result<InitializedCharge, GatewayError>;

    /// Ask the processor what actually happened to a reference.
    async fn confirm(&self, reference: &str) -> Result<ConfirmedCharge, GatewayError>;
}
