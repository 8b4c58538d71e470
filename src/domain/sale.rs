//! Sale and payment lifecycle rules, kept free of storage concerns so the
//! transition logic is testable without a database.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Partial,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Partial => "partial",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// A sale can still take money only while it is pending or partial.
    pub fn accepts_payment(&self) -> bool {
        matches!(self, SaleStatus::Pending | SaleStatus::Partial)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

/// Result of applying one confirmed payment to a sale.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPayment {
    pub paid: BigDecimal,
    pub balance: BigDecimal,
    pub status: SaleStatus,
}

/// Pure settlement rule: `paid` only ever grows, `balance` is derived, and
/// the sale completes exactly when the balance reaches zero.
pub fn apply_payment(
    sale_amount: &BigDecimal,
    already_paid: &BigDecimal,
    payment_amount: &BigDecimal,
) -> AppliedPayment {
    let paid = already_paid + payment_amount;
    let balance = sale_amount - &paid;

    let status = if balance <= BigDecimal::from(0) {
        SaleStatus::Completed
    } else {
        SaleStatus::Partial
    };

    AppliedPayment {
        paid,
        balance,
        status,
    }
}
