use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::sale::{KycStatus, PaymentStatus, SaleStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Manager,
    Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum KycRequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Back-office staff account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: StaffRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub business_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub kyc_status: KycStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CustomerAddress {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
    pub vendor_id: Uuid,
    pub category_id: Uuid,
    pub view_count: i32,
    pub sales_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One purchase intent. `paid` only grows, `balance` is always
/// `amount - paid`, and status transitions are owned by the sale service.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sale {
    pub id: Uuid,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub paid: BigDecimal,
    pub balance: BigDecimal,
    pub quantity: i32,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub address_id: Option<Uuid>,
    pub status: SaleStatus,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        price: BigDecimal,
        amount: BigDecimal,
        quantity: i32,
        customer_id: Uuid,
        product_id: Uuid,
        address_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            price,
            balance: amount.clone(),
            amount,
            paid: BigDecimal::from(0),
            quantity,
            customer_id,
            product_id,
            address_id,
            status: SaleStatus::Pending,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One money-movement attempt against a sale, keyed by the gateway-issued
/// reference. Transitions pending -> success or pending -> failed exactly
/// once; the status is the idempotency source of truth for Verify.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub amount: BigDecimal,
    pub payment_reference: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(sale_id: Uuid, amount: BigDecimal, payment_reference: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sale_id,
            amount,
            payment_reference,
            status: PaymentStatus::Pending,
            payment_method: "paystack".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KycRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub doc_ref: String,
    pub doc_type: Option<String>,
    pub status: KycRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn new_sale_starts_pending_with_full_balance() {
        let amount = BigDecimal::from_str("200.00").unwrap();
        let sale = Sale::new(
            BigDecimal::from_str("100.00").unwrap(),
            amount.clone(),
            2,
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
        );

        assert_eq!(sale.status, SaleStatus::Pending);
        assert_eq!(sale.paid, BigDecimal::from(0));
        assert_eq!(sale.balance, amount);
        assert!(sale.payment_reference.is_none());
    }

    #[test]
    fn new_payment_starts_pending() {
        let payment = Payment::new(
            Uuid::new_v4(),
            BigDecimal::from_str("40.00").unwrap(),
            "ref-123".to_string(),
        );

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.payment_method, "paystack");
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: "Jane".to_string(),
            phone: "0800000000".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            kyc_status: KycStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&customer).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["kyc_status"], "pending");
    }
}
