//! Sale orchestration: creating pending sales, reconciling gateway
//! confirmations against local state exactly once, and the cancellation
//! and listing paths around them.
//!
//! Verification is the sensitive path. The gateway may deliver the same
//! confirmation many times (webhook retries, a user refreshing the
//! callback page, a poll racing a webhook), so the payment's stored status
//! is the single source of truth for "already applied", and the
//! check-mark-apply sequence runs under row locks inside one transaction:
//! payment row first, sale row second, always in that order.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{ActorType, AuthUser};
use crate::db::models::{Payment, Sale};
use crate::db::queries;
use crate::domain::money::{meets_partial_floor, to_minor_units};
use crate::domain::sale::{apply_payment, KycStatus, PaymentStatus, SaleStatus};
use crate::error::AppError;
use crate::gateway::{ChargeMetadata, GatewayError, PaymentGateway};
use crate::services::inventory::InventoryAdjuster;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct NewSale {
    pub product_id: Uuid,
    pub quantity: i32,
    pub address_id: Option<Uuid>,
    pub partial_amount: Option<BigDecimal>,
}

/// Handle returned to the customer so they can complete the charge on the
/// gateway's hosted page.
#[derive(Debug, Serialize)]
pub struct InitiatedSale {
    pub sale_id: Uuid,
    pub reference: String,
    pub authorization_url: String,
}

#[derive(Debug, Serialize)]
pub struct SaleSnapshot {
    pub sale_id: Uuid,
    pub paid: BigDecimal,
    pub balance: BigDecimal,
    pub status: SaleStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleFilters {
    pub status: Option<SaleStatus>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct SaleService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    inventory: InventoryAdjuster,
}

impl SaleService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            pool,
            gateway,
            inventory: InventoryAdjuster,
        }
    }

    /// Creates a pending sale and initializes a gateway charge for it.
    ///
    /// The sale row commits before the gateway round-trip so a slow
    /// gateway never holds a database transaction open; if the gateway
    /// then fails, the pending row is rolled back rather than left
    /// orphaned.
    pub async fn initiate_sale(
        &self,
        customer_id: Uuid,
        new_sale: NewSale,
    ) -> Result<InitiatedSale, AppError> {
        validation::validate_quantity("quantity", new_sale.quantity)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(partial) = &new_sale.partial_amount {
            validation::validate_positive_amount("partial_amount", partial)
                .map_err(|e| AppError::Validation(e.to_string()))?;
        }

        let product = queries::get_product(&self.pool, new_sale.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        if product.quantity < new_sale.quantity {
            return Err(AppError::BusinessRule(
                "Insufficient product quantity".to_string(),
            ));
        }

        let customer = queries::get_customer(&self.pool, customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let amount = &product.price * BigDecimal::from(new_sale.quantity);

        let charge_amount = match &new_sale.partial_amount {
            None => amount.clone(),
            Some(partial) => {
                if customer.kyc_status != KycStatus::Verified {
                    return Err(AppError::BusinessRule(
                        "Part payment is only available for verified customers".to_string(),
                    ));
                }
                if !meets_partial_floor(partial, &amount) {
                    return Err(AppError::BusinessRule(
                        "Minimum partial payment is 30% of total amount".to_string(),
                    ));
                }
                partial.clone()
            }
        };

        if let Some(address_id) = new_sale.address_id {
            let address = queries::get_address(&self.pool, address_id).await?;
            match address {
                Some(a) if a.customer_id == customer_id => {}
                _ => return Err(AppError::NotFound("Address not found".to_string())),
            }
        }

        let minor_units = to_minor_units(&charge_amount)
            .map_err(|e| AppError::Validation(format!("partial_amount: {}", e)))?;

        let sale = queries::insert_sale(
            &self.pool,
            &Sale::new(
                product.price.clone(),
                amount,
                new_sale.quantity,
                customer_id,
                product.id,
                new_sale.address_id,
            ),
        )
        .await?;

        let metadata = ChargeMetadata {
            sale_id: sale.id,
            customer_id,
            product_id: product.id,
        };

        let charge = match self
            .gateway
            .initialize(&customer.email, minor_units, metadata)
            .await
        {
            Ok(charge) => charge,
            Err(e) => {
                // No charge exists at the gateway; drop the pending sale so
                // it does not linger as an unpayable orphan.
                self.rollback_pending_sale(sale.id).await;
                return Err(e.into());
            }
        };

        let recorded = async {
            queries::insert_payment(
                &self.pool,
                &Payment::new(sale.id, charge_amount.clone(), charge.reference.clone()),
            )
            .await?;
            queries::stamp_sale_reference(&self.pool, sale.id, &charge.reference).await
        }
        .await;

        if let Err(e) = recorded {
            // The charge was initialized but we cannot track it, so the
            // customer must never receive the authorization URL.
            self.rollback_pending_sale(sale.id).await;
            return Err(e.into());
        }

        tracing::info!(
            sale_id = %sale.id,
            reference = %charge.reference,
            amount_minor = minor_units,
            "sale initiated"
        );

        Ok(InitiatedSale {
            sale_id: sale.id,
            reference: charge.reference,
            authorization_url: charge.authorization_url,
        })
    }

    async fn rollback_pending_sale(&self, sale_id: Uuid) {
        if let Err(e) = queries::delete_orphaned_sale(&self.pool, sale_id).await {
            tracing::error!(error = %e, %sale_id, "failed to roll back pending sale");
        }
    }

    /// Reconciles a gateway confirmation against local state, applying the
    /// payment at most once no matter how many times the same reference is
    /// verified or how those calls interleave.
    pub async fn verify(&self, reference: &str) -> Result<SaleSnapshot, AppError> {
        let payment = queries::get_payment_by_reference(&self.pool, reference)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment record not found".to_string()))?;

        let confirmed = self.gateway.confirm(reference).await?;

        tracing::debug!(
            %reference,
            sale_id = %payment.sale_id,
            gateway_status = %confirmed.status,
            amount_minor = confirmed.amount_minor_units,
            "gateway ground truth fetched"
        );

        if !confirmed.success {
            // Terminal unless some earlier confirmation already succeeded;
            // the status guard in the update protects that case.
            let flipped = queries::mark_payment_failed_if_pending(&self.pool, reference).await?;
            if flipped > 0 {
                tracing::warn!(
                    %reference,
                    gateway_status = %confirmed.status,
                    "payment failed at gateway"
                );
            }
            return Err(AppError::Gateway(GatewayError::Rejected(
                "Payment was not successful".to_string(),
            )));
        }

        let mut tx = self.pool.begin().await.map_err(Self::apply_failed)?;

        let locked = queries::get_payment_for_update(&mut tx, reference)
            .await
            .map_err(Self::apply_failed)?
            .ok_or_else(|| {
                AppError::Reconciliation(
                    "Payment record vanished during verification; manual review required"
                        .to_string(),
                )
            })?;

        match locked.status {
            PaymentStatus::Success => {
                // Replay: a previous verification already applied this
                // reference. Return the stored result untouched.
                tx.rollback().await.map_err(Self::apply_failed)?;
                let sale = queries::get_sale(&self.pool, locked.sale_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Reconciliation(
                            "Sale missing for an applied payment; manual review required"
                                .to_string(),
                        )
                    })?;
                return Ok(Self::snapshot(&sale));
            }
            PaymentStatus::Failed => {
                // The gateway now reports success for a reference we have
                // already terminally failed. Never re-open it.
                tx.rollback().await.map_err(Self::apply_failed)?;
                return Err(AppError::Reconciliation(
                    "Gateway confirmed a payment already marked failed; manual review required"
                        .to_string(),
                ));
            }
            PaymentStatus::Pending => {}
        }

        queries::mark_payment_success(&mut tx, reference)
            .await
            .map_err(Self::apply_failed)?;

        let sale = queries::get_sale_for_update(&mut tx, locked.sale_id)
            .await
            .map_err(Self::apply_failed)?
            .ok_or_else(|| {
                AppError::Reconciliation(
                    "Sale missing for a confirmed payment; manual review required".to_string(),
                )
            })?;

        if sale.status == SaleStatus::Cancelled {
            // Money moved for a sale that was cancelled in the meantime.
            // Do not mutate the sale; leave the payment pending for manual
            // review by aborting the whole transaction.
            tx.rollback().await.map_err(Self::apply_failed)?;
            return Err(AppError::Reconciliation(
                "Payment confirmed for a cancelled sale; manual review required".to_string(),
            ));
        }

        let applied = apply_payment(&sale.amount, &sale.paid, &locked.amount);

        if applied.status == SaleStatus::Completed {
            self.inventory
                .apply(&mut tx, sale.product_id, -sale.quantity, sale.quantity)
                .await?;
        }

        queries::apply_sale_payment(
            &mut tx,
            sale.id,
            &applied.paid,
            &applied.balance,
            applied.status,
        )
        .await
        .map_err(Self::apply_failed)?;

        tx.commit().await.map_err(Self::apply_failed)?;

        tracing::info!(
            sale_id = %sale.id,
            %reference,
            paid = %applied.paid,
            balance = %applied.balance,
            status = applied.status.as_str(),
            "payment applied"
        );

        Ok(SaleSnapshot {
            sale_id: sale.id,
            paid: applied.paid,
            balance: applied.balance,
            status: applied.status,
        })
    }

    /// A failure after the gateway has confirmed success must surface as
    /// retriable, never be swallowed: money has genuinely moved.
    fn apply_failed(e: sqlx::Error) -> AppError {
        tracing::error!(error = %e, "verification apply failed");
        AppError::Reconciliation(
            "Payment apply failed; retry verification with the same reference".to_string(),
        )
    }

    /// Initializes a follow-up charge against an open sale. The sale
    /// itself is untouched; it only changes when the new reference is
    /// verified.
    pub async fn make_additional_payment(
        &self,
        customer_id: Uuid,
        sale_id: Uuid,
        amount: BigDecimal,
    ) -> Result<InitiatedSale, AppError> {
        validation::validate_positive_amount("amount", &amount)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let sale = queries::get_open_sale_for_customer(&self.pool, sale_id, customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Sale not found or already completed".to_string())
            })?;

        if amount > sale.balance {
            return Err(AppError::BusinessRule(
                "Payment amount exceeds remaining balance".to_string(),
            ));
        }

        let customer = queries::get_customer(&self.pool, customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let minor_units =
            to_minor_units(&amount).map_err(|e| AppError::Validation(format!("amount: {}", e)))?;

        let metadata = ChargeMetadata {
            sale_id: sale.id,
            customer_id,
            product_id: sale.product_id,
        };

        let charge = self
            .gateway
            .initialize(&customer.email, minor_units, metadata)
            .await?;

        queries::insert_payment(
            &self.pool,
            &Payment::new(sale.id, amount, charge.reference.clone()),
        )
        .await?;

        tracing::info!(
            sale_id = %sale.id,
            reference = %charge.reference,
            amount_minor = minor_units,
            "additional payment initiated"
        );

        Ok(InitiatedSale {
            sale_id: sale.id,
            reference: charge.reference,
            authorization_url: charge.authorization_url,
        })
    }

    pub async fn cancel_sale(&self, actor: &AuthUser, sale_id: Uuid) -> Result<(), AppError> {
        let sale = queries::get_sale(&self.pool, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale not found".to_string()))?;

        if sale.status == SaleStatus::Completed {
            return Err(AppError::BusinessRule(
                "Completed sales cannot be cancelled".to_string(),
            ));
        }

        match actor.actor {
            ActorType::Customer if sale.customer_id != actor.id => {
                return Err(AppError::Forbidden(
                    "Not authorized to cancel this sale".to_string(),
                ));
            }
            ActorType::Vendor => {
                return Err(AppError::Forbidden(
                    "Not authorized to cancel this sale".to_string(),
                ));
            }
            _ => {}
        }

        queries::cancel_sale(&self.pool, sale_id).await?;

        tracing::info!(%sale_id, actor = actor.actor.as_str(), "sale cancelled");

        Ok(())
    }

    pub async fn list_sales(
        &self,
        actor: &AuthUser,
        filters: SaleFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Sale>, AppError> {
        let vendor_scope = match actor.actor {
            ActorType::User => None,
            ActorType::Vendor => Some(actor.id),
            ActorType::Customer => {
                return Err(AppError::Forbidden("Access denied".to_string()));
            }
        };

        Ok(queries::list_sales(
            &self.pool,
            filters.status,
            filters.customer_id,
            filters.product_id,
            vendor_scope,
            limit,
            offset,
        )
        .await?)
    }

    pub async fn get_sale(
        &self,
        actor: &AuthUser,
        sale_id: Uuid,
    ) -> Result<(Sale, Vec<Payment>), AppError> {
        let sale = queries::get_sale(&self.pool, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale not found".to_string()))?;

        if actor.actor == ActorType::Customer && sale.customer_id != actor.id {
            return Err(AppError::Forbidden(
                "Not authorized to view this sale".to_string(),
            ));
        }

        let payments = queries::list_payments_for_sale(&self.pool, sale_id).await?;

        Ok((sale, payments))
    }

    fn snapshot(sale: &Sale) -> SaleSnapshot {
        SaleSnapshot {
            sale_id: sale.id,
            paid: sale.paid.clone(),
            balance: sale.balance.clone(),
            status: sale.status,
        }
    }
}
