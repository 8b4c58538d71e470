use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::db::queries;
use crate::error::AppError;

/// Applies stock and sales-counter deltas for a completed sale. Only the
/// sale service calls this, always inside its completion transaction, so
/// the product update commits or rolls back together with the sale.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryAdjuster;

impl InventoryAdjuster {
    pub async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        quantity_delta: i32,
        sales_count_delta: i32,
    ) -> Result<(), AppError> {
        let rows =
            queries::adjust_product_inventory(tx, product_id, quantity_delta, sales_count_delta)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, %product_id, "inventory adjustment failed");
                    AppError::Reconciliation(
                        "Payment apply failed; retry verification with the same reference"
                            .to_string(),
                    )
                })?;

        if rows == 0 {
            // The product vanished between sale creation and completion.
            tracing::error!(%product_id, "product missing during sale completion");
            return Err(AppError::Reconciliation(
                "Product no longer exists for a confirmed payment; manual review required"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
