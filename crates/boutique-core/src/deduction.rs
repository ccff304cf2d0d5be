//! # Inventory Deduction Engine
//!
//! Removes stock from one SKU of a sale and persists the whole SKU list back.
//!
//! ## Deduction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deduct(sale_id, "RED-M", 5)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store.get_sale_by_id()           ── None ──► "Sale not found: <id>"   │
//! │       │ Sale { version: 7, RED-M: 20 }                                  │
//! │       ▼                                                                 │
//! │  apply_deduction()                ── pure, see inventory.rs            │
//! │       │ InventoryUpdate { RED-M: 15, expected_version: 7 }              │
//! │       ▼                                                                 │
//! │  store.update_sale()                                                    │
//! │     ├── Ok        ──► Sale { version: 8, RED-M: 15 }                    │
//! │     ├── Conflict  ──► someone else wrote first; read again             │
//! │     └── other     ──► "Failed to update inventory: <reason>"           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult, StoreError};
use crate::inventory::{apply_deduction, OverdraftPolicy};
use crate::store::SaleStore;
use crate::types::Sale;
use crate::validation::{validate_quantity, validate_sku};

/// Default number of compare-and-swap attempts per deduction.
pub const DEFAULT_UPDATE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeductionSettings {
    pub policy: OverdraftPolicy,
    pub max_attempts: u32,
}

impl Default for DeductionSettings {
    fn default() -> Self {
        DeductionSettings {
            policy: OverdraftPolicy::default(),
            max_attempts: DEFAULT_UPDATE_ATTEMPTS,
        }
    }
}

/// Applies deductions to sales held in a [`SaleStore`].
pub struct InventoryDeductionEngine<S> {
    store: S,
    settings: DeductionSettings,
}

impl<S: SaleStore> InventoryDeductionEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, DeductionSettings::default())
    }

    pub fn with_settings(store: S, settings: DeductionSettings) -> Self {
        InventoryDeductionEngine { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> DeductionSettings {
        self.settings
    }

    /// Deducts `qty` pieces of `sku_code` from the sale and returns the
    /// persisted result.
    ///
    /// Exactly one write lands per successful call. When another writer
    /// updates the sale between our read and our write, the store reports a
    /// conflict and the deduction is recomputed from a fresh read.
    pub async fn deduct(&self, sale_id: &str, sku_code: &str, qty: i64) -> CoreResult<Sale> {
        validate_sku(sku_code)?;
        validate_quantity(qty)?;

        let attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=attempts {
            let sale = self
                .store
                .get_sale_by_id(sale_id)
                .await
                .map_err(|e| match e {
                    StoreError::NotFound { .. } => CoreError::sale_not_found(sale_id),
                    other => CoreError::InventoryUpdateFailed(other.to_string()),
                })?
                .ok_or_else(|| CoreError::sale_not_found(sale_id))?;

            let update = apply_deduction(&sale, sku_code, qty, self.settings.policy)?;
            debug!(
                sale_id,
                sku_code,
                qty,
                version = sale.version,
                total_items = update.total_items,
                "Applying deduction"
            );

            match self.store.update_sale(sale_id, update).await {
                Ok(updated) => {
                    info!(
                        sale_id,
                        sku_code,
                        qty,
                        total_items = updated.total_items,
                        attempt,
                        "Inventory deducted"
                    );
                    return Ok(updated);
                }
                Err(StoreError::Conflict { .. }) => {
                    warn!(sale_id, attempt, "Sale changed during deduction, retrying");
                }
                Err(StoreError::NotFound { .. }) => {
                    return Err(CoreError::sale_not_found(sale_id));
                }
                Err(e) => return Err(CoreError::InventoryUpdateFailed(e.to_string())),
            }
        }

        Err(CoreError::InventoryUpdateFailed(format!(
            "sale {} kept changing after {} attempts",
            sale_id, attempts
        )))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{stock_value, total_items};
    use crate::money::Money;
    use crate::store::memory::MemorySaleStore;
    use crate::types::SkuRecord;
    use chrono::{NaiveDate, Utc};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn sale(id: &str, items: Vec<SkuRecord>, price: Option<i64>) -> Sale {
        let now = Utc::now();
        let total = total_items(&items);
        let price = price.map(Money::from_major);
        Sale {
            id: id.into(),
            sale_number: "SALE-001".into(),
            sales_name: None,
            sale_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            customer_id: None,
            sku_items: items,
            total_items: total,
            purchase_price_per_item: price,
            total_stock_value: stock_value(price, total).unwrap(),
            notes: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    fn engine(sales: Vec<Sale>) -> InventoryDeductionEngine<Arc<MemorySaleStore>> {
        InventoryDeductionEngine::new(Arc::new(MemorySaleStore::with_sales(sales)))
    }

    #[tokio::test]
    async fn test_end_to_end_red_m() {
        let engine = engine(vec![sale("S1", vec![SkuRecord::new("RED-M", 20)], Some(100))]);

        let updated = engine.deduct("S1", "RED-M", 5).await.unwrap();
        assert_eq!(updated.sku_items, vec![SkuRecord::new("RED-M", 15)]);
        assert_eq!(updated.total_items, 15);
        assert_eq!(updated.total_stock_value, Some(Money::from_major(1500)));

        let persisted = engine.store().get("S1").unwrap();
        assert_eq!(persisted, updated);
        assert_eq!(persisted.version, 1);
        assert_eq!(engine.store().update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_keep_deducting() {
        let engine = engine(vec![sale(
            "S1",
            vec![SkuRecord::new("A", 10), SkuRecord::new("B", 5)],
            Some(50),
        )]);

        let first = engine.deduct("S1", "A", 3).await.unwrap();
        assert_eq!(first.sku("A").unwrap().quantity, 7);
        assert_eq!(first.total_stock_value, Some(Money::from_major(600)));

        let second = engine.deduct("S1", "A", 3).await.unwrap();
        assert_eq!(second.sku("A").unwrap().quantity, 4);
        assert_eq!(second.sku("B").unwrap().quantity, 5);
        assert_eq!(second.total_items, 9);
    }

    #[tokio::test]
    async fn test_missing_sale() {
        let engine = engine(vec![]);
        let err = engine.deduct("nope", "A", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Sale not found: nope");
    }

    #[tokio::test]
    async fn test_unknown_sku_leaves_sale_untouched() {
        let engine = engine(vec![sale("S1", vec![SkuRecord::new("A", 10)], None)]);

        let err = engine.deduct("S1", "Z", 1).await.unwrap_err();
        assert!(matches!(err, CoreError::SkuNotInSale { .. }));
        assert_eq!(engine.store().update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.store().get("S1").unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let engine = engine(vec![sale("S1", vec![SkuRecord::new("A", 10)], None)]);
        assert!(matches!(
            engine.deduct("S1", "A", 0).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_conflict_is_retried_on_fresh_state() {
        let engine = engine(vec![sale("S1", vec![SkuRecord::new("RED-M", 20)], Some(100))]);
        engine.store().conflicts.store(1, Ordering::SeqCst);

        let updated = engine.deduct("S1", "RED-M", 5).await.unwrap();

        // The concurrent writer took one piece; both deductions survive.
        assert_eq!(updated.sku("RED-M").unwrap().quantity, 14);
        assert_eq!(updated.total_items, 14);
        assert_eq!(updated.total_stock_value, Some(Money::from_major(1400)));
        assert_eq!(updated.version, 2);
        assert_eq!(engine.store().update_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistent_conflicts_give_up() {
        let engine = InventoryDeductionEngine::with_settings(
            Arc::new(MemorySaleStore::with_sales(vec![sale(
                "S1",
                vec![SkuRecord::new("RED-M", 20)],
                None,
            )])),
            DeductionSettings {
                max_attempts: 3,
                ..Default::default()
            },
        );
        engine.store().conflicts.store(10, Ordering::SeqCst);

        let err = engine.deduct("S1", "RED-M", 1).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to update inventory: "));
        assert_eq!(engine.store().update_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_wrapped() {
        let engine = engine(vec![sale("S1", vec![SkuRecord::new("A", 10)], None)]);
        *engine.store().broken.lock().unwrap() = Some("disk I/O error".into());

        let err = engine.deduct("S1", "A", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to update inventory: disk I/O error");
    }

    #[tokio::test]
    async fn test_lookup_failure_is_wrapped() {
        let engine = engine(vec![sale("S1", vec![SkuRecord::new("A", 10)], None)]);
        *engine.store().broken_reads.lock().unwrap() = Some("connection refused".into());

        let err = engine.deduct("S1", "A", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to update inventory: connection refused");
        assert_eq!(engine.store().update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overdraft_policy_is_applied() {
        let engine = engine(vec![sale("S1", vec![SkuRecord::new("A", 2)], None)]);
        assert!(matches!(
            engine.deduct("S1", "A", 3).await,
            Err(CoreError::InsufficientStock { available: 2, .. })
        ));

        let clamping = InventoryDeductionEngine::with_settings(
            Arc::clone(engine.store()),
            DeductionSettings {
                policy: OverdraftPolicy::Clamp,
                ..Default::default()
            },
        );
        let updated = clamping.deduct("S1", "A", 3).await.unwrap();
        assert_eq!(updated.sku("A").unwrap().quantity, 0);
    }
}
