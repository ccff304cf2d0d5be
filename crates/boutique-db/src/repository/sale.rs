//! # Sale Repository
//!
//! Database operations for sales and their SKU documents.
//!
//! ## Versioned Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE sales SET sku_items = …, version = version + 1                  │
//! │  WHERE id = ? AND version = <expected>                                  │
//! │       │                                                                 │
//! │       ├── 1 row   ──► write accepted                                    │
//! │       └── 0 rows  ──► does the sale exist?                              │
//! │                        ├── yes ──► VersionConflict (someone wrote first)│
//! │                        └── no  ──► NotFound                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use boutique_core::{InventoryUpdate, Money, NewSale, Sale, SaleStore, SkuRecord, StoreResult};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    sale_number: String,
    sales_name: Option<String>,
    sale_date: NaiveDate,
    customer_id: Option<String>,
    sku_items: String,
    total_items: i64,
    purchase_price_per_item: Option<i64>,
    total_stock_value: Option<i64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> DbResult<Self> {
        let sku_items: Vec<SkuRecord> = serde_json::from_str(&row.sku_items)
            .map_err(|e| DbError::corrupt("sales", format!("sku_items of {}: {}", row.id, e)))?;

        Ok(Sale {
            id: row.id,
            sale_number: row.sale_number,
            sales_name: row.sales_name,
            sale_date: row.sale_date,
            customer_id: row.customer_id,
            sku_items,
            total_items: row.total_items,
            purchase_price_per_item: row.purchase_price_per_item.map(Money::from_minor),
            total_stock_value: row.total_stock_value.map(Money::from_minor),
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

const SALE_COLUMNS: &str = "id, sale_number, sales_name, sale_date, customer_id, sku_items, \
                            total_items, purchase_price_per_item, total_stock_value, notes, \
                            created_at, updated_at, version";

fn encode_items(items: &[SkuRecord]) -> DbResult<String> {
    serde_json::to_string(items).map_err(|e| DbError::Internal(e.to_string()))
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row: Option<SaleRow> =
            sqlx::query_as(&format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Sale::try_from).transpose()
    }

    /// All sales, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sales ORDER BY created_at DESC, rowid DESC",
            SALE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    /// Inserts a numbered sale at version 0.
    pub async fn insert(&self, sale: NewSale) -> DbResult<Sale> {
        let now = Utc::now();
        let stored = Sale {
            id: Uuid::new_v4().to_string(),
            sale_number: sale.sale_number,
            sales_name: sale.sales_name,
            sale_date: sale.sale_date,
            customer_id: sale.customer_id,
            sku_items: sale.sku_items,
            total_items: sale.total_items,
            purchase_price_per_item: sale.purchase_price_per_item,
            total_stock_value: sale.total_stock_value,
            notes: sale.notes,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        debug!(id = %stored.id, sale_number = %stored.sale_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, sales_name, sale_date, customer_id,
                sku_items, total_items, purchase_price_per_item, total_stock_value,
                notes, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.sale_number)
        .bind(&stored.sales_name)
        .bind(stored.sale_date)
        .bind(&stored.customer_id)
        .bind(encode_items(&stored.sku_items)?)
        .bind(stored.total_items)
        .bind(stored.purchase_price_per_item.map(|m| m.minor()))
        .bind(stored.total_stock_value.map(|m| m.minor()))
        .bind(&stored.notes)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .bind(stored.version)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(stored.sale_number.as_str()))?;

        Ok(stored)
    }

    /// Replaces the SKU list and totals if the sale is still at
    /// `update.expected_version`.
    pub async fn update_inventory(&self, id: &str, update: InventoryUpdate) -> DbResult<Sale> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                sku_items = ?1,
                total_items = ?2,
                total_stock_value = ?3,
                updated_at = ?4,
                version = version + 1
            WHERE id = ?5 AND version = ?6
            "#,
        )
        .bind(encode_items(&update.sku_items)?)
        .bind(update.total_items)
        .bind(update.total_stock_value.map(|m| m.minor()))
        .bind(now)
        .bind(id)
        .bind(update.expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales WHERE id = ?1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

            return Err(if exists {
                debug!(id, expected_version = update.expected_version, "Sale version moved on");
                DbError::VersionConflict {
                    entity: "Sale".to_string(),
                    id: id.to_string(),
                }
            } else {
                DbError::not_found("Sale", id)
            });
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Every sale number issued so far.
    pub async fn sale_numbers(&self) -> DbResult<Vec<String>> {
        let numbers: Vec<String> = sqlx::query_scalar("SELECT sale_number FROM sales")
            .fetch_all(&self.pool)
            .await?;
        Ok(numbers)
    }

    /// Counts sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn get_sale_by_id(&self, id: &str) -> StoreResult<Option<Sale>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn update_sale(&self, id: &str, update: InventoryUpdate) -> StoreResult<Sale> {
        Ok(self.update_inventory(id, update).await?)
    }

    async fn list_sales(&self) -> StoreResult<Vec<Sale>> {
        Ok(self.list().await?)
    }

    async fn create_sale(&self, sale: NewSale) -> StoreResult<Sale> {
        Ok(self.insert(sale).await?)
    }

    async fn find_sale_numbers(&self) -> StoreResult<Vec<String>> {
        Ok(self.sale_numbers().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoutiqueConfig;
    use crate::pool::{Database, DbConfig};
    use boutique_core::{
        CoreError, DeductionSettings, ManualClock, NewOrderItem, OrderDraft, OrderType,
        PaymentStatus,
        SaleDraft, StoreError,
    };

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn new_sale(number: &str, items: Vec<SkuRecord>, price: Option<i64>) -> NewSale {
        let total: i64 = items.iter().map(|i| i.quantity).sum();
        let price = price.map(Money::from_major);
        NewSale {
            sale_number: number.into(),
            sales_name: Some("Lawn batch".into()),
            sale_date: day(),
            customer_id: None,
            sku_items: items,
            total_items: total,
            purchase_price_per_item: price,
            total_stock_value: price.map(|p| p.multiply_quantity(total)),
            notes: None,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trips_sku_document() {
        let repo = db().await.sales();
        let sale = repo
            .insert(new_sale(
                "SALE-001",
                vec![SkuRecord::new("RED-M", 20), SkuRecord::new("RED-L", 15)],
                Some(100),
            ))
            .await
            .unwrap();

        let fetched = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku_items, sale.sku_items);
        assert_eq!(fetched.total_items, 35);
        assert_eq!(fetched.total_stock_value, Some(Money::from_major(3500)));
        assert_eq!(fetched.version, 0);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sale_number() {
        let repo = db().await.sales();
        repo.insert(new_sale("SALE-001", vec![SkuRecord::new("A", 1)], None))
            .await
            .unwrap();

        let err = repo
            .create_sale(new_sale("SALE-001", vec![SkuRecord::new("B", 1)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_versioned_update() {
        let repo = db().await.sales();
        let sale = repo
            .insert(new_sale("SALE-001", vec![SkuRecord::new("A", 10)], None))
            .await
            .unwrap();

        let update = InventoryUpdate {
            sku_items: vec![SkuRecord::new("A", 7)],
            total_items: 7,
            total_stock_value: None,
            expected_version: 0,
        };

        let updated = repo.update_inventory(&sale.id, update.clone()).await.unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(updated.total_items, 7);

        // Same update computed from the stale snapshot is refused.
        let err = repo.update_sale(&sale.id, update.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let err = repo.update_sale("missing", update).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        assert_eq!(repo.get_by_id(&sale.id).await.unwrap().unwrap().total_items, 7);
    }

    #[tokio::test]
    async fn test_corrupt_sku_document_is_reported() {
        let db = db().await;
        let sale = db
            .sales()
            .insert(new_sale("SALE-001", vec![SkuRecord::new("A", 1)], None))
            .await
            .unwrap();

        sqlx::query("UPDATE sales SET sku_items = 'not json' WHERE id = ?1")
            .bind(&sale.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.sales().get_by_id(&sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { .. }));
    }

    #[tokio::test]
    async fn test_deduction_end_to_end() {
        let db = db().await;
        let sale = db
            .sales()
            .insert(new_sale("SALE-001", vec![SkuRecord::new("RED-M", 20)], Some(100)))
            .await
            .unwrap();

        let engine = db.deduction_engine(DeductionSettings::default());
        engine.deduct(&sale.id, "RED-M", 5).await.unwrap();

        let persisted = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(persisted.sku_items, vec![SkuRecord::new("RED-M", 15)]);
        assert_eq!(persisted.total_items, 15);
        assert_eq!(persisted.total_stock_value, Some(Money::from_major(1500)));
        assert_eq!(persisted.version, 1);

        let err = engine.deduct("missing", "RED-M", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Sale not found: missing");
    }

    #[tokio::test]
    async fn test_concurrent_deductions_do_not_lose_updates() {
        let db = db().await;
        let sale = db
            .sales()
            .insert(new_sale("SALE-001", vec![SkuRecord::new("A", 10)], None))
            .await
            .unwrap();

        let engine = std::sync::Arc::new(db.deduction_engine(DeductionSettings::default()));
        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let engine = std::sync::Arc::clone(&engine);
                let id = sale.id.clone();
                tokio::spawn(async move { engine.deduct(&id, "A", 2).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let persisted = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(persisted.sku("A").unwrap().quantity, 4);
        assert_eq!(persisted.version, 3);
    }

    #[tokio::test]
    async fn test_place_sale_order_over_sqlite() {
        let db = db().await;
        let config = BoutiqueConfig::default();
        let placement = db.order_placement(ManualClock::on(day()), &config);

        let sale = placement
            .create_sale(SaleDraft {
                sales_name: Some("Eid lawn".into()),
                sale_date: day(),
                customer_id: None,
                sku_items: vec![SkuRecord::new("RED-M", 20), SkuRecord::new("RED-L", 15)],
                purchase_price_per_item: Some(Money::from_major(100)),
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(sale.sale_number, "SALE-001");

        let draft = OrderDraft {
            customer_id: Some("c-1".into()),
            order_date: day(),
            order_type: OrderType::Sale,
            order_status: "Pending".into(),
            total_amount: Money::zero(),
            payment_status: PaymentStatus::FullPayment,
            amount_paid: Money::zero(),
            notes: None,
        };
        let line = |sku: &str, qty: i64| NewOrderItem {
            product_type: sku.into(),
            quantity: qty,
            price: Money::from_major(1200),
            sale_id: Some(sale.id.clone()),
            sku_code: Some(sku.into()),
        };

        let placed = placement
            .place_order(draft.clone(), vec![line("RED-M", 5), line("RED-L", 1)])
            .await
            .unwrap();
        assert_eq!(placed.order.order_number, "ORD-20261016-0001");
        assert_eq!(placed.order.total_amount, Money::from_major(7200));
        assert_eq!(placed.order.amount_paid, Money::from_major(7200));
        assert_eq!(placed.order.amount_remaining, Money::zero());

        let items = db.orders().get_items(&placed.order.id).await.unwrap();
        assert_eq!(items.len(), 2);

        let persisted = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(persisted.sku("RED-M").unwrap().quantity, 15);
        assert_eq!(persisted.sku("RED-L").unwrap().quantity, 14);
        assert_eq!(persisted.total_items, 29);
        assert_eq!(persisted.total_stock_value, Some(Money::from_major(2900)));

        // More than is left: nothing is written.
        let err = placement
            .place_order(draft, vec![line("RED-L", 20)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(db.orders().count().await.unwrap(), 1);

        let available = placement.available_skus().await.unwrap();
        assert_eq!(available.len(), 2);
    }
}
