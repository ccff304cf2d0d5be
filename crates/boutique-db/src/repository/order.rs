//! # Order Repository
//!
//! Database operations for orders and order lines.
//!
//! ## Order Number Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Terminal A                         Terminal B                          │
//! │  ──────────                         ──────────                          │
//! │  max for today = 0007               max for today = 0007                │
//! │  INSERT ORD-…-0008  ✓                                                   │
//! │                                     INSERT ORD-…-0008  ✗ UNIQUE         │
//! │                                     → StoreError::Duplicate             │
//! │                                     max for today = 0008                │
//! │                                     INSERT ORD-…-0009  ✓                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use boutique_core::{
    Money, NewOrder, NewOrderItem, Order, OrderItem, OrderStore, OrderType, PaymentStatus,
    StoreResult,
};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_id: Option<String>,
    order_date: NaiveDate,
    order_type: OrderType,
    order_status: String,
    total_amount: i64,
    payment_status: PaymentStatus,
    amount_paid: i64,
    amount_remaining: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_number: row.order_number,
            customer_id: row.customer_id,
            order_date: row.order_date,
            order_type: row.order_type,
            order_status: row.order_status,
            total_amount: Money::from_minor(row.total_amount),
            payment_status: row.payment_status,
            amount_paid: Money::from_minor(row.amount_paid),
            amount_remaining: Money::from_minor(row.amount_remaining),
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_type: String,
    quantity: i64,
    price: i64,
    sale_id: Option<String>,
    sku_code: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_type: row.product_type,
            quantity: row.quantity,
            price: Money::from_minor(row.price),
            sale_id: row.sale_id,
            sku_code: row.sku_code,
            created_at: row.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_id, order_date, order_type, \
                             order_status, total_amount, payment_status, amount_paid, \
                             amount_remaining, notes, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Order numbers starting with `prefix`, greatest first.
    ///
    /// Within one day the sequence is zero-padded, so text order is numeric
    /// order.
    pub async fn numbers_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        let numbers: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT order_number
            FROM orders
            WHERE substr(order_number, 1, length(?1)) = ?1
            ORDER BY order_number DESC
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers)
    }

    /// Greatest purely numeric order number, compared as an integer.
    pub async fn latest_numeric_number(&self) -> DbResult<Option<String>> {
        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT order_number
            FROM orders
            WHERE order_number <> '' AND order_number NOT GLOB '*[^0-9]*'
            ORDER BY CAST(order_number AS INTEGER) DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    /// Inserts an order under the number it carries.
    pub async fn insert(&self, order: NewOrder) -> DbResult<Order> {
        let stored = Order {
            id: Uuid::new_v4().to_string(),
            order_number: order.order_number,
            customer_id: order.customer_id,
            order_date: order.order_date,
            order_type: order.order_type,
            order_status: order.order_status,
            total_amount: order.total_amount,
            payment_status: order.payment_status,
            amount_paid: order.amount_paid,
            amount_remaining: order.amount_remaining,
            notes: order.notes,
            created_at: Utc::now(),
        };

        debug!(id = %stored.id, order_number = %stored.order_number, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id, order_date, order_type,
                order_status, total_amount, payment_status, amount_paid,
                amount_remaining, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.order_number)
        .bind(&stored.customer_id)
        .bind(stored.order_date)
        .bind(stored.order_type)
        .bind(&stored.order_status)
        .bind(stored.total_amount.minor())
        .bind(stored.payment_status)
        .bind(stored.amount_paid.minor())
        .bind(stored.amount_remaining.minor())
        .bind(&stored.notes)
        .bind(stored.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(stored.order_number.as_str()))?;

        Ok(stored)
    }

    /// Adds a line to an existing order.
    pub async fn insert_item(&self, order_id: &str, item: NewOrderItem) -> DbResult<OrderItem> {
        let stored = OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_type: item.product_type,
            quantity: item.quantity,
            price: item.price,
            sale_id: item.sale_id,
            sku_code: item.sku_code,
            created_at: Utc::now(),
        };

        debug!(order_id, product_type = %stored.product_type, "Adding order item");

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_type, quantity, price,
                sale_id, sku_code, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.order_id)
        .bind(&stored.product_type)
        .bind(stored.quantity)
        .bind(stored.price.minor())
        .bind(&stored.sale_id)
        .bind(&stored.sku_code)
        .bind(stored.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => DbError::not_found("Order", order_id),
            other => other,
        })?;

        Ok(stored)
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Order::from))
    }

    /// Gets an order by its human-readable number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE order_number = ?1",
            ORDER_COLUMNS
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Gets all lines of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, product_type, quantity, price,
                   sale_id, sku_code, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Most recent orders first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            ORDER_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Counts orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn find_order_numbers_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self.numbers_with_prefix(prefix).await?)
    }

    async fn find_latest_order_number(&self) -> StoreResult<Option<String>> {
        Ok(self.latest_numeric_number().await?)
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        Ok(self.insert(order).await?)
    }

    async fn add_order_item(&self, order_id: &str, item: NewOrderItem) -> StoreResult<OrderItem> {
        Ok(self.insert_item(order_id, item).await?)
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
    use boutique_core::{ManualClock, NumberingScheme, OrderDraft, StoreError};
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn new_order(number: &str) -> NewOrder {
        draft().numbered(number)
    }

    fn draft() -> OrderDraft {
        OrderDraft {
            customer_id: Some("c-1".into()),
            order_date: today(),
            order_type: OrderType::CustomerOrder,
            order_status: "Pending".into(),
            total_amount: Money::from_major(2500),
            payment_status: PaymentStatus::HalfPayment,
            amount_paid: Money::zero(),
            notes: None,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let repo = db().await.orders();
        let order = repo.insert(new_order("ORD-20261016-0001")).await.unwrap();

        let fetched = repo.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(fetched.order_number, "ORD-20261016-0001");
        assert_eq!(fetched.order_type, OrderType::CustomerOrder);
        assert_eq!(fetched.total_amount, Money::from_major(2500));
        assert_eq!(fetched.payment_status, PaymentStatus::HalfPayment);
        assert_eq!(fetched.amount_paid, Money::from_major(1250));
        assert_eq!(fetched.amount_remaining, Money::from_major(1250));
        assert_eq!(fetched.order_date, today());

        let by_number = repo.get_by_number("ORD-20261016-0001").await.unwrap();
        assert_eq!(by_number.map(|o| o.id), Some(order.id));
    }

    #[tokio::test]
    async fn test_duplicate_number_is_reported() {
        let repo = db().await.orders();
        repo.insert(new_order("ORD-20261016-0001")).await.unwrap();

        let err = repo.create_order(new_order("ORD-20261016-0001")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Duplicate { ref value, .. } if value == "ORD-20261016-0001"
        ));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prefix_lookup_is_scoped_and_sorted() {
        let repo = db().await.orders();
        for number in [
            "ORD-20261016-0002",
            "ORD-20261015-0009",
            "ORD-20261016-0010",
            "ORD-20261016-0001",
            "6001",
        ] {
            repo.insert(new_order(number)).await.unwrap();
        }

        let numbers = repo.numbers_with_prefix("ORD-20261016-").await.unwrap();
        assert_eq!(
            numbers,
            vec!["ORD-20261016-0010", "ORD-20261016-0002", "ORD-20261016-0001"]
        );
    }

    #[tokio::test]
    async fn test_latest_numeric_number_compares_as_integers() {
        let repo = db().await.orders();
        assert_eq!(repo.latest_numeric_number().await.unwrap(), None);

        for number in ["999", "6000", "6001", "ORD-20261016-0001"] {
            repo.insert(new_order(number)).await.unwrap();
        }

        assert_eq!(
            repo.latest_numeric_number().await.unwrap().as_deref(),
            Some("6001")
        );
    }

    #[tokio::test]
    async fn test_items_require_an_order() {
        let repo = db().await.orders();
        let line = NewOrderItem {
            product_type: "Kurta".into(),
            quantity: 2,
            price: Money::from_major(1500),
            sale_id: None,
            sku_code: None,
        };

        let err = repo.insert_item("missing", line.clone()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let order = repo.insert(new_order("ORD-20261016-0001")).await.unwrap();
        repo.insert_item(&order.id, line).await.unwrap();
        let items = repo.get_items(&order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total(), Money::from_major(3000));
    }

    #[tokio::test]
    async fn test_allocator_over_sqlite() {
        let db = db().await;
        let clock = Arc::new(ManualClock::on(today()));
        let alloc = db.allocator(Arc::clone(&clock), &BoutiqueConfig::default());

        let first = alloc.create_order(draft()).await.unwrap();
        let second = alloc.create_order(draft()).await.unwrap();
        assert_eq!(first.order_number, "ORD-20261016-0001");
        assert_eq!(second.order_number, "ORD-20261016-0002");

        clock.advance_days(1);
        let next_day = alloc.create_order(draft()).await.unwrap();
        assert_eq!(next_day.order_number, "ORD-20261017-0001");
    }

    #[tokio::test]
    async fn test_concurrent_allocations_stay_unique() {
        let db = db().await;
        let clock = Arc::new(ManualClock::on(today()));
        let alloc = Arc::new(db.allocator(clock, &BoutiqueConfig::default()));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let alloc = Arc::clone(&alloc);
                tokio::spawn(async move { alloc.create_order(draft()).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for task in tasks {
            numbers.push(task.await.unwrap().unwrap().order_number);
        }
        numbers.sort();

        let expected: Vec<String> = (1..=4).map(|n| format!("ORD-20261016-{:04}", n)).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test]
    async fn test_legacy_numbering_over_sqlite() {
        let db = db().await;
        let mut config = BoutiqueConfig::default();
        config.orders.numbering = NumberingScheme::Legacy;
        let alloc = db.allocator(ManualClock::on(today()), &config);

        db.orders().insert(new_order("ORD-20261016-0001")).await.unwrap();
        let first = alloc.create_order(draft()).await.unwrap();
        let second = alloc.create_order(draft()).await.unwrap();
        assert_eq!(first.order_number, "6000");
        assert_eq!(second.order_number, "6001");
    }
}
