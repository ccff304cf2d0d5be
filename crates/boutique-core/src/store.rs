//! # Store Traits
//!
//! The two persistence capabilities the services depend on. `boutique-db`
//! implements them over SQLite; tests implement them in memory.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderStore                                                             │
//! │  ├── find_order_numbers_with_prefix   newest first                      │
//! │  ├── find_latest_order_number         for the legacy scheme             │
//! │  ├── create_order                     Duplicate on order_number clash   │
//! │  └── add_order_item                                                     │
//! │                                                                         │
//! │  SaleStore                                                              │
//! │  ├── get_sale_by_id                   None when absent                  │
//! │  ├── update_sale                      Conflict on version mismatch      │
//! │  ├── create_sale / list_sales / find_sale_numbers                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::StoreResult;
use crate::types::{InventoryUpdate, NewOrder, NewOrderItem, NewSale, Order, OrderItem, Sale};

/// Persistence for orders and their lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Order numbers starting with `prefix`, greatest first.
    async fn find_order_numbers_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// The greatest purely numeric order number ever issued, if any.
    async fn find_latest_order_number(&self) -> StoreResult<Option<String>>;

    /// Inserts an order. Must fail with `StoreError::Duplicate` when the
    /// order number is already taken.
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order>;

    /// Inserts one line of an existing order.
    async fn add_order_item(&self, order_id: &str, item: NewOrderItem) -> StoreResult<OrderItem>;
}

/// Persistence for sales and their SKU documents.
#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn get_sale_by_id(&self, id: &str) -> StoreResult<Option<Sale>>;

    /// Replaces the stock fields of a sale as one write.
    ///
    /// Must fail with `StoreError::Conflict` when the stored version differs
    /// from `update.expected_version`, and bump the version on success.
    async fn update_sale(&self, id: &str, update: InventoryUpdate) -> StoreResult<Sale>;

    /// Every sale, newest first.
    async fn list_sales(&self) -> StoreResult<Vec<Sale>>;

    async fn create_sale(&self, sale: NewSale) -> StoreResult<Sale>;

    /// Every sale number issued so far.
    async fn find_sale_numbers(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn find_order_numbers_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).find_order_numbers_with_prefix(prefix).await
    }

    async fn find_latest_order_number(&self) -> StoreResult<Option<String>> {
        (**self).find_latest_order_number().await
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        (**self).create_order(order).await
    }

    async fn add_order_item(&self, order_id: &str, item: NewOrderItem) -> StoreResult<OrderItem> {
        (**self).add_order_item(order_id, item).await
    }
}

#[async_trait]
impl<T: SaleStore + ?Sized> SaleStore for Arc<T> {
    async fn get_sale_by_id(&self, id: &str) -> StoreResult<Option<Sale>> {
        (**self).get_sale_by_id(id).await
    }

    async fn update_sale(&self, id: &str, update: InventoryUpdate) -> StoreResult<Sale> {
        (**self).update_sale(id, update).await
    }

    async fn list_sales(&self) -> StoreResult<Vec<Sale>> {
        (**self).list_sales().await
    }

    async fn create_sale(&self, sale: NewSale) -> StoreResult<Sale> {
        (**self).create_sale(sale).await
    }

    async fn find_sale_numbers(&self) -> StoreResult<Vec<String>> {
        (**self).find_sale_numbers().await
    }
}

// =============================================================================
// In-Memory Stores (tests)
// =============================================================================
