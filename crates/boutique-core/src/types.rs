//! # Domain Types
//!
//! Core domain types used throughout the boutique back office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │     Order       │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  sale_number    │   │  order_number   │   │  sale_id?       │       │
//! │  │  sku_items[]    │◄──┼─────────────────┼───│  sku_code?      │       │
//! │  │  total_items    │   │  order_type     │   │  quantity       │       │
//! │  │  version        │   │  total_amount   │   │  price          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   SkuRecord     │   │   OrderType     │   │ InventoryUpdate │       │
//! │  │  sku_code       │   │  CustomerOrder  │   │ whole-list      │       │
//! │  │  quantity       │   │  Sale           │   │ replacement     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (order_number, sale_number) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// SKU Record
// =============================================================================

/// One inventory line inside a sale's `sku_items` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SkuRecord {
    /// Code identifying the line, unique within one sale.
    pub sku_code: String,

    /// Pieces still on hand.
    pub quantity: i64,
}

impl SkuRecord {
    pub fn new(sku_code: impl Into<String>, quantity: i64) -> Self {
        SkuRecord {
            sku_code: sku_code.into(),
            quantity,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A batch of purchased stock that orders draw from.
///
/// `total_items` is always the sum of every `sku_items[].quantity`, and
/// `total_stock_value` (when a purchase price is tracked) is
/// `total_items × purchase_price_per_item`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub sale_number: String,
    pub sales_name: Option<String>,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub customer_id: Option<String>,
    pub sku_items: Vec<SkuRecord>,
    pub total_items: i64,
    pub purchase_price_per_item: Option<Money>,
    pub total_stock_value: Option<Money>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Revision counter, bumped by the store on every accepted update.
    pub version: i64,
}

impl Sale {
    /// Looks up a SKU entry by code.
    pub fn sku(&self, sku_code: &str) -> Option<&SkuRecord> {
        self.sku_items.iter().find(|item| item.sku_code == sku_code)
    }

    /// Returns a copy with an inventory update applied, as a store persists it.
    pub fn with_update(&self, update: &InventoryUpdate, now: DateTime<Utc>) -> Sale {
        Sale {
            sku_items: update.sku_items.clone(),
            total_items: update.total_items,
            total_stock_value: update.total_stock_value,
            updated_at: now,
            version: self.version + 1,
            ..self.clone()
        }
    }
}

/// Sale input as entered on the sales form, before numbering and totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDraft {
    pub sales_name: Option<String>,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub customer_id: Option<String>,
    pub sku_items: Vec<SkuRecord>,
    pub purchase_price_per_item: Option<Money>,
    pub notes: Option<String>,
}

/// A fully numbered sale ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub sale_number: String,
    pub sales_name: Option<String>,
    pub sale_date: NaiveDate,
    pub customer_id: Option<String>,
    pub sku_items: Vec<SkuRecord>,
    pub total_items: i64,
    pub purchase_price_per_item: Option<Money>,
    pub total_stock_value: Option<Money>,
    pub notes: Option<String>,
}

// =============================================================================
// Inventory Update
// =============================================================================

/// Whole-document replacement of a sale's stock fields.
///
/// `expected_version` is the revision the update was computed from; a store
/// must refuse the write if the sale has moved on since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryUpdate {
    pub sku_items: Vec<SkuRecord>,
    pub total_items: i64,
    pub total_stock_value: Option<Money>,
    pub expected_version: i64,
}

/// A SKU with stock left, as offered on the order form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailableSku {
    pub sale_id: String,
    pub sale_name: Option<String>,
    pub sku_code: String,
    pub quantity: i64,
}

// =============================================================================
// Order Type
// =============================================================================

/// What an order draws on: made-to-order work, or stock from a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum OrderType {
    #[serde(rename = "Customer Order")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Customer Order"))]
    CustomerOrder,
    #[serde(rename = "Sale")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Sale"))]
    Sale,
}

impl OrderType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderType::CustomerOrder => "Customer Order",
            OrderType::Sale => "Sale",
        }
    }

    /// Sale orders consume SKU stock when they are placed.
    pub const fn deducts_stock(&self) -> bool {
        matches!(self, OrderType::Sale)
    }
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::CustomerOrder
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Customer Order" => Ok(OrderType::CustomerOrder),
            "Sale" => Ok(OrderType::Sale),
            other => Err(ValidationError::InvalidFormat {
                field: "order_type".to_string(),
                reason: format!("unknown order type '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// How much of an order the customer has paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentStatus {
    #[serde(rename = "Full Payment")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Full Payment"))]
    FullPayment,
    #[serde(rename = "Half Payment")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Half Payment"))]
    HalfPayment,
    #[serde(rename = "Remaining")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Remaining"))]
    Remaining,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::FullPayment => "Full Payment",
            PaymentStatus::HalfPayment => "Half Payment",
            PaymentStatus::Remaining => "Remaining",
        }
    }

    /// Amount paid against `total`.
    ///
    /// Full and half payments are derived from the total. `Remaining` keeps
    /// whatever partial amount was entered on the form.
    pub const fn amount_paid(&self, total: Money, entered: Money) -> Money {
        match self {
            PaymentStatus::FullPayment => total,
            PaymentStatus::HalfPayment => total.half(),
            PaymentStatus::Remaining => entered,
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Remaining
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Full Payment" => Ok(PaymentStatus::FullPayment),
            "Half Payment" => Ok(PaymentStatus::HalfPayment),
            "Remaining" => Ok(PaymentStatus::Remaining),
            other => Err(ValidationError::InvalidFormat {
                field: "payment_status".to_string(),
                reason: format!("unknown payment status '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A persisted customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    pub order_type: OrderType,
    pub order_status: String,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub amount_paid: Money,
    pub amount_remaining: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Order header as filled in on the order form, before a number is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    pub order_type: OrderType,
    pub order_status: String,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    /// Partial amount entered on the form; only kept for `Remaining`.
    pub amount_paid: Money,
    pub notes: Option<String>,
}

impl OrderDraft {
    /// Attaches an allocated order number and settles the payment amounts.
    ///
    /// `amount_remaining` saturates instead of overflowing on absurd input.
    pub fn numbered(self, order_number: impl Into<String>) -> NewOrder {
        let amount_paid = self
            .payment_status
            .amount_paid(self.total_amount, self.amount_paid);
        let amount_remaining = Money::from_minor(
            self.total_amount
                .minor()
                .saturating_sub(amount_paid.minor()),
        );

        NewOrder {
            order_number: order_number.into(),
            customer_id: self.customer_id,
            order_date: self.order_date,
            order_type: self.order_type,
            order_status: self.order_status,
            total_amount: self.total_amount,
            payment_status: self.payment_status,
            amount_paid,
            amount_remaining,
            notes: self.notes,
        }
    }
}

/// The record handed to [`OrderStore::create_order`](crate::store::OrderStore::create_order).
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: Option<String>,
    pub order_date: NaiveDate,
    pub order_type: OrderType,
    pub order_status: String,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub amount_paid: Money,
    pub amount_remaining: Money,
    pub notes: Option<String>,
}

// =============================================================================
// Order Item
// =============================================================================

/// A line on an order. Lines of a Sale order point at a sale's SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_type: String,
    pub quantity: i64,
    pub price: Money,
    pub sale_id: Option<String>,
    pub sku_code: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns quantity × price.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// Order line input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrderItem {
    pub product_type: String,
    pub quantity: i64,
    pub price: Money,
    pub sale_id: Option<String>,
    pub sku_code: Option<String>,
}

impl NewOrderItem {
    /// Returns quantity × price.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }

    /// The (sale, SKU) pair this line draws stock from, if any.
    pub fn stock_reference(&self) -> Option<(&str, &str)> {
        match (self.sale_id.as_deref(), self.sku_code.as_deref()) {
            (Some(sale_id), Some(sku_code)) if !sale_id.is_empty() && !sku_code.is_empty() => {
                Some((sale_id, sku_code))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sale() -> Sale {
        let now = Utc::now();
        Sale {
            id: "s-1".into(),
            sale_number: "SALE-001".into(),
            sales_name: Some("Lawn batch".into()),
            sale_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            customer_id: None,
            sku_items: vec![SkuRecord::new("A", 10), SkuRecord::new("B", 5)],
            total_items: 15,
            purchase_price_per_item: Some(Money::from_major(50)),
            total_stock_value: Some(Money::from_major(750)),
            notes: None,
            created_at: now,
            updated_at: now,
            version: 3,
        }
    }

    #[test]
    fn test_order_type_strings() {
        assert_eq!("Sale".parse::<OrderType>().unwrap(), OrderType::Sale);
        assert_eq!(
            "Customer Order".parse::<OrderType>().unwrap(),
            OrderType::CustomerOrder
        );
        assert!("Wholesale".parse::<OrderType>().is_err());
        assert_eq!(OrderType::default(), OrderType::CustomerOrder);
        assert!(OrderType::Sale.deducts_stock());
        assert!(!OrderType::CustomerOrder.deducts_stock());
    }

    #[test]
    fn test_order_type_serde_uses_display_names() {
        let json = serde_json::to_string(&OrderType::CustomerOrder).unwrap();
        assert_eq!(json, "\"Customer Order\"");
        let back: OrderType = serde_json::from_str("\"Sale\"").unwrap();
        assert_eq!(back, OrderType::Sale);
    }

    fn draft(total: i64, status: PaymentStatus, entered: i64) -> OrderDraft {
        OrderDraft {
            customer_id: None,
            order_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            order_type: OrderType::CustomerOrder,
            order_status: "Pending".into(),
            total_amount: Money::from_major(total),
            payment_status: status,
            amount_paid: Money::from_major(entered),
            notes: None,
        }
    }

    #[test]
    fn test_numbered_settles_payment() {
        let full = draft(3000, PaymentStatus::FullPayment, 0).numbered("ORD-20261016-0001");
        assert_eq!(full.amount_paid, Money::from_major(3000));
        assert_eq!(full.amount_remaining, Money::zero());

        let half = draft(3001, PaymentStatus::HalfPayment, 0).numbered("ORD-20261016-0002");
        assert_eq!(half.amount_paid, Money::from_minor(150_050));
        assert_eq!(half.amount_remaining, Money::from_minor(150_050));

        let partial = draft(3000, PaymentStatus::Remaining, 1000).numbered("ORD-20261016-0003");
        assert_eq!(partial.amount_paid, Money::from_major(1000));
        assert_eq!(partial.amount_remaining, Money::from_major(2000));
        assert_eq!(partial.order_number, "ORD-20261016-0003");
    }

    #[test]
    fn test_payment_status_strings() {
        assert_eq!(
            "Half Payment".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::HalfPayment
        );
        assert!("Paid".parse::<PaymentStatus>().is_err());
        assert_eq!(PaymentStatus::default(), PaymentStatus::Remaining);
        assert_eq!(
            serde_json::to_string(&PaymentStatus::FullPayment).unwrap(),
            "\"Full Payment\""
        );
    }

    #[test]
    fn test_sku_items_json_shape() {
        let items = vec![SkuRecord::new("RED-M", 20)];
        let json = serde_json::to_string(&items).unwrap();
        assert_eq!(json, r#"[{"sku_code":"RED-M","quantity":20}]"#);
    }

    #[test]
    fn test_with_update_bumps_version() {
        let sale = sample_sale();
        let update = InventoryUpdate {
            sku_items: vec![SkuRecord::new("A", 7), SkuRecord::new("B", 5)],
            total_items: 12,
            total_stock_value: Some(Money::from_major(600)),
            expected_version: 3,
        };

        let updated = sale.with_update(&update, Utc::now());
        assert_eq!(updated.version, 4);
        assert_eq!(updated.total_items, 12);
        assert_eq!(updated.sku("A").map(|s| s.quantity), Some(7));
        assert_eq!(updated.sale_number, "SALE-001");
    }

    #[test]
    fn test_stock_reference_requires_both_fields() {
        let mut line = NewOrderItem {
            product_type: "RED-M".into(),
            quantity: 2,
            price: Money::from_major(1200),
            sale_id: Some("s-1".into()),
            sku_code: None,
        };
        assert!(line.stock_reference().is_none());

        line.sku_code = Some("RED-M".into());
        assert_eq!(line.stock_reference(), Some(("s-1", "RED-M")));
        assert_eq!(line.line_total(), Money::from_major(2400));
    }
}
