//! # Inventory Math
//!
//! Pure functions over a sale's SKU list. Nothing here touches a store; the
//! [`deduction`](crate::deduction) engine reads a sale, calls
//! [`apply_deduction`], and writes the result back.
//!
//! ## Deduction Flow
//! ```text
//! sku_items: [{A,10},{B,5}]      deduct A × 3
//!      │
//!      ▼
//! apply_deduction()  ← THIS MODULE
//!      │   A: 10 - 3 = 7   (policy decides what happens below zero)
//!      │   B: unchanged
//!      ▼
//! InventoryUpdate { [{A,7},{B,5}], total_items: 12, total_stock_value: 12 × price }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AvailableSku, InventoryUpdate, Sale, SkuRecord};

// =============================================================================
// Overdraft Policy
// =============================================================================

/// What to do when a deduction asks for more than a SKU has on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OverdraftPolicy {
    /// Refuse the deduction with `InsufficientStock`.
    #[default]
    Reject,
    /// Floor the SKU at zero.
    Clamp,
    /// Let the quantity go negative, recording a backorder.
    AllowNegative,
}

impl OverdraftPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OverdraftPolicy::Reject => "reject",
            OverdraftPolicy::Clamp => "clamp",
            OverdraftPolicy::AllowNegative => "allow_negative",
        }
    }
}

impl fmt::Display for OverdraftPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverdraftPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(OverdraftPolicy::Reject),
            "clamp" => Ok(OverdraftPolicy::Clamp),
            "allow_negative" | "allow-negative" => Ok(OverdraftPolicy::AllowNegative),
            other => Err(ValidationError::InvalidFormat {
                field: "overdraft_policy".to_string(),
                reason: format!("unknown policy '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Sum of every SKU quantity.
pub fn total_items(items: &[SkuRecord]) -> i64 {
    items.iter().map(|item| item.quantity).sum()
}

/// `total × price`, or `None` when the sale tracks no purchase price.
///
/// Fails with `ValidationError::Overflow` instead of wrapping.
pub fn stock_value(purchase_price_per_item: Option<Money>, total: i64) -> CoreResult<Option<Money>> {
    purchase_price_per_item
        .map(|price| {
            price
                .checked_multiply_quantity(total)
                .ok_or_else(|| CoreError::overflow("total_stock_value"))
        })
        .transpose()
}

// =============================================================================
// Deduction
// =============================================================================

/// Computes the update that removes `qty` pieces of `sku_code` from `sale`.
///
/// Every other SKU passes through untouched. `total_items` and
/// `total_stock_value` are recomputed from the new list, and the update
/// carries the sale's current version for the store to compare against.
///
/// ## Errors
/// - `SkuNotInSale` if no entry has `sku_code`
/// - `InsufficientStock` if the policy is `Reject` and `qty` exceeds stock
///
/// ## Example
/// ```rust,ignore
/// let update = apply_deduction(&sale, "A", 3, OverdraftPolicy::Reject)?;
/// assert_eq!(update.total_items, 12);
/// ```
pub fn apply_deduction(
    sale: &Sale,
    sku_code: &str,
    qty: i64,
    policy: OverdraftPolicy,
) -> CoreResult<InventoryUpdate> {
    let current = sale.sku(sku_code).ok_or_else(|| CoreError::SkuNotInSale {
        sale_id: sale.id.clone(),
        sku_code: sku_code.to_string(),
    })?;

    let remaining = current.quantity - qty;
    let new_quantity = match policy {
        _ if remaining >= 0 => remaining,
        OverdraftPolicy::Reject => {
            return Err(CoreError::InsufficientStock {
                sku: sku_code.to_string(),
                available: current.quantity,
                requested: qty,
            })
        }
        OverdraftPolicy::Clamp => 0,
        OverdraftPolicy::AllowNegative => remaining,
    };

    let sku_items: Vec<SkuRecord> = sale
        .sku_items
        .iter()
        .map(|item| {
            if item.sku_code == sku_code {
                SkuRecord::new(item.sku_code.clone(), new_quantity)
            } else {
                item.clone()
            }
        })
        .collect();

    let total = total_items(&sku_items);

    Ok(InventoryUpdate {
        total_stock_value: stock_value(sale.purchase_price_per_item, total)?,
        total_items: total,
        sku_items,
        expected_version: sale.version,
    })
}

// =============================================================================
// Availability
// =============================================================================

/// Every SKU with stock left, across all sales, in sale then list order.
pub fn available_skus(sales: &[Sale]) -> Vec<AvailableSku> {
    sales
        .iter()
        .flat_map(|sale| {
            sale.sku_items
                .iter()
                .filter(|item| item.quantity > 0)
                .map(move |item| AvailableSku {
                    sale_id: sale.id.clone(),
                    sale_name: sale.sales_name.clone(),
                    sku_code: item.sku_code.clone(),
                    quantity: item.quantity,
                })
        })
        .collect()
}

/// Largest quantity an order line may take from `sale_id`/`sku_code`.
/// Zero when the SKU is unknown or out of stock.
pub fn max_orderable(sales: &[Sale], sale_id: &str, sku_code: &str) -> i64 {
    sales
        .iter()
        .find(|sale| sale.id == sale_id)
        .and_then(|sale| sale.sku(sku_code))
        .map(|item| item.quantity.max(0))
        .unwrap_or(0)
}

// =============================================================================
// Unit Tests
// =============================================================================
