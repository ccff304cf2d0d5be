//! # boutique-core: Order Numbering and Stock Logic
//!
//! This crate holds the business rules of the boutique back office: how
//! orders are numbered, and how placing a Sale order takes stock out of a
//! sale's SKU list.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Boutique Back Office                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Order form / Sales form                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ boutique-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐  ┌─────────────┐  ┌─────────────┐            │   │
//! │  │   │  allocator  │  │  deduction  │  │  placement  │            │   │
//! │  │   │ ORD-…-0001  │  │ RED-M 20→15 │  │ save order  │            │   │
//! │  │   └──────┬──────┘  └──────┬──────┘  └─────────────┘            │   │
//! │  │          │   order_number, inventory (pure functions)          │   │
//! │  │          ▼                ▼                                     │   │
//! │  │   ┌─────────────────────────────────────┐                      │   │
//! │  │   │  store: OrderStore, SaleStore       │  ◄── traits only     │   │
//! │  │   └─────────────────────────────────────┘                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 boutique-db (SQLite)                            │   │
//! │  │     UNIQUE(order_number), sales.version compare-and-swap        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, Order, SkuRecord, ...)
//! - [`money`] - Integer money in minor units
//! - [`order_number`] - Order and sale number formats
//! - [`inventory`] - Pure deduction and availability math
//! - [`allocator`] - Order number allocation with retry on collision
//! - [`deduction`] - Stock deduction with optimistic locking
//! - [`placement`] - Save-order and create-sale workflows
//! - [`store`] - Persistence traits
//! - [`clock`] - Injected time source
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use boutique_core::order_number::next_date_prefixed;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
//! let next = next_date_prefixed(today, &[]).unwrap();
//! assert_eq!(next.to_string(), "ORD-20261016-0001");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod clock;
pub mod deduction;
pub mod error;
pub mod inventory;
pub mod money;
pub mod order_number;
pub mod placement;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocator::{AllocatorSettings, OrderNumberAllocator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use deduction::{DeductionSettings, InventoryDeductionEngine};
pub use error::{CoreError, CoreResult, StoreError, StoreResult, ValidationError};
pub use inventory::OverdraftPolicy;
pub use money::Money;
pub use order_number::{NumberingScheme, OrderNumber};
pub use placement::{OrderPlacement, PlacedOrder};
pub use store::{OrderStore, SaleStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum SKU entries in one sale.
pub const MAX_SKU_ITEMS: usize = 100;

/// Maximum lines on one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity for a single SKU entry or order line.
///
/// ## Business Reason
/// Catches typos such as an extra zero before they reach stock.
pub const MAX_ITEM_QUANTITY: i64 = 999_999;

/// Highest accepted price per piece or per order line unit (Rs 10,000,000).
///
/// `MAX_ITEM_QUANTITY × MAX_SKU_ITEMS × MAX_UNIT_PRICE` fits in an `i64`,
/// so totals over validated input cannot overflow.
pub const MAX_UNIT_PRICE: Money = Money::from_major(10_000_000);
