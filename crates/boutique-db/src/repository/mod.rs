//! # Repository Module
//!
//! SQLite implementations of the boutique-core store traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderNumberAllocator / InventoryDeductionEngine                        │
//! │       │                                                                 │
//! │       │  OrderStore / SaleStore (traits in boutique-core)               │
//! │       ▼                                                                 │
//! │  OrderRepository                  SaleRepository                        │
//! │  ├── numbers_with_prefix          ├── get_by_id                         │
//! │  ├── latest_numeric_number        ├── update_inventory  (versioned)     │
//! │  ├── insert        (UNIQUE)       ├── insert            (UNIQUE)        │
//! │  └── insert_item                  └── list / sale_numbers               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](order::OrderRepository) - Orders and order lines
//! - [`SaleRepository`](sale::SaleRepository) - Sales and SKU documents

pub mod order;
pub mod sale;
