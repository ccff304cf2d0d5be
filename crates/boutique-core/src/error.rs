//! # Error Types
//!
//! Domain-specific error types for boutique-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  boutique-core errors (this file)                                      │
//! │  ├── CoreError        - Domain errors returned by the services         │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── StoreError       - What a store implementation reports            │
//! │                                                                         │
//! │  boutique-db errors (separate crate)                                   │
//! │  └── DbError          - SQLite failures, converted into StoreError     │
//! │                                                                         │
//! │  Flow: DbError → StoreError → CoreError → UI toast                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, sale ID, order number)
//! 3. Errors are enum variants, never String
//! 4. Store failures keep the underlying message attached

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every failure is scoped to the single operation that raised it; none of
/// these are fatal to the process.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced record does not exist in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The sale exists but carries no entry with the requested SKU code.
    ///
    /// ## When This Occurs
    /// - The order form referenced a SKU that was renamed or removed
    /// - The order line points at the wrong sale
    #[error("SKU {sku_code} is not part of sale {sale_id}")]
    SkuNotInSale { sale_id: String, sku_code: String },

    /// Deducting would take a SKU below zero under the `Reject` policy.
    ///
    /// ## User Workflow
    /// ```text
    /// Order line: RED-M × 5
    ///      │
    ///      ▼
    /// Sale stock: RED-M = 3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "RED-M", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 RED-M in stock"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// A stored number does not match the expected format.
    #[error("Malformed record '{value}': {reason}")]
    MalformedRecord { value: String, reason: String },

    /// The daily order sequence has no four-digit numbers left.
    #[error("Order sequence exhausted for {prefix}")]
    SequenceExhausted { prefix: String },

    /// Every attempt to insert a freshly allocated order number collided.
    #[error("Could not allocate a unique order number after {attempts} attempts")]
    AllocationFailed { attempts: u32 },

    /// Writing the updated SKU list back to the store failed.
    #[error("Failed to update inventory: {0}")]
    InventoryUpdateFailed(String),

    /// The store could not be reached or rejected the call.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Shorthand for a missing sale.
    pub fn sale_not_found(id: impl Into<String>) -> Self {
        CoreError::not_found("Sale", id)
    }

    /// A computed amount that overflowed.
    pub fn overflow(field: impl Into<String>) -> Self {
        CoreError::Validation(ValidationError::Overflow {
            field: field.into(),
        })
    }

    /// Creates a MalformedRecord error.
    pub fn malformed(value: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedRecord {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid SKU code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same SKU twice in one sale).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A computed amount does not fit in the money type.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Store Error
// =============================================================================

/// Errors reported by an [`OrderStore`](crate::store::OrderStore) or
/// [`SaleStore`](crate::store::SaleStore) implementation.
///
/// `Duplicate` and `Conflict` are the two signals the services retry on:
/// an order number already taken, and a sale revised since it was read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {field}: '{value}' already exists")]
    Duplicate { field: String, value: String },

    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: String, id: String },

    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            other => CoreError::StoreUnavailable(other.to_string()),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type returned by store implementations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
