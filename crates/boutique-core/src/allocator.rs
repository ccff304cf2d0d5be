//! # Order Number Allocator
//!
//! Picks the next order number and inserts the order under it.
//!
//! ## Allocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  clock.today() ──► DailyPrefix "ORD-20261016-"                          │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  store.find_order_numbers_with_prefix()  ["...-0007", "...-0006", ...]  │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  next_date_prefixed()  ──► ORD-20261016-0008                            │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  store.create_order()                                                   │
//! │     ├── Ok         ──► done                                             │
//! │     └── Duplicate  ──► another terminal won the race; read again        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store's unique constraint on `order_number` is the arbiter. Reading
//! the current maximum is only a guess; the insert either claims the number
//! or reports a duplicate, and the allocator tries again with a fresh read.

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult, StoreError};
use crate::order_number::{next_date_prefixed, next_legacy, DailyPrefix, NumberingScheme, OrderNumber};
use crate::store::OrderStore;
use crate::types::{Order, OrderDraft};

/// Default number of insert attempts before giving up.
pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 5;

/// Tunables for [`OrderNumberAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorSettings {
    pub scheme: NumberingScheme,
    pub max_attempts: u32,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        AllocatorSettings {
            scheme: NumberingScheme::default(),
            max_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
        }
    }
}

/// Allocates order numbers against an [`OrderStore`] using an injected [`Clock`].
pub struct OrderNumberAllocator<S, C> {
    store: S,
    clock: C,
    settings: AllocatorSettings,
}

impl<S: OrderStore, C: Clock> OrderNumberAllocator<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_settings(store, clock, AllocatorSettings::default())
    }

    pub fn with_settings(store: S, clock: C, settings: AllocatorSettings) -> Self {
        OrderNumberAllocator {
            store,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> AllocatorSettings {
        self.settings
    }

    /// Computes the number the next order would receive.
    ///
    /// Nothing is reserved. Use [`create_order`](Self::create_order) to
    /// claim a number safely under concurrency.
    pub async fn next_order_number(&self) -> CoreResult<OrderNumber> {
        match self.settings.scheme {
            NumberingScheme::DatePrefixed => {
                let prefix = DailyPrefix::new(self.clock.today());
                let existing = self
                    .store
                    .find_order_numbers_with_prefix(&prefix.pattern())
                    .await?;
                debug!(prefix = %prefix, existing = existing.len(), "Computing next order number");
                next_date_prefixed(prefix.date(), &existing)
            }
            NumberingScheme::Legacy => {
                let latest = self.store.find_latest_order_number().await?;
                let existing: Vec<String> = latest.into_iter().collect();
                next_legacy(&existing)
            }
        }
    }

    /// Allocates a number and inserts the order under it.
    ///
    /// Retries with a fresh read whenever the store reports the number as
    /// taken, up to `max_attempts` inserts.
    pub async fn create_order(&self, draft: OrderDraft) -> CoreResult<Order> {
        let attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=attempts {
            let number = self.next_order_number().await?;

            match self.store.create_order(draft.clone().numbered(number.to_string())).await {
                Ok(order) => {
                    info!(
                        order_number = %order.order_number,
                        order_type = %order.order_type,
                        attempt,
                        "Order created"
                    );
                    return Ok(order);
                }
                Err(StoreError::Duplicate { value, .. }) => {
                    warn!(order_number = %value, attempt, "Order number already taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::AllocationFailed { attempts })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
