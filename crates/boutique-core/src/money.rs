//! # Money Module
//!
//! Provides the `Money` type for purchase prices, stock values and order totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Stock value of a sale with 1,250 pieces at Rs 349.90 each must come    │
//! │  out exact, every time it is recomputed after a deduction.             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paisa)                              │
//! │    34990 paisa × 1250 = 43,737,500 paisa = Rs 437,375.00               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use boutique_core::money::Money;
//!
//! let price = Money::from_major(100);        // Rs 100.00
//! let stock_value = price.multiply_quantity(15);
//! assert_eq!(stock_value, Money::from_major(1500));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

/// Number of minor units in one major unit.
const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed so that refunds and corrections can be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use boutique_core::money::Money;
    ///
    /// let price = Money::from_minor(34990); // Rs 349.90
    /// assert_eq!(price.minor(), 34990);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Purchase price per item: Rs 100.00
    /// Total items left:        15
    ///      │
    ///      ▼
    /// multiply_quantity(15) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Total stock value: Rs 1500.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Like [`multiply_quantity`](Self::multiply_quantity), but `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(value) => Some(Money(value)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(value) => Some(Money(value)),
            None => None,
        }
    }

    /// Subtracts `other`, `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(value) => Some(Money(value)),
            None => None,
        }
    }

    /// Half of the amount, rounded down to the minor unit.
    #[inline]
    pub const fn half(&self) -> Self {
        Money(self.0 / 2)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money the way receipts print it, e.g. `Rs 1500.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}Rs {}.{:02}",
            sign,
            self.major().abs(),
            self.minor_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor_and_major() {
        let money = Money::from_minor(34990);
        assert_eq!(money.major(), 349);
        assert_eq!(money.minor_part(), 90);

        assert_eq!(Money::from_major(50).minor(), 5000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_major(1500).to_string(), "Rs 1500.00");
        assert_eq!(Money::from_minor(34990).to_string(), "Rs 349.90");
        assert_eq!(Money::from_minor(-550).to_string(), "-Rs 5.50");
        assert_eq!(Money::zero().to_string(), "Rs 0.00");
    }

    #[test]
    fn test_stock_value_math() {
        // 12 pieces left at Rs 50 each
        let value = Money::from_major(50).multiply_quantity(12);
        assert_eq!(value, Money::from_major(600));
        assert_eq!(Money::from_major(50) * 12, value);
    }

    #[test]
    fn test_checked_math_reports_overflow() {
        let huge = Money::from_minor(i64::MAX / 2);

        assert_eq!(huge.checked_multiply_quantity(3), None);
        assert_eq!(
            Money::from_major(50).checked_multiply_quantity(12),
            Some(Money::from_major(600))
        );

        assert_eq!(huge.checked_add(huge).map(|m| m.minor()), Some(i64::MAX - 1));
        assert_eq!(huge.checked_add(huge).and_then(|m| m.checked_add(huge)), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);

        assert_eq!(Money::from_minor(1001).half(), Money::from_minor(500));
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_major(10), Money::from_minor(250)]
            .into_iter()
            .sum();
        assert_eq!(total.minor(), 1250);
        assert!(!total.is_negative());
    }
}
