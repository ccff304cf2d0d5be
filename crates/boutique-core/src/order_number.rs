//! # Order and Sale Numbers
//!
//! Human-readable identifiers printed on invoices and shared with customers.
//!
//! ## Formats
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Numbering Schemes                                  │
//! │                                                                         │
//! │  DATE-PREFIXED (current)        ORD-20261016-0007                      │
//! │                                 │   │        └── daily sequence, 4 wide │
//! │                                 │   └── creation date                   │
//! │                                 └── fixed prefix                        │
//! │  Restarts at 0001 every calendar day.                                  │
//! │                                                                         │
//! │  LEGACY                         6042                                   │
//! │  One global counter, first number 6000, no date component.             │
//! │                                                                         │
//! │  SALE NUMBERS                   SALE-001, SALE-002, ... SALE-1000      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the daily sequence is zero-padded to four digits, lexicographic
//! order equals numeric order within one day. `9999` is the last number a
//! day can issue; asking for one more is an error rather than a five-digit
//! suffix.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{CoreError, CoreResult};

/// Fixed leading segment of a date-prefixed order number.
pub const ORDER_PREFIX: &str = "ORD";

/// Digits in the daily sequence segment.
pub const SEQUENCE_WIDTH: usize = 4;

/// Largest sequence a single day can issue.
pub const MAX_DAILY_SEQUENCE: u32 = 9999;

/// First number handed out under the legacy scheme.
pub const LEGACY_START: u64 = 6000;

/// Leading segment of a sale number.
pub const SALE_PREFIX: &str = "SALE";

const DATE_FORMAT: &str = "%Y%m%d";

// =============================================================================
// Order Number
// =============================================================================

/// A parsed order number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderNumber {
    /// Bare global counter, e.g. `6001`.
    Legacy(u64),
    /// `ORD-<YYYYMMDD>-<NNNN>`.
    DatePrefixed { date: NaiveDate, seq: u32 },
}

impl OrderNumber {
    /// Builds a date-prefixed number, rejecting sequences outside `1..=9999`.
    pub fn date_prefixed(date: NaiveDate, seq: u32) -> CoreResult<Self> {
        if seq == 0 {
            return Err(CoreError::malformed(
                format!("{}-{}", DailyPrefix::new(date), seq),
                "sequence starts at 1",
            ));
        }
        if seq > MAX_DAILY_SEQUENCE {
            return Err(CoreError::SequenceExhausted {
                prefix: DailyPrefix::new(date).to_string(),
            });
        }
        Ok(OrderNumber::DatePrefixed { date, seq })
    }

    /// The daily sequence, for date-prefixed numbers.
    pub fn sequence(&self) -> Option<u32> {
        match self {
            OrderNumber::DatePrefixed { seq, .. } => Some(*seq),
            OrderNumber::Legacy(_) => None,
        }
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderNumber::Legacy(n) => write!(f, "{}", n),
            OrderNumber::DatePrefixed { date, seq } => write!(
                f,
                "{}-{:0width$}",
                DailyPrefix::new(*date),
                seq,
                width = SEQUENCE_WIDTH
            ),
        }
    }
}

impl FromStr for OrderNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();

        if raw.is_empty() {
            return Err(CoreError::malformed(raw, "empty order number"));
        }

        if raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw
                .parse::<u64>()
                .map(OrderNumber::Legacy)
                .map_err(|e| CoreError::malformed(raw, e.to_string()));
        }

        let parts: Vec<&str> = raw.split('-').collect();
        let [prefix, date_part, seq_part] = parts.as_slice() else {
            return Err(CoreError::malformed(
                raw,
                "expected ORD-YYYYMMDD-NNNN or a bare number",
            ));
        };

        if *prefix != ORDER_PREFIX {
            return Err(CoreError::malformed(raw, "unknown prefix"));
        }

        if date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::malformed(raw, "date segment must be YYYYMMDD"));
        }
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map_err(|e| CoreError::malformed(raw, e.to_string()))?;

        if seq_part.len() != SEQUENCE_WIDTH || !seq_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::malformed(
                raw,
                "sequence segment must be four digits",
            ));
        }
        let seq = seq_part
            .parse::<u32>()
            .map_err(|e| CoreError::malformed(raw, e.to_string()))?;

        OrderNumber::date_prefixed(date, seq)
    }
}

// =============================================================================
// Daily Prefix
// =============================================================================

/// `ORD-<YYYYMMDD>` for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPrefix(NaiveDate);

impl DailyPrefix {
    pub fn new(date: NaiveDate) -> Self {
        DailyPrefix(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The prefix including its trailing dash, as used for store lookups.
    ///
    /// The dash keeps `ORD-20260101` from matching a hypothetical
    /// `ORD-202601010-...`.
    pub fn pattern(&self) -> String {
        format!("{}-", self)
    }
}

impl fmt::Display for DailyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", ORDER_PREFIX, self.0.format(DATE_FORMAT))
    }
}

// =============================================================================
// Numbering Scheme
// =============================================================================

/// Which order-number format new orders receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingScheme {
    #[default]
    DatePrefixed,
    Legacy,
}

impl fmt::Display for NumberingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberingScheme::DatePrefixed => write!(f, "date_prefixed"),
            NumberingScheme::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for NumberingScheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date_prefixed" | "date-prefixed" | "daily" => Ok(NumberingScheme::DatePrefixed),
            "legacy" | "global" => Ok(NumberingScheme::Legacy),
            other => Err(CoreError::malformed(
                other,
                "valid numbering schemes: date_prefixed, legacy",
            )),
        }
    }
}

// =============================================================================
// Next-Number Computation
// =============================================================================

/// Computes the next date-prefixed number for `today`.
///
/// `existing` holds whatever the store returned for today's prefix. Entries
/// that do not parse, or that belong to another day, are skipped with a
/// warning instead of resetting the sequence; a malformed historical record
/// must never cause `0001` to be issued twice.
///
/// ## Example
/// ```rust
/// use boutique_core::order_number::next_date_prefixed;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// let existing = vec!["ORD-20261016-0002".to_string(), "ORD-20261016-0001".to_string()];
/// let next = next_date_prefixed(today, &existing).unwrap();
/// assert_eq!(next.to_string(), "ORD-20261016-0003");
/// ```
pub fn next_date_prefixed(today: NaiveDate, existing: &[String]) -> CoreResult<OrderNumber> {
    let mut last = 0u32;

    for raw in existing {
        match raw.parse::<OrderNumber>() {
            Ok(OrderNumber::DatePrefixed { date, seq }) if date == today => {
                last = last.max(seq);
            }
            Ok(other) => {
                warn!(order_number = %raw, parsed = %other, "Skipping order number from another scheme or day");
            }
            Err(e) => {
                warn!(order_number = %raw, error = %e, "Skipping malformed order number");
            }
        }
    }

    OrderNumber::date_prefixed(today, last + 1)
}

/// Computes the next legacy number: numeric maximum plus one, or `6000`.
pub fn next_legacy(existing: &[String]) -> CoreResult<OrderNumber> {
    let last = existing
        .iter()
        .filter_map(|raw| match raw.parse::<OrderNumber>() {
            Ok(OrderNumber::Legacy(n)) => Some(n),
            _ => None,
        })
        .max();

    match last {
        None => Ok(OrderNumber::Legacy(LEGACY_START)),
        Some(n) => n
            .checked_add(1)
            .map(OrderNumber::Legacy)
            .ok_or_else(|| CoreError::SequenceExhausted {
                prefix: "legacy".to_string(),
            }),
    }
}

// =============================================================================
// Sale Numbers
// =============================================================================

/// Parses the counter out of `SALE-NNN`.
pub fn parse_sale_number(raw: &str) -> CoreResult<u32> {
    let digits = raw
        .trim()
        .strip_prefix(SALE_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(|| CoreError::malformed(raw, "expected SALE-NNN"))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::malformed(raw, "sale counter must be numeric"));
    }

    digits
        .parse::<u32>()
        .map_err(|e| CoreError::malformed(raw, e.to_string()))
}

/// Formats a sale number with three-digit padding that widens past 999.
pub fn format_sale_number(counter: u32) -> String {
    format!("{}-{:03}", SALE_PREFIX, counter)
}

/// Next sale number after the highest well-formed one, or `SALE-001`.
pub fn next_sale_number(existing: &[String]) -> String {
    let last = existing
        .iter()
        .filter_map(|raw| parse_sale_number(raw).ok())
        .max()
        .unwrap_or(0);

    format_sale_number(last.saturating_add(1))
}

// =============================================================================
// Unit Tests
// =============================================================================
