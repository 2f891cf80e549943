//! # Money Module
//!
//! Provides the `Money` type used for prices, line totals and discounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Discount math on floats drifts:                                        │
//! │    3 × 33.33 × 0.9 = 89.991000000000001                                │
//! │                                                                         │
//! │  Integer cents never drift. Each discount is rounded once, per line,   │
//! │  half-up to a whole cent, and every total is an exact integer sum.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let unit = Money::from_cents(10_000); // 100.00
//! let gross = unit.checked_multiply_quantity(4).unwrap(); // 400.00
//! assert_eq!(gross.percentage(1000).cents(), 4_000); // 10% = 40.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► SaleItem.unit_price_cents
///                              │
///                              ▼ × quantity
///                         gross line amount ──► discount (tier rate)
///                              │                     │
///                              ▼                     ▼
///                        Sale.total_amount    Sale.total_discount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies by a quantity, `None` on overflow.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_multiply_quantity(4), Some(Money::from_cents(1_000)));
    /// assert_eq!(Money::from_cents(i64::MAX / 10).checked_multiply_quantity(20), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `bps` basis points of this amount, rounded half-up to a cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so that
    /// large gross amounts cannot overflow during the multiply.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// // 10% of 0.05 = 0.005 → rounds up to 0.01
    /// assert_eq!(Money::from_cents(5).percentage(1000).cents(), 1);
    /// // 20% of 1600.00 = 320.00
    /// assert_eq!(Money::from_cents(160_000).percentage(2000).cents(), 32_000);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Integer average of a total over `count` entries, zero when empty.
    pub fn average(total: Money, count: usize) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money(total.0 / count as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering; clients format for display themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.checked_multiply_quantity(3), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let big = Money::from_cents(i64::MAX / 10);
        assert_eq!(big.checked_multiply_quantity(20), None);
        assert!(big.checked_multiply_quantity(10).is_some());

        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 10% of 0.15 = 0.015 → 0.02
        assert_eq!(Money::from_cents(15).percentage(1000).cents(), 2);
        // 10% of 0.14 = 0.014 → 0.01
        assert_eq!(Money::from_cents(14).percentage(1000).cents(), 1);
        assert_eq!(Money::from_cents(12345).percentage(0).cents(), 0);
    }

    #[test]
    fn test_sum_and_average() {
        let total: Money = [100, 200, 300].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 600);
        assert_eq!(Money::average(total, 3).cents(), 200);
        assert_eq!(Money::average(total, 0).cents(), 0);
    }

    #[test]
    fn test_large_amount_does_not_overflow() {
        let big = Money::from_cents(i64::MAX / 2);
        let pct = big.percentage(2000);
        assert!(pct.cents() > 0);
    }
}
