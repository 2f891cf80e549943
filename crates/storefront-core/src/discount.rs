//! # Discount Engine
//!
//! Quantity-tiered discounts for sale line items and the pure recomputation
//! of sale totals from the current item set.
//!
//! ## Tiers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   quantity        rate                                                  │
//! │   ──────────      ──────                                                │
//! │   1 ..= 3         0%                                                    │
//! │   4 ..= 9         10%                                                   │
//! │   10 ..= 20       20%                                                   │
//! │   > 20            rejected (QuantityTooLarge)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Pricing
//! ```text
//! gross    = quantity × unit_price
//! discount = round_half_up(gross × rate)
//! total    = gross − discount
//! ```
//!
//! Sale totals are never maintained incrementally. [`recompute_totals`] folds
//! the full active item collection every time it is called.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::SaleItem;
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate in basis points (1000 = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    pub const NONE: DiscountRate = DiscountRate(0);
    pub const TEN_PERCENT: DiscountRate = DiscountRate(1000);
    pub const TWENTY_PERCENT: DiscountRate = DiscountRate(2000);

    /// Returns the tier rate for a line quantity.
    ///
    /// Quantities above [`MAX_ITEM_QUANTITY`] fail with
    /// [`CoreError::QuantityTooLarge`]. Non-positive quantities are not a
    /// pricing concern and fall into the zero tier; item validation rejects
    /// them before they reach a sale.
    ///
    /// ```rust
    /// use storefront_core::discount::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::for_quantity(3).unwrap(), DiscountRate::NONE);
    /// assert_eq!(DiscountRate::for_quantity(4).unwrap(), DiscountRate::TEN_PERCENT);
    /// assert_eq!(DiscountRate::for_quantity(10).unwrap(), DiscountRate::TWENTY_PERCENT);
    /// assert!(DiscountRate::for_quantity(21).is_err());
    /// ```
    pub fn for_quantity(quantity: i64) -> CoreResult<Self> {
        match quantity {
            q if q > MAX_ITEM_QUANTITY => Err(CoreError::QuantityTooLarge {
                requested: q,
                max: MAX_ITEM_QUANTITY,
            }),
            q if q >= 10 => Ok(DiscountRate::TWENTY_PERCENT),
            q if q >= 4 => Ok(DiscountRate::TEN_PERCENT),
            _ => Ok(DiscountRate::NONE),
        }
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

}

// =============================================================================
// Line Pricing
// =============================================================================

/// Derived money values for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LinePricing {
    pub rate: DiscountRate,
    /// `quantity × unit_price`, before discount.
    pub gross: Money,
    pub discount: Money,
    /// `gross − discount`.
    pub total: Money,
}

impl LinePricing {
    /// Prices a line from its quantity and unit price.
    ///
    /// A gross amount outside the `i64` cent range fails with
    /// [`CoreError::AmountOverflow`].
    pub fn compute(quantity: i64, unit_price: Money) -> CoreResult<Self> {
        let rate = DiscountRate::for_quantity(quantity)?;
        let gross = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| {
                CoreError::AmountOverflow(format!("{quantity} × {unit_price}"))
            })?;
        let discount = gross.percentage(rate.bps());

        Ok(LinePricing {
            rate,
            gross,
            discount,
            total: gross - discount,
        })
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Sale-level totals derived from the active items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    /// Σ line totals (after discount).
    pub total_amount: Money,
    /// Σ line discounts.
    pub total_discount: Money,
}

/// Recomputes sale totals from scratch over `items`.
///
/// Cancelled items are skipped. Fails when an item carries a quantity outside
/// the discount tiers or when a sum leaves the `i64` cent range.
pub fn recompute_totals<'a, I>(items: I) -> CoreResult<SaleTotals>
where
    I: IntoIterator<Item = &'a SaleItem>,
{
    let mut totals = SaleTotals::default();

    for item in items.into_iter().filter(|i| !i.is_cancelled) {
        let pricing = item.pricing()?;
        totals.total_amount = totals
            .total_amount
            .checked_add(pricing.total)
            .ok_or_else(|| CoreError::AmountOverflow("sale total".to_string()))?;
        totals.total_discount = totals
            .total_discount
            .checked_add(pricing.discount)
            .ok_or_else(|| CoreError::AmountOverflow("sale discount".to_string()))?;
    }

    Ok(totals)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleItem;

    fn item(product: &str, qty: i64, unit_cents: i64) -> SaleItem {
        SaleItem::new("sale-1", product, "Widget", qty, Money::from_cents(unit_cents))
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(DiscountRate::for_quantity(1).unwrap(), DiscountRate::NONE);
        assert_eq!(DiscountRate::for_quantity(3).unwrap(), DiscountRate::NONE);
        assert_eq!(DiscountRate::for_quantity(4).unwrap(), DiscountRate::TEN_PERCENT);
        assert_eq!(DiscountRate::for_quantity(9).unwrap(), DiscountRate::TEN_PERCENT);
        assert_eq!(DiscountRate::for_quantity(10).unwrap(), DiscountRate::TWENTY_PERCENT);
        assert_eq!(DiscountRate::for_quantity(20).unwrap(), DiscountRate::TWENTY_PERCENT);

        let err = DiscountRate::for_quantity(21).unwrap_err();
        assert!(matches!(
            err,
            CoreError::QuantityTooLarge {
                requested: 21,
                max: 20
            }
        ));
    }

    #[test]
    fn test_reference_examples_at_unit_price_100() {
        let unit = Money::from_cents(10_000);
        let cases = [
            (2, 20_000, 0),
            (4, 36_000, 4_000),
            (10, 80_000, 20_000),
            (20, 160_000, 40_000),
        ];

        for (qty, total, discount) in cases {
            let p = LinePricing::compute(qty, unit).unwrap();
            assert_eq!(p.total.cents(), total, "total for qty {qty}");
            assert_eq!(p.discount.cents(), discount, "discount for qty {qty}");
        }

        assert!(LinePricing::compute(21, unit).is_err());
    }

    #[test]
    fn test_recompute_sums_active_items_only() {
        let mut cancelled = item("p-3", 10, 1_000);
        cancelled.is_cancelled = true;
        let items = vec![item("p-1", 2, 10_000), item("p-2", 4, 10_000), cancelled];

        let totals = recompute_totals(&items).unwrap();
        assert_eq!(totals.total_amount.cents(), 20_000 + 36_000);
        assert_eq!(totals.total_discount.cents(), 4_000);
    }

    #[test]
    fn test_oversized_line_is_an_error_not_a_panic() {
        let unit = Money::from_cents(i64::MAX / 10);
        assert!(matches!(
            LinePricing::compute(20, unit),
            Err(CoreError::AmountOverflow(_))
        ));
        assert!(LinePricing::compute(10, unit).is_ok());
    }

    #[test]
    fn test_recompute_overflowing_sum_is_an_error() {
        let unit = i64::MAX / 4;
        let items = vec![item("p-1", 3, unit), item("p-2", 3, unit)];
        assert!(matches!(
            recompute_totals(&items),
            Err(CoreError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_recompute_empty() {
        let totals = recompute_totals(&Vec::<SaleItem>::new()).unwrap();
        assert_eq!(totals, SaleTotals::default());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// gross = total + discount, and discount is the rounded tier share.
            #[test]
            fn line_pricing_is_consistent(qty in 1i64..=20, unit in 1i64..=10_000_000) {
                let p = LinePricing::compute(qty, Money::from_cents(unit)).unwrap();
                let gross = qty * unit;
                let rate = DiscountRate::for_quantity(qty).unwrap().bps() as i64;

                prop_assert_eq!(p.gross.cents(), gross);
                prop_assert_eq!(p.total + p.discount, p.gross);
                prop_assert_eq!(p.discount.cents(), (gross * rate + 5000) / 10000);
            }

            /// Totals always equal the fold over line pricing, and folding twice agrees.
            #[test]
            fn recompute_is_sum_and_idempotent(
                lines in prop::collection::vec((1i64..=20, 1i64..=1_000_000), 0..12)
            ) {
                let items: Vec<SaleItem> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, (q, u))| item(&format!("p-{i}"), *q, *u))
                    .collect();

                let first = recompute_totals(&items).unwrap();
                let second = recompute_totals(&items).unwrap();
                prop_assert_eq!(first, second);

                let expected: Money = items.iter().map(|i| i.pricing().unwrap().total).sum();
                prop_assert_eq!(first.total_amount, expected);
            }

            #[test]
            fn over_cap_always_rejected(qty in 21i64..10_000) {
                prop_assert!(DiscountRate::for_quantity(qty).is_err());
            }
        }
    }
}
