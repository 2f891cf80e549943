//! # Sale Aggregate
//!
//! State transitions and item mutations on [`Sale`].
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Sale::new(customer, branch) ──► Draft                                 │
//! │                                     │                                   │
//! │                          add_item() │                                   │
//! │                                     ▼                                   │
//! │                                   Open ◄──┐ add_item / remove_item /    │
//! │                                     │     │ update_item_quantity        │
//! │                                     ├─────┘                             │
//! │                             close() │                                   │
//! │                                     ▼                                   │
//! │                                  Closed       (item changes rejected)   │
//! │                                                                         │
//! │   cancel() from any state ──► Cancelled       (item changes rejected)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating call validates first and recomputes totals last. A call
//! that returns `Err` leaves the sale exactly as it was.

use chrono::Utc;
use uuid::Uuid;

use crate::discount::{recompute_totals, SaleTotals};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Sale, SaleItem, SaleStatus};
use crate::validation::{validate_branch, validate_sale_item};

impl Sale {
    /// Starts a new draft sale for `customer_id` at `branch`.
    pub fn new(customer_id: impl Into<String>, branch: impl Into<String>) -> Self {
        let now = Utc::now();
        Sale {
            id: Uuid::new_v4().to_string(),
            sale_date: now,
            customer_id: customer_id.into(),
            branch: branch.into().trim().to_string(),
            total_amount_cents: 0,
            total_discount_cents: 0,
            is_cancelled: false,
            status: SaleStatus::Draft,
            items: Vec::new(),
            created_at: now,
            updated_at: None,
        }
    }

    /// Validated constructor used by the create workflow.
    pub fn open(customer_id: impl Into<String>, branch: &str) -> CoreResult<Self> {
        validate_branch(branch)?;
        Ok(Sale::new(customer_id, branch))
    }

    /// Active line for `product_id`, if any.
    pub fn item_for_product(&self, product_id: &str) -> Option<&SaleItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Totals computed from the current items, without touching the cached fields.
    pub fn totals(&self) -> CoreResult<SaleTotals> {
        recompute_totals(&self.items)
    }

    /// Adds a line, or replaces the quantity of the existing line for the same product.
    ///
    /// The existing line keeps its id when merged. Moves a draft sale to `Open`.
    pub fn add_item(&mut self, item: SaleItem) -> CoreResult<SaleItem> {
        self.check_item(&item)?;
        self.ensure_accepts_item_changes()?;

        let stored = match self.position_of(&item.product_id) {
            Some(idx) => {
                let existing = &mut self.items[idx];
                existing.set_quantity(item.quantity);
                existing.clone()
            }
            None => {
                self.items.push(item.clone());
                item
            }
        };

        if self.status == SaleStatus::Draft {
            self.status = SaleStatus::Open;
        }
        self.touch();
        self.recalculate()?;
        Ok(stored)
    }

    /// Removes the active line for `product_id` and returns it marked cancelled.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<SaleItem> {
        self.ensure_accepts_item_changes()?;

        let idx = self
            .position_of(product_id)
            .ok_or_else(|| CoreError::SaleItemNotFound {
                sale_id: self.id.clone(),
                product_id: product_id.to_string(),
            })?;

        let mut removed = self.items.remove(idx);
        removed.is_cancelled = true;

        self.touch();
        self.recalculate()?;
        Ok(removed)
    }

    /// Replaces the quantity of an existing line.
    ///
    /// The replacement goes through the same checks as a fresh add.
    pub fn update_item_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<SaleItem> {
        let existing = self
            .item_for_product(product_id)
            .ok_or_else(|| CoreError::SaleItemNotFound {
                sale_id: self.id.clone(),
                product_id: product_id.to_string(),
            })?;

        let mut replacement = existing.clone();
        replacement.set_quantity(quantity);
        self.add_item(replacement)
    }

    /// Recomputes and stores the sale totals from the full item set.
    pub fn recalculate(&mut self) -> CoreResult<SaleTotals> {
        let totals = recompute_totals(&self.items)?;
        self.total_amount_cents = totals.total_amount.cents();
        self.total_discount_cents = totals.total_discount.cents();
        Ok(totals)
    }

    /// Finalizes the sale.
    pub fn close(&mut self) -> CoreResult<()> {
        if matches!(self.status, SaleStatus::Closed | SaleStatus::Cancelled) {
            return Err(self.invalid_status());
        }

        self.recalculate()?;
        self.status = SaleStatus::Closed;
        self.touch();
        Ok(())
    }

    /// Cancels the sale regardless of its items. Cancelling twice is a no-op.
    pub fn cancel(&mut self) {
        if self.status == SaleStatus::Cancelled {
            return;
        }
        self.is_cancelled = true;
        self.status = SaleStatus::Cancelled;
        self.touch();
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn check_item(&self, item: &SaleItem) -> CoreResult<()> {
        validate_sale_item(item)?;
        if item.sale_id != self.id {
            return Err(ValidationError::InvalidFormat {
                field: "sale_id".to_string(),
                reason: format!("item belongs to sale {}", item.sale_id),
            }
            .into());
        }
        item.pricing()?;
        Ok(())
    }

    fn ensure_accepts_item_changes(&self) -> CoreResult<()> {
        if self.status.accepts_item_changes() {
            Ok(())
        } else {
            Err(self.invalid_status())
        }
    }

    fn invalid_status(&self) -> CoreError {
        CoreError::InvalidSaleStatus {
            sale_id: self.id.clone(),
            current_status: self.status.to_string(),
        }
    }

    fn position_of(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    const UNIT: Money = Money::from_cents(10_000);

    fn sale() -> Sale {
        Sale::new("customer-1", "Downtown")
    }

    fn line(sale: &Sale, product: &str, qty: i64) -> SaleItem {
        SaleItem::new(&sale.id, product, product.to_uppercase(), qty, UNIT)
    }

    #[test]
    fn test_new_sale_is_draft_not_cancelled() {
        let sale = sale();
        assert_eq!(sale.status, SaleStatus::Draft);
        assert!(!sale.is_cancelled);
        assert!(sale.items.is_empty());
        assert_eq!(sale.total_amount_cents, 0);
    }

    #[test]
    fn test_oversized_price_is_rejected_without_panicking() {
        let mut sale = sale();
        let huge = SaleItem::new(&sale.id, "p-1", "Gold Bar", 20, Money::from_cents(i64::MAX / 10));

        assert!(sale.add_item(huge).is_err());
        assert!(sale.items.is_empty());
        assert_eq!(sale.status, SaleStatus::Draft);

        let capped = SaleItem::new(&sale.id, "p-2", "Safe", 20, Money::from_cents(crate::MAX_PRICE_CENTS));
        sale.add_item(capped).unwrap();
        assert_eq!(sale.total_amount_cents, 16_000_000_000);
    }

    #[test]
    fn test_open_validates_branch() {
        assert!(Sale::open("c", "   ").is_err());
        assert!(Sale::open("c", &"x".repeat(51)).is_err());
        assert_eq!(Sale::open("c", " North ").unwrap().branch, "North");
    }

    #[test]
    fn test_add_item_opens_sale_and_prices_line() {
        let mut sale = sale();
        let item = line(&sale, "a", 4);
        sale.add_item(item).unwrap();

        assert_eq!(sale.status, SaleStatus::Open);
        assert_eq!(sale.total_amount_cents, 36_000);
        assert_eq!(sale.total_discount_cents, 4_000);
    }

    #[test]
    fn test_add_same_product_replaces_quantity_and_keeps_id() {
        let mut sale = sale();
        let first = sale.add_item(line(&sale, "a", 2)).unwrap();
        let merged = sale.add_item(line(&sale, "a", 10)).unwrap();

        assert_eq!(sale.items.len(), 1);
        assert_eq!(merged.id, first.id);
        assert_eq!(merged.quantity, 10);
        assert_eq!(sale.total_amount_cents, 80_000);
        assert_eq!(sale.total_discount_cents, 20_000);
    }

    #[test]
    fn test_add_over_cap_leaves_sale_unchanged() {
        let mut sale = sale();
        sale.add_item(line(&sale, "a", 2)).unwrap();
        let before = sale.clone();

        let err = sale.add_item(line(&sale, "a", 21)).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        assert_eq!(sale, before);

        let err = sale.add_item(line(&sale, "b", 21)).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_add_invalid_item_is_validation_error() {
        let mut sale = sale();
        let zero_qty = line(&sale, "a", 0);
        assert!(matches!(
            sale.add_item(zero_qty).unwrap_err(),
            CoreError::Validation(_)
        ));

        let free = SaleItem::new(&sale.id, "b", "B", 1, Money::zero());
        assert!(matches!(
            sale.add_item(free).unwrap_err(),
            CoreError::Validation(_)
        ));

        let foreign = SaleItem::new("other-sale", "c", "C", 1, UNIT);
        assert!(sale.add_item(foreign).is_err());
        assert_eq!(sale.status, SaleStatus::Draft);
    }

    #[test]
    fn test_closed_sale_rejects_item_changes() {
        let mut sale = sale();
        sale.add_item(line(&sale, "a", 1)).unwrap();
        sale.close().unwrap();

        let err = sale.add_item(line(&sale, "b", 1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSaleStatus { .. }));
        assert!(sale.remove_item("a").is_err());
        assert_eq!(sale.items.len(), 1);
    }

    #[test]
    fn test_cancelled_sale_rejects_item_changes() {
        let mut sale = sale();
        sale.add_item(line(&sale, "a", 1)).unwrap();
        sale.cancel();

        assert!(sale.is_cancelled);
        assert_eq!(sale.status, SaleStatus::Cancelled);
        assert!(sale.add_item(line(&sale, "b", 1)).is_err());
    }

    #[test]
    fn test_remove_item_recomputes() {
        let mut sale = sale();
        sale.add_item(line(&sale, "a", 4)).unwrap();
        sale.add_item(line(&sale, "b", 2)).unwrap();

        let removed = sale.remove_item("a").unwrap();
        assert!(removed.is_cancelled);
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.total_amount_cents, 20_000);
        assert_eq!(sale.total_discount_cents, 0);
    }

    #[test]
    fn test_remove_missing_item_is_error() {
        let mut sale = sale();
        let err = sale.remove_item("nope").unwrap_err();
        assert!(matches!(err, CoreError::SaleItemNotFound { .. }));
    }

    #[test]
    fn test_update_quantity_moves_tier() {
        let mut sale = sale();
        sale.add_item(line(&sale, "a", 5)).unwrap();
        let updated = sale.update_item_quantity("a", 8).unwrap();

        assert_eq!(updated.quantity, 8);
        assert_eq!(sale.total_amount_cents, 72_000);
        assert_eq!(sale.total_discount_cents, 8_000);
        assert!(sale.update_item_quantity("a", 25).is_err());
        assert_eq!(sale.item_for_product("a").unwrap().quantity, 8);
    }

    #[test]
    fn test_close_rules() {
        let mut sale = sale();
        sale.add_item(line(&sale, "a", 3)).unwrap();
        sale.close().unwrap();
        assert_eq!(sale.status, SaleStatus::Closed);
        assert!(sale.close().is_err());

        let mut cancelled = Sale::new("c", "b");
        cancelled.cancel();
        assert!(matches!(
            cancelled.close().unwrap_err(),
            CoreError::InvalidSaleStatus { .. }
        ));
    }

    #[test]
    fn test_recalculate_is_idempotent_and_matches_totals() {
        let mut sale = sale();
        sale.add_item(line(&sale, "a", 12)).unwrap();
        sale.add_item(line(&sale, "b", 6)).unwrap();

        let first = sale.recalculate().unwrap();
        let second = sale.recalculate().unwrap();
        assert_eq!(first, second);
        assert_eq!(sale.totals().unwrap(), first);
        assert_eq!(sale.total_amount().cents(), 96_000 + 54_000);
    }
}
