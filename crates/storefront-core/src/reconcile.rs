//! # Sale Item Reconciliation
//!
//! Applies a target list of `(product_id, quantity)` pairs to an existing sale
//! and reports the minimal set of line changes to persist.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each target entry, in the order supplied:                          │
//! │                                                                         │
//! │   product on sale?   quantity    →  change                              │
//! │   ───────────────    ────────       ──────────────────────────────      │
//! │   no                 any         →  Added    (new line, priced now)     │
//! │   yes                0           →  Removed  (+ ItemRemoved event)      │
//! │   yes                > 0         →  Updated  (quantity replaced)        │
//! │                                                                         │
//! │  after the loop: recompute totals, emit SaleModified                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are applied one at a time, so `[{A, 0}, {A, 3}]` removes the old
//! line for A and then adds a fresh one. Classification uses an index keyed
//! by product id that is kept in step with each mutation.
//!
//! The whole plan is computed on a working copy. The caller's sale is only
//! replaced when every entry succeeded.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::SaleTotals;
use crate::error::{CoreError, CoreResult};
use crate::events::SaleEvent;
use crate::types::{Product, Sale, SaleItem};

// =============================================================================
// Input
// =============================================================================

/// A requested quantity for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductQuantity {
    pub product_id: String,
    pub quantity: i64,
}

impl ProductQuantity {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        ProductQuantity {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Distinct product ids referenced by `entries`, in first-seen order.
pub fn distinct_product_ids(entries: &[ProductQuantity]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for entry in entries {
        if seen.insert(entry.product_id.as_str()) {
            ids.push(entry.product_id.clone());
        }
    }
    ids
}

/// Requested product ids that are absent from `found`.
pub fn missing_products(requested: &[String], found: &[Product]) -> Vec<String> {
    let found: HashSet<&str> = found.iter().map(|p| p.id.as_str()).collect();
    requested
        .iter()
        .filter(|id| !found.contains(id.as_str()))
        .cloned()
        .collect()
}

// =============================================================================
// Output
// =============================================================================

/// A line change to persist, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    /// Insert a new line.
    Added(SaleItem),
    /// Overwrite quantity and gross of an existing line.
    Updated(SaleItem),
    /// Soft-delete an existing line (`is_cancelled = true`).
    Removed(SaleItem),
}

impl ItemChange {
    pub fn item(&self) -> &SaleItem {
        match self {
            ItemChange::Added(i) | ItemChange::Updated(i) | ItemChange::Removed(i) => i,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ItemChange::Added(_) => "added",
            ItemChange::Updated(_) => "updated",
            ItemChange::Removed(_) => "removed",
        }
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub changes: Vec<ItemChange>,
    /// `ItemRemoved` per removal, then one `SaleModified`.
    pub events: Vec<SaleEvent>,
    pub totals: SaleTotals,
}

impl Reconciliation {
    pub fn count(&self, kind: &str) -> usize {
        self.changes.iter().filter(|c| c.kind() == kind).count()
    }
}

// =============================================================================
// Reconcile
// =============================================================================

impl Sale {
    /// Reconciles the sale's lines against `targets`.
    ///
    /// `products` must contain every product referenced by `targets`; any
    /// missing id fails the whole call with [`CoreError::ProductsNotFound`]
    /// before anything is touched. A failure on any later entry also leaves
    /// `self` unchanged.
    pub fn reconcile(
        &mut self,
        targets: &[ProductQuantity],
        products: &[Product],
    ) -> CoreResult<Reconciliation> {
        let requested = distinct_product_ids(targets);
        let missing = missing_products(&requested, products);
        if !missing.is_empty() {
            return Err(CoreError::ProductsNotFound(missing));
        }

        let catalog: HashMap<&str, &Product> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut working = self.clone();
        let mut index: HashMap<String, String> = working
            .items
            .iter()
            .map(|i| (i.product_id.clone(), i.id.clone()))
            .collect();

        let mut changes = Vec::with_capacity(targets.len());
        let mut events = Vec::new();

        for target in targets {
            let product_id = target.product_id.as_str();

            match (index.contains_key(product_id), target.quantity) {
                (false, _) => {
                    let product = catalog
                        .get(product_id)
                        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
                    let item = SaleItem::for_product(&working.id, product, target.quantity);
                    let added = working.add_item(item)?;
                    index.insert(added.product_id.clone(), added.id.clone());
                    changes.push(ItemChange::Added(added));
                }
                (true, 0) => {
                    let removed = working.remove_item(product_id)?;
                    index.remove(product_id);
                    events.push(SaleEvent::item_removed(&working.id, &removed.id));
                    changes.push(ItemChange::Removed(removed));
                }
                (true, _) => {
                    let updated = working.update_item_quantity(product_id, target.quantity)?;
                    changes.push(ItemChange::Updated(updated));
                }
            }
        }

        let totals = working.recalculate()?;
        events.push(SaleEvent::modified(&working.id, totals.total_amount));

        *self = working;
        Ok(Reconciliation {
            changes,
            events,
            totals,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{ProductInput, Rating, SaleStatus};

    fn product(title: &str, price_cents: i64) -> Product {
        let mut p = Product::new(ProductInput {
            title: title.to_string(),
            description: "test product".to_string(),
            price_cents,
            category: "test".to_string(),
            image: "img.png".to_string(),
            rating: Rating::default(),
        });
        p.activate();
        p
    }

    fn sale_with(product: &Product, qty: i64) -> Sale {
        let mut sale = Sale::new("customer-1", "Main");
        sale.add_item(SaleItem::for_product(&sale.id, product, qty))
            .unwrap();
        sale
    }

    #[test]
    fn test_remove_and_add() {
        let a = product("Alpha", 10_000);
        let b = product("Bravo", 10_000);
        let mut sale = sale_with(&a, 5);
        let a_item_id = sale.items[0].id.clone();

        let result = sale
            .reconcile(
                &[ProductQuantity::new(&a.id, 0), ProductQuantity::new(&b.id, 3)],
                &[a.clone(), b.clone()],
            )
            .unwrap();

        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].product_id, b.id);
        assert_eq!(sale.total_amount_cents, 30_000);

        assert_eq!(result.changes.len(), 2);
        assert!(matches!(&result.changes[0], ItemChange::Removed(i) if i.id == a_item_id && i.is_cancelled));
        assert!(matches!(&result.changes[1], ItemChange::Added(i) if i.product_id == b.id));

        assert_eq!(
            result.events[0],
            SaleEvent::ItemRemoved {
                sale_id: sale.id.clone(),
                item_id: a_item_id,
                occurred_at: result.events[0].occurred_at(),
            }
        );
        assert!(matches!(
            result.events.last(),
            Some(SaleEvent::SaleModified { total_amount_cents: 30_000, .. })
        ));
    }

    #[test]
    fn test_update_moves_to_ten_percent_tier() {
        let a = product("Alpha", 10_000);
        let mut sale = sale_with(&a, 5);
        let item_id = sale.items[0].id.clone();

        let result = sale
            .reconcile(&[ProductQuantity::new(&a.id, 8)], &[a.clone()])
            .unwrap();

        let item = &sale.items[0];
        assert_eq!(item.id, item_id);
        assert_eq!(item.quantity, 8);
        assert_eq!(item.pricing().unwrap().discount.cents(), 8_000);
        assert_eq!(sale.total_amount_cents, 72_000);
        assert_eq!(result.count("updated"), 1);
        assert_eq!(result.events.len(), 1);
    }

    #[test]
    fn test_unknown_product_fails_without_mutation() {
        let a = product("Alpha", 10_000);
        let mut sale = sale_with(&a, 5);
        let before = sale.clone();

        let err = sale
            .reconcile(
                &[
                    ProductQuantity::new(&a.id, 0),
                    ProductQuantity::new("ghost-1", 1),
                    ProductQuantity::new("ghost-2", 1),
                    ProductQuantity::new("ghost-1", 2),
                ],
                &[a],
            )
            .unwrap_err();

        match err {
            CoreError::ProductsNotFound(ids) => assert_eq!(ids, vec!["ghost-1", "ghost-2"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sale, before);
    }

    #[test]
    fn test_mid_list_failure_is_all_or_nothing() {
        let a = product("Alpha", 1_000);
        let b = product("Bravo", 1_000);
        let mut sale = sale_with(&a, 2);
        let before = sale.clone();

        let err = sale
            .reconcile(
                &[ProductQuantity::new(&b.id, 1), ProductQuantity::new(&a.id, 21)],
                &[a, b],
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_sequential_remove_then_readd_same_product() {
        let a = product("Alpha", 1_000);
        let mut sale = sale_with(&a, 2);
        let old_id = sale.items[0].id.clone();

        let result = sale
            .reconcile(
                &[ProductQuantity::new(&a.id, 0), ProductQuantity::new(&a.id, 4)],
                &[a.clone()],
            )
            .unwrap();

        assert_eq!(result.count("removed"), 1);
        assert_eq!(result.count("added"), 1);
        assert_eq!(sale.items.len(), 1);
        assert_ne!(sale.items[0].id, old_id);
        assert_eq!(sale.items[0].quantity, 4);
    }

    #[test]
    fn test_zero_for_absent_product_is_rejected() {
        let a = product("Alpha", 1_000);
        let b = product("Bravo", 1_000);
        let mut sale = sale_with(&a, 2);

        let err = sale
            .reconcile(&[ProductQuantity::new(&b.id, 0)], &[b])
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_closed_sale_cannot_be_reconciled() {
        let a = product("Alpha", 1_000);
        let mut sale = sale_with(&a, 2);
        sale.close().unwrap();

        let err = sale
            .reconcile(&[ProductQuantity::new(&a.id, 3)], &[a])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSaleStatus { .. }));
        assert_eq!(sale.status, SaleStatus::Closed);
    }

    #[test]
    fn test_new_line_uses_current_product_price() {
        let a = product("Alpha", 1_000);
        let mut b = product("Bravo", 500);
        let mut sale = sale_with(&a, 1);

        b.price_cents = 750;
        sale.reconcile(&[ProductQuantity::new(&b.id, 2)], &[b.clone()])
            .unwrap();

        let line = sale.item_for_product(&b.id).unwrap();
        assert_eq!(line.unit_price(), Money::from_cents(750));
    }

    #[test]
    fn test_missing_products_helper() {
        let a = product("Alpha", 1_000);
        let requested = vec![a.id.clone(), "x".to_string()];
        assert_eq!(missing_products(&requested, &[a]), vec!["x".to_string()]);
    }
}
