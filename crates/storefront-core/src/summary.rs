//! # Sales Summary
//!
//! Headline numbers over a set of sales: count, totals, average ticket and
//! breakdowns by status and by branch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Sale, SaleStatus};

/// Counts of sales per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusCounts {
    pub draft: i64,
    pub open: i64,
    pub closed: i64,
    pub cancelled: i64,
}

impl StatusCounts {
    fn bump(&mut self, status: SaleStatus) {
        match status {
            SaleStatus::Draft => self.draft += 1,
            SaleStatus::Open => self.open += 1,
            SaleStatus::Closed => self.closed += 1,
            SaleStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BranchSummary {
    pub branch: String,
    pub sale_count: i64,
    pub total_amount_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: i64,
    /// Σ total amount over sales that are not cancelled.
    pub total_amount_cents: i64,
    /// Σ total discount over sales that are not cancelled.
    pub total_discount_cents: i64,
    /// Integer mean of `total_amount_cents` over sales that are not cancelled.
    pub average_amount_cents: i64,
    pub by_status: StatusCounts,
    /// Sorted by branch name.
    pub by_branch: Vec<BranchSummary>,
}

impl SalesSummary {
    /// Summarizes `sales`. Cancelled sales are counted but carry no revenue.
    ///
    /// Fails with [`CoreError::AmountOverflow`] if a sum leaves the `i64` range.
    pub fn from_sales(sales: &[Sale]) -> CoreResult<Self> {
        let mut summary = SalesSummary::default();
        let mut branches: BTreeMap<&str, BranchSummary> = BTreeMap::new();
        let mut revenue_count = 0usize;

        for sale in sales {
            summary.sale_count += 1;
            summary.by_status.bump(sale.status);

            let entry = branches
                .entry(sale.branch.as_str())
                .or_insert_with(|| BranchSummary {
                    branch: sale.branch.clone(),
                    sale_count: 0,
                    total_amount_cents: 0,
                });
            entry.sale_count += 1;

            if sale.is_cancelled {
                continue;
            }

            revenue_count += 1;
            summary.total_amount_cents =
                add_cents(summary.total_amount_cents, sale.total_amount_cents, "total amount")?;
            summary.total_discount_cents = add_cents(
                summary.total_discount_cents,
                sale.total_discount_cents,
                "total discount",
            )?;
            entry.total_amount_cents =
                add_cents(entry.total_amount_cents, sale.total_amount_cents, "branch total")?;
        }

        summary.average_amount_cents =
            Money::average(Money::from_cents(summary.total_amount_cents), revenue_count).cents();
        summary.by_branch = branches.into_values().collect();
        Ok(summary)
    }
}

fn add_cents(acc: i64, value: i64, what: &str) -> CoreResult<i64> {
    acc.checked_add(value)
        .ok_or_else(|| CoreError::AmountOverflow(format!("summary {what}")))
}
