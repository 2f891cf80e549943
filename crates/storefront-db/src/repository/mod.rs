//! # Repository Module
//!
//! One repository per aggregate. Each holds a clone of the pool and owns the
//! SQL for its tables.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service                                                                │
//! │     │  db.sales().apply_changes(&sale, &changes)                        │
//! │     ▼                                                                   │
//! │  SaleRepository ──► BEGIN; item writes; header save; COMMIT            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD, availability, batch lookup
//! - [`customer::CustomerRepository`] - Customer insert and lookup
//! - [`sale::SaleRepository`] - Sales, sale items, transactional change sets

use sqlx::{QueryBuilder, Sqlite};
use storefront_core::validation::OrderBy;

use crate::error::{DbError, DbResult};

pub mod customer;
pub mod product;
pub mod sale;

/// One page of a listing plus the total row count before paging.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Appends `ORDER BY ...` for already-whitelisted terms.
///
/// `columns` maps public sort names to SQL columns. A name without a mapping
/// is rejected rather than spliced into the query.
pub(crate) fn push_order_by(
    builder: &mut QueryBuilder<'_, Sqlite>,
    order: &[OrderBy],
    columns: &[(&str, &str)],
) -> DbResult<()> {
    if order.is_empty() {
        return Ok(());
    }

    builder.push(" ORDER BY ");
    for (i, term) in order.iter().enumerate() {
        let column = columns
            .iter()
            .find(|(name, _)| *name == term.column)
            .map(|(_, sql)| *sql)
            .ok_or_else(|| DbError::QueryFailed(format!("unknown sort column: {}", term.column)))?;

        if i > 0 {
            builder.push(", ");
        }
        builder.push(column);
        builder.push(" ");
        builder.push(term.direction.as_sql());
    }
    Ok(())
}
