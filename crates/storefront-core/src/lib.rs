//! # storefront-core: Pure Business Logic for the Storefront Backend
//!
//! This crate holds the sale pricing rules and the Sale aggregate as pure
//! functions and plain data. Nothing in here touches a database or a socket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    routes ──► services ──► notification bus                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │ discount │ │   sale   │ │    reconcile     │  │   │
//! │  │   │ Product  │ │  tiers   │ │ aggregate│ │ Add/Update/Remove│  │   │
//! │  │   │ SaleItem │ │ totals   │ │ lifecycle│ │   planner        │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  storefront-db (Database Layer)                 │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, Customer)
//! - [`money`] - Money type with integer arithmetic
//! - [`discount`] - Quantity discount tiers and total recomputation
//! - [`sale`] - Sale aggregate behaviour (add, remove, close, cancel)
//! - [`reconcile`] - Diffing a target product/quantity list against a sale
//! - [`events`] - Notifications emitted by sale workflows
//! - [`summary`] - Aggregates over a list of sales
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::discount::{DiscountRate, LinePricing};
//! use storefront_core::money::Money;
//!
//! let pricing = LinePricing::compute(4, Money::from_cents(10_000)).unwrap();
//! assert_eq!(pricing.rate, DiscountRate::TEN_PERCENT);
//! assert_eq!(pricing.total.cents(), 36_000);
//! assert_eq!(pricing.discount.cents(), 4_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod events;
pub mod money;
pub mod reconcile;
pub mod sale;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{recompute_totals, DiscountRate, LinePricing, SaleTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use events::SaleEvent;
pub use money::Money;
pub use reconcile::{ItemChange, ProductQuantity, Reconciliation};
pub use summary::SalesSummary;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single product on one sale.
///
/// Quantities above this are a business error, never clamped.
pub const MAX_ITEM_QUANTITY: i64 = 20;

/// Highest unit price a product may carry, in cents (10,000,000.00).
///
/// A full line is at most `MAX_ITEM_QUANTITY × MAX_PRICE_CENTS`, so sale
/// totals stay far inside the `i64` range.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Page size used when a listing request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum length of a branch name.
pub const MAX_BRANCH_LENGTH: usize = 50;
