//! # Domain Types
//!
//! Core domain types used throughout the storefront backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title          │   │  customer_id ───┼──►│  name           │       │
//! │  │  price_cents    │   │  branch         │   │  email          │       │
//! │  │  rating         │   │  status         │   └─────────────────┘       │
//! │  │  is_available   │   │  items[] ───────┼──┐                          │
//! │  └────────▲────────┘   └─────────────────┘  │                          │
//! │           │                                  ▼                          │
//! │           │            ┌─────────────────────────────┐                 │
//! │           └────────────┤  SaleItem                   │                 │
//! │                        │  product_id, quantity ≤ 20  │                 │
//! │                        │  unit_price_cents (snapshot)│                 │
//! │                        └─────────────────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::discount::LinePricing;
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Rating
// =============================================================================

/// Aggregated customer rating of a product.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rating {
    /// Average score, 0.0 to 5.0.
    pub rate: f64,
    /// Number of ratings the average is built from.
    pub count: i64,
}

// =============================================================================
// Product
// =============================================================================

/// A product that can be put on a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub title: String,

    pub description: String,

    /// Price in cents.
    pub price_cents: i64,

    pub category: String,

    /// Image URL or storage key.
    pub image: String,

    pub rating: Rating,

    /// Whether the product is currently offered.
    pub is_available: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Builds a new product from validated input. New products start unavailable.
    pub fn new(input: ProductInput) -> Self {
        Product {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            price_cents: input.price_cents,
            category: input.category.trim().to_string(),
            image: input.image.trim().to_string(),
            rating: input.rating,
            is_available: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Replaces the editable fields and stamps `updated_at`.
    pub fn apply(&mut self, input: ProductInput) {
        self.title = input.title.trim().to_string();
        self.description = input.description.trim().to_string();
        self.price_cents = input.price_cents;
        self.category = input.category.trim().to_string();
        self.image = input.image.trim().to_string();
        self.rating = input.rating;
        self.updated_at = Some(Utc::now());
    }

    pub fn activate(&mut self) {
        self.is_available = true;
        self.updated_at = Some(Utc::now());
    }

    pub fn deactivate(&mut self) {
        self.is_available = false;
        self.updated_at = Some(Utc::now());
    }
}

/// Editable product fields, used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

// =============================================================================
// Customer
// =============================================================================

/// The customer a sale is rung up for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Customer {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle state of a sale.
///
/// ```text
///   Draft ──add item──► Open ──close──► Closed
///     │                  │
///     └──────cancel──────┴──────────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Created, no item added yet.
    #[default]
    Draft,
    /// Has received at least one item and can still change.
    Open,
    /// Finalized. No more item changes.
    Closed,
    /// Cancelled by the client.
    Cancelled,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 4] = [
        SaleStatus::Draft,
        SaleStatus::Open,
        SaleStatus::Closed,
        SaleStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::Open => "open",
            SaleStatus::Closed => "closed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// Whether items may still be added or removed.
    pub fn accepts_item_changes(&self) -> bool {
        matches!(self, SaleStatus::Draft | SaleStatus::Open)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(SaleStatus::Draft),
            "open" => Ok(SaleStatus::Open),
            "closed" => Ok(SaleStatus::Closed),
            "cancelled" | "canceled" => Ok(SaleStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SaleStatus::ALL.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// One product line on a sale.
///
/// ## Snapshot Pattern
/// `unit_price_cents` and `product_title` are copied from the product when the
/// line is created, so later product edits do not rewrite sale history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_title: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `quantity × unit_price`, before discount.
    pub total_amount_cents: i64,
    /// Soft-delete marker for lines removed from the sale.
    pub is_cancelled: bool,
}

impl SaleItem {
    pub fn new(
        sale_id: impl Into<String>,
        product_id: impl Into<String>,
        product_title: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.into(),
            product_id: product_id.into(),
            product_title: product_title.into(),
            quantity,
            unit_price_cents: unit_price.cents(),
            // Out-of-range lines are rejected when priced by `Sale::add_item`.
            total_amount_cents: unit_price.cents().saturating_mul(quantity),
            is_cancelled: false,
        }
    }

    /// Creates a line for `product` on `sale_id` at the product's current price.
    pub fn for_product(sale_id: impl Into<String>, product: &Product, quantity: i64) -> Self {
        SaleItem::new(sale_id, &product.id, &product.title, quantity, product.price())
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Gross, discount and net for this line at its current quantity.
    pub fn pricing(&self) -> CoreResult<LinePricing> {
        LinePricing::compute(self.quantity, self.unit_price())
    }

    /// Sets a new quantity and refreshes the gross amount.
    pub(crate) fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.total_amount_cents = self.unit_price_cents.saturating_mul(quantity);
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale with its line items.
///
/// Behaviour lives in [`crate::sale`]. `items` holds active lines only;
/// removed lines are reported through [`crate::reconcile::ItemChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub customer_id: String,
    pub branch: String,
    /// Σ discounted line totals.
    pub total_amount_cents: i64,
    /// Σ line discounts.
    pub total_discount_cents: i64,
    pub is_cancelled: bool,
    pub status: SaleStatus,
    pub items: Vec<SaleItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn total_discount(&self) -> Money {
        Money::from_cents(self.total_discount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
