//! # Validation Module
//!
//! Input validation rules for products, customers, sales and listing queries.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  └── Type validation (JSON / query deserialization)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Field rules (lengths, ranges, required ids)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Sale aggregate                                               │
//! │  └── State rules (closed sale, quantity cap)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite                                                       │
//! │  └── NOT NULL / CHECK / foreign keys / partial unique index            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::reconcile::ProductQuantity;
use crate::types::{ProductInput, SaleItem};
use crate::{DEFAULT_PAGE_SIZE, MAX_BRANCH_LENGTH, MAX_PAGE_SIZE, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Checks that a trimmed string's length is within `min..=max`.
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.trim().chars().count();

    if len == 0 && min > 0 {
        return Err(ValidationError::required(field));
    }
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates that `value` is a UUID.
///
/// ```rust
/// use storefront_core::validation::validate_id;
///
/// assert!(validate_id("product_id", "6f1d3f2e-0c1b-4a4e-9a52-1f3c2d4b5a6e").is_ok());
/// assert!(validate_id("product_id", "").is_err());
/// assert!(validate_id("product_id", "abc").is_err());
/// ```
pub fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

/// Unit price in cents: positive and at most [`MAX_PRICE_CENTS`].
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a branch name: required, at most 50 characters.
pub fn validate_branch(branch: &str) -> ValidationResult<()> {
    validate_length("branch", branch, 1, MAX_BRANCH_LENGTH)
}

/// Minimal email shape check: `local@domain.tld`.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected local@domain".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Product rules.
///
/// | Field       | Rule          |
/// |-------------|---------------|
/// | title       | 3–50 chars    |
/// | description | 3–500 chars   |
/// | category    | 3–50 chars    |
/// | image       | 3–500 chars   |
/// | price       | 1–10,000,000.00 |
/// | rating.rate | 0–5           |
/// | rating.count| ≥ 0           |
pub fn validate_product(input: &ProductInput) -> ValidationResult<()> {
    validate_length("title", &input.title, 3, 50)?;
    validate_length("description", &input.description, 3, 500)?;
    validate_length("category", &input.category, 3, 50)?;
    validate_length("image", &input.image, 3, 500)?;

    validate_price("price", input.price_cents)?;

    let rate = input.rating.rate;
    if !rate.is_finite() || !(0.0..=5.0).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "rating.rate".to_string(),
            min: 0,
            max: 5,
        });
    }

    if input.rating.count < 0 {
        return Err(ValidationError::OutOfRange {
            field: "rating.count".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Customer rules: name 3–100 chars, well-formed email.
pub fn validate_customer(name: &str, email: &str) -> ValidationResult<()> {
    validate_length("name", name, 3, 100)?;
    validate_email(email)
}

/// Line item rules.
///
/// The quantity cap is not checked here: exceeding it is a discount-rule
/// failure ([`crate::CoreError::QuantityTooLarge`]), not malformed input.
pub fn validate_sale_item(item: &SaleItem) -> ValidationResult<()> {
    if item.product_id.trim().is_empty() {
        return Err(ValidationError::required("product_id"));
    }
    if item.sale_id.trim().is_empty() {
        return Err(ValidationError::required("sale_id"));
    }
    if item.quantity <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }
    validate_price("unit_price", item.unit_price_cents)?;
    Ok(())
}

/// Product/quantity list rules.
///
/// - the list must not be empty
/// - every product id must be a UUID
/// - quantities must be positive, or zero when `allow_zero` (zero means
///   "remove" during a sale update)
pub fn validate_product_quantities(
    entries: &[ProductQuantity],
    allow_zero: bool,
) -> ValidationResult<()> {
    if entries.is_empty() {
        return Err(ValidationError::required("products"));
    }

    for entry in entries {
        validate_id("product_id", &entry.product_id)?;

        let min = if allow_zero { 0 } else { 1 };
        if entry.quantity < min {
            return Err(if allow_zero {
                ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 0,
                    max: crate::MAX_ITEM_QUANTITY,
                }
            } else {
                ValidationError::must_be_positive("quantity")
            });
        }
    }

    Ok(())
}

// =============================================================================
// Listing Parameters
// =============================================================================

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Applies defaults and bounds to optional `_page`/`_size` values.
    pub fn parse(page: Option<u32>, size: Option<u32>) -> ValidationResult<Self> {
        let page = page.unwrap_or(1);
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(ValidationError::must_be_positive("_page"));
        }
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "_size".to_string(),
                min: 1,
                max: MAX_PAGE_SIZE as i64,
            });
        }

        Ok(PageRequest { page, size })
    }

    /// Rows to skip: `(page - 1) * size`.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }

    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self, total: i64) -> i64 {
        let size = self.size as i64;
        (total + size - 1) / size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A single `column direction` term of an `_order` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// Parses `"price desc, title asc"` against a column whitelist.
///
/// Columns are matched case-insensitively and returned in their whitelisted
/// spelling, so the result can be spliced into SQL. Empty input yields
/// `default`.
///
/// ```rust
/// use storefront_core::validation::{parse_order, SortDirection};
///
/// let order = parse_order(Some("price desc, title"), &["title", "price"], "title asc").unwrap();
/// assert_eq!(order[0].column, "price");
/// assert_eq!(order[0].direction, SortDirection::Desc);
/// assert_eq!(order[1].direction, SortDirection::Asc);
/// assert!(parse_order(Some("password"), &["title"], "title").is_err());
/// ```
pub fn parse_order(
    order: Option<&str>,
    allowed: &[&str],
    default: &str,
) -> ValidationResult<Vec<OrderBy>> {
    let raw = match order.map(str::trim) {
        Some(o) if !o.is_empty() => o,
        _ => default,
    };

    let not_allowed = || ValidationError::NotAllowed {
        field: "_order".to_string(),
        allowed: allowed.iter().map(|c| c.to_string()).collect(),
    };

    let mut terms = Vec::new();
    for term in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let mut parts = term.split_whitespace();
        let name = parts.next().ok_or_else(not_allowed)?;
        let column = allowed
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(not_allowed)?;

        let direction = match parts.next().map(|d| d.to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(d) => {
                return Err(ValidationError::InvalidFormat {
                    field: "_order".to_string(),
                    reason: format!("unknown direction '{}'", d),
                })
            }
        };

        if parts.next().is_some() {
            return Err(ValidationError::InvalidFormat {
                field: "_order".to_string(),
                reason: format!("unexpected token in '{}'", term),
            });
        }

        terms.push(OrderBy {
            column: column.to_string(),
            direction,
        });
    }

    if terms.is_empty() {
        return Err(not_allowed());
    }
    Ok(terms)
}

// =============================================================================
// Date Ranges
// =============================================================================

/// Half-open `[from, to)` window over sale dates.
///
/// Each bound is an RFC 3339 timestamp (`2026-03-05T12:00:00Z`) or a bare
/// date (`2026-03-05`). A bare `from` starts at that day's midnight UTC. A
/// bare `to` ends at the following midnight, so `from=2026-03-05&to=2026-03-05`
/// covers the whole day.
///
/// ```rust
/// use storefront_core::validation::DateRange;
///
/// let range = DateRange::parse(Some("2026-03-05"), Some("2026-03-05")).unwrap();
/// assert_eq!(range.from.unwrap().to_rfc3339(), "2026-03-05T00:00:00+00:00");
/// assert_eq!(range.to.unwrap().to_rfc3339(), "2026-03-06T00:00:00+00:00");
/// assert!(DateRange::parse(Some("2026-03-06"), Some("2026-03-05")).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Parses optional bounds. Blank values count as absent.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> ValidationResult<Self> {
        let from = non_blank(from)
            .map(|v| parse_bound("from", v, false))
            .transpose()?;
        let to = non_blank(to)
            .map(|v| parse_bound("to", v, true))
            .transpose()?;

        if let (Some(start), Some(end)) = (from, to) {
            if start > end {
                return Err(ValidationError::InvalidFormat {
                    field: "from".to_string(),
                    reason: "must not be later than 'to'".to_string(),
                });
            }
        }

        Ok(DateRange { from, to })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(field: &str, value: &str, exclusive_end: bool) -> ValidationResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("'{}' is not a YYYY-MM-DD date or RFC 3339 timestamp", value),
    };

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let day = if exclusive_end {
        date.succ_opt().ok_or_else(invalid)?
    } else {
        date
    };
    let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    Ok(midnight.and_utc())
}

// =============================================================================
// Unit Tests
// =============================================================================
