//! Request and response shapes for the HTTP layer.
//!
//! Domain types serialize directly where they already match the wire format
//! (`Product`, `Customer`, `SalesSummary`). Sales get view types that add the
//! customer name and per-line pricing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::validation::PageRequest;
use storefront_core::{CoreResult, ProductQuantity, Sale, SaleItem, SaleStatus};

// =============================================================================
// Envelope
// =============================================================================

/// Success envelope: `{ "success": true, "message": ..., "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total_items: i64, page: PageRequest) -> Self {
        Paginated {
            items,
            total_items,
            current_page: page.page,
            page_size: page.size,
            total_pages: page.total_pages(total_items),
        }
    }
}

// =============================================================================
// Query Parameters
// =============================================================================

/// `?_page=1&_size=10&_order=price desc`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "_page")]
    pub page: Option<u32>,
    #[serde(rename = "_size")]
    pub size: Option<u32>,
    #[serde(rename = "_order")]
    pub order: Option<String>,
}

/// Sale listing adds optional filters:
/// `branch`, `status`, `customer_id`, and a `from`/`to` date window.
#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    #[serde(rename = "_page")]
    pub page: Option<u32>,
    #[serde(rename = "_size")]
    pub size: Option<u32>,
    #[serde(rename = "_order")]
    pub order: Option<String>,
    pub branch: Option<String>,
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: String,
    pub branch: String,
    pub products: Vec<ProductQuantity>,
}

/// Target product list for a sale. Quantity 0 removes the product.
#[derive(Debug, Deserialize)]
pub struct UpdateSaleRequest {
    pub products: Vec<ProductQuantity>,
}

// =============================================================================
// Sale Views
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SaleItemView {
    pub id: String,
    pub product_id: String,
    pub product_title: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub gross_amount_cents: i64,
    pub discount_rate_bps: u32,
    pub discount_cents: i64,
    /// Net line total.
    pub total_amount_cents: i64,
}

impl SaleItemView {
    pub fn from_item(item: &SaleItem) -> CoreResult<Self> {
        let pricing = item.pricing()?;
        Ok(SaleItemView {
            id: item.id.clone(),
            product_id: item.product_id.clone(),
            product_title: item.product_title.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            gross_amount_cents: pricing.gross.cents(),
            discount_rate_bps: pricing.rate.bps(),
            discount_cents: pricing.discount.cents(),
            total_amount_cents: pricing.total.cents(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    pub id: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: String,
    pub customer_name: String,
    pub branch: String,
    pub status: SaleStatus,
    pub is_cancelled: bool,
    pub total_amount_cents: i64,
    pub total_discount_cents: i64,
    pub items: Vec<SaleItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SaleView {
    pub fn build(sale: &Sale, customer_name: impl Into<String>) -> CoreResult<Self> {
        let items = sale
            .items
            .iter()
            .map(SaleItemView::from_item)
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(SaleView {
            id: sale.id.clone(),
            sale_date: sale.sale_date,
            customer_id: sale.customer_id.clone(),
            customer_name: customer_name.into(),
            branch: sale.branch.clone(),
            status: sale.status,
            is_cancelled: sale.is_cancelled,
            total_amount_cents: sale.total_amount_cents,
            total_discount_cents: sale.total_discount_cents,
            items,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
        })
    }
}

/// Row of the sale listing.
#[derive(Debug, Clone, Serialize)]
pub struct SaleSummaryRow {
    pub id: String,
    pub sale_date: DateTime<Utc>,
    pub customer_name: String,
    pub branch: String,
    pub status: SaleStatus,
    pub is_cancelled: bool,
    pub total_amount_cents: i64,
    pub total_discount_cents: i64,
    pub items: Vec<SaleItemView>,
}

impl SaleSummaryRow {
    pub fn build(sale: Sale, customer_name: String) -> CoreResult<Self> {
        let items = sale
            .items
            .iter()
            .map(SaleItemView::from_item)
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(SaleSummaryRow {
            id: sale.id,
            sale_date: sale.sale_date,
            customer_name,
            branch: sale.branch,
            status: sale.status,
            is_cancelled: sale.is_cancelled,
            total_amount_cents: sale.total_amount_cents,
            total_discount_cents: sale.total_discount_cents,
            items,
        })
    }
}

/// Result of a sale update: the sale plus what changed.
#[derive(Debug, Clone, Serialize)]
pub struct SaleUpdateView {
    #[serde(flatten)]
    pub sale: SaleView,
    pub items_added: usize,
    pub items_updated: usize,
    pub items_removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{Money, SaleItem};

    #[test]
    fn test_item_view_carries_net_total() {
        let item = SaleItem::new("sale-1", "product-1", "Widget", 4, Money::from_cents(10_000));
        let view = SaleItemView::from_item(&item).unwrap();
        assert_eq!(view.gross_amount_cents, 40_000);
        assert_eq!(view.discount_rate_bps, 1000);
        assert_eq!(view.discount_cents, 4_000);
        assert_eq!(view.total_amount_cents, 36_000);
    }

    #[test]
    fn test_list_query_names() {
        let q: ListQuery = serde_json::from_value(serde_json::json!({
            "_page": 2, "_size": 5, "_order": "title desc"
        }))
        .unwrap();
        assert_eq!(q.page, Some(2));
        assert_eq!(q.size, Some(5));
        assert_eq!(q.order.as_deref(), Some("title desc"));
    }

    #[test]
    fn test_paginated_total_pages() {
        let page = Paginated::new(vec![1, 2], 11, PageRequest { page: 2, size: 5 });
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
    }
}
