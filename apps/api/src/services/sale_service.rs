//! # Sale Workflows
//!
//! ## Update (reconciliation)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PUT /api/sales/{id}  { products: [{product_id, quantity}, ...] }       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate list ─► load sale ─► get_by_ids(distinct ids)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sale.reconcile(targets, products)     pure, all-or-nothing             │
//! │       │  Added / Updated / Removed + events                             │
//! │       ▼                                                                 │
//! │  sales().apply_changes(sale, changes)  one transaction                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bus.publish_all(events)               only after commit                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;

use storefront_core::reconcile::{distinct_product_ids, missing_products};
use storefront_core::validation::{
    parse_order, validate_id, validate_product_quantities, DateRange, PageRequest,
};
use storefront_core::{
    CoreError, Customer, Product, ProductQuantity, Sale, SaleEvent, SaleItem, SaleStatus,
    SalesSummary,
};
use storefront_db::repository::sale::SALE_SORT_COLUMNS;
use storefront_db::{Database, SaleFilter};

use crate::dto::{
    CreateSaleRequest, Paginated, SaleListQuery, SaleSummaryRow, SaleUpdateView, SaleView,
    UpdateSaleRequest,
};
use crate::error::ApiResult;
use crate::notifications::NotificationBus;

const DEFAULT_ORDER: &str = "id desc";

#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    bus: NotificationBus,
}

impl SaleService {
    pub fn new(db: Database, bus: NotificationBus) -> Self {
        SaleService { db, bus }
    }

    // =========================================================================
    // Create / Read
    // =========================================================================

    /// Creates a sale with its initial lines.
    ///
    /// A product listed twice keeps the last quantity given.
    pub async fn create(&self, request: CreateSaleRequest) -> ApiResult<SaleView> {
        validate_id("customer_id", &request.customer_id)?;
        validate_product_quantities(&request.products, false)?;
        let mut sale = Sale::open(&request.customer_id, &request.branch)?;

        let customer = self.customer(&request.customer_id).await?;
        let products = self.resolve_products(&request.products).await?;
        let catalog: HashMap<&str, &Product> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();

        for entry in &request.products {
            let product = catalog
                .get(entry.product_id.as_str())
                .ok_or_else(|| CoreError::ProductNotFound(entry.product_id.clone()))?;
            sale.add_item(SaleItem::for_product(&sale.id, product, entry.quantity))?;
        }

        self.db.sales().insert_with_items(&sale).await?;

        info!(
            id = %sale.id,
            items = sale.items.len(),
            total = %sale.total_amount(),
            "Sale created"
        );
        self.bus.publish(SaleEvent::created(
            &sale.id,
            &sale.customer_id,
            sale.total_amount(),
        ));

        Ok(SaleView::build(&sale, customer.name)?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<SaleView> {
        let sale = self.load(id).await?;
        let customer = self.customer(&sale.customer_id).await?;
        Ok(SaleView::build(&sale, customer.name)?)
    }

    pub async fn list(&self, query: &SaleListQuery) -> ApiResult<Paginated<SaleSummaryRow>> {
        let page = PageRequest::parse(query.page, query.size)?;
        let order = parse_order(query.order.as_deref(), SALE_SORT_COLUMNS, DEFAULT_ORDER)?;
        let filter = filter_from(query)?;

        let result = self.db.sales().list(&filter, page, &order).await?;
        let rows = result
            .items
            .into_iter()
            .map(|listing| SaleSummaryRow::build(listing.sale, listing.customer_name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated::new(rows, result.total, page))
    }

    /// Aggregates over every sale matching the filters (paging ignored).
    pub async fn summary(&self, query: &SaleListQuery) -> ApiResult<SalesSummary> {
        let filter = filter_from(query)?;
        let sales = self.db.sales().list_headers(&filter).await?;
        Ok(SalesSummary::from_sales(&sales)?)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Reconciles the sale against a target product list.
    pub async fn update(&self, id: &str, request: UpdateSaleRequest) -> ApiResult<SaleUpdateView> {
        validate_product_quantities(&request.products, true)?;

        let mut sale = self.load(id).await?;
        let customer = self.customer(&sale.customer_id).await?;
        let products = self
            .db
            .products()
            .get_by_ids(&distinct_product_ids(&request.products))
            .await?;

        let result = sale.reconcile(&request.products, &products)?;
        self.db.sales().apply_changes(&sale, &result.changes).await?;

        info!(
            id = %sale.id,
            added = result.count("added"),
            updated = result.count("updated"),
            removed = result.count("removed"),
            total = %sale.total_amount(),
            "Sale updated"
        );
        let view = SaleUpdateView {
            items_added: result.count("added"),
            items_updated: result.count("updated"),
            items_removed: result.count("removed"),
            sale: SaleView::build(&sale, customer.name)?,
        };
        self.bus.publish_all(result.events);

        Ok(view)
    }

    pub async fn close(&self, id: &str) -> ApiResult<SaleView> {
        let mut sale = self.load(id).await?;
        sale.close()?;
        self.db.sales().save(&sale).await?;

        let customer = self.db.customers().get_by_id(&sale.customer_id).await?;

        info!(id = %sale.id, total = %sale.total_amount(), "Sale closed");
        self.bus.publish(SaleEvent::closed(
            &sale.id,
            sale.total_amount(),
            customer.as_ref().map(|c| c.email.clone()),
        ));

        let name = customer.map(|c| c.name).unwrap_or_default();
        Ok(SaleView::build(&sale, name)?)
    }

    /// Cancels the sale. Cancelling an already cancelled sale changes nothing
    /// and publishes nothing.
    pub async fn cancel(&self, id: &str) -> ApiResult<SaleView> {
        let mut sale = self.load(id).await?;

        if sale.status != SaleStatus::Cancelled {
            sale.cancel();
            self.db.sales().save(&sale).await?;

            info!(id = %sale.id, "Sale cancelled");
            self.bus.publish(SaleEvent::cancelled(&sale.id));
        }

        let customer = self.customer(&sale.customer_id).await?;
        Ok(SaleView::build(&sale, customer.name)?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load(&self, id: &str) -> ApiResult<Sale> {
        validate_id("id", id)?;

        let sale = self
            .db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        Ok(sale)
    }

    async fn customer(&self, id: &str) -> ApiResult<Customer> {
        let customer = self
            .db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))?;
        Ok(customer)
    }

    /// Loads every requested product or fails listing the missing ids.
    async fn resolve_products(&self, entries: &[ProductQuantity]) -> ApiResult<Vec<Product>> {
        let ids = distinct_product_ids(entries);
        let products = self.db.products().get_by_ids(&ids).await?;

        let missing = missing_products(&ids, &products);
        if !missing.is_empty() {
            return Err(CoreError::ProductsNotFound(missing).into());
        }
        Ok(products)
    }
}

fn filter_from(query: &SaleListQuery) -> ApiResult<SaleFilter> {
    let non_blank = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let status = match non_blank(&query.status) {
        Some(s) => Some(SaleStatus::from_str(&s)?),
        None => None,
    };

    let customer_id = non_blank(&query.customer_id);
    if let Some(id) = &customer_id {
        validate_id("customer_id", id)?;
    }

    let range = DateRange::parse(query.from.as_deref(), query.to.as_deref())?;

    Ok(SaleFilter {
        branch: non_blank(&query.branch),
        status,
        customer_id,
        from: range.from,
        to: range.to,
    })
}
