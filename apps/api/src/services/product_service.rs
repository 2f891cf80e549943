//! Product catalog workflows.

use tracing::info;

use storefront_core::validation::{parse_order, validate_id, validate_product, PageRequest};
use storefront_core::{CoreError, Product, ProductInput};
use storefront_db::repository::product::PRODUCT_SORT_COLUMNS;
use storefront_db::Database;

use crate::dto::{ListQuery, Paginated};
use crate::error::ApiResult;

const DEFAULT_ORDER: &str = "title asc";

#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    pub async fn create(&self, input: ProductInput) -> ApiResult<Product> {
        validate_product(&input)?;

        let product = Product::new(input);
        self.db.products().insert(&product).await?;

        info!(id = %product.id, title = %product.title, "Product created");
        Ok(product)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Product> {
        validate_id("id", id)?;

        let product = self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        Ok(product)
    }

    pub async fn list(&self, query: &ListQuery) -> ApiResult<Paginated<Product>> {
        let page = PageRequest::parse(query.page, query.size)?;
        let order = parse_order(query.order.as_deref(), PRODUCT_SORT_COLUMNS, DEFAULT_ORDER)?;

        let result = self.db.products().list(page, &order).await?;
        Ok(Paginated::new(result.items, result.total, page))
    }

    /// Replaces every editable field.
    pub async fn update(&self, id: &str, input: ProductInput) -> ApiResult<Product> {
        validate_product(&input)?;

        let mut product = self.get(id).await?;
        product.apply(input);
        self.db.products().update(&product).await?;

        info!(id = %product.id, "Product updated");
        Ok(product)
    }

    /// Hard delete. A product still on any sale line is a conflict.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        validate_id("id", id)?;

        self.db.products().delete(id).await?;

        info!(id = %id, "Product deleted");
        Ok(())
    }

    pub async fn set_availability(&self, id: &str, available: bool) -> ApiResult<Product> {
        let mut product = self.get(id).await?;
        if available {
            product.activate();
        } else {
            product.deactivate();
        }
        self.db.products().update(&product).await?;

        info!(id = %product.id, available, "Product availability changed");
        Ok(product)
    }
}
