//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Paged listing with whitelisted ordering
//! - Batch lookup used to resolve sale items
//! - Availability toggles

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use storefront_core::validation::{OrderBy, PageRequest};
use storefront_core::{Product, Rating};

use super::{push_order_by, Page};
use crate::error::{DbError, DbResult};

/// Sort names accepted by [`ProductRepository::list`].
pub const PRODUCT_SORT_COLUMNS: &[&str] = &["id", "title", "price", "category", "rating", "created_at"];

const ORDER_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("price", "price_cents"),
    ("category", "category"),
    ("rating", "rating_rate"),
    ("created_at", "created_at"),
];

const SELECT_PRODUCT: &str = r#"
    SELECT id, title, description, price_cents, category, image,
           rating_rate, rating_count, is_available, created_at, updated_at
    FROM products
"#;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    title: String,
    description: String,
    price_cents: i64,
    category: String,
    image: String,
    rating_rate: f64,
    rating_count: i64,
    is_available: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            title: row.title,
            description: row.description,
            price_cents: row.price_cents,
            category: row.category,
            image: row.image,
            rating: Rating {
                rate: row.rating_rate,
                count: row.rating_count,
            },
            is_available: row.is_available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// repo.insert(&product).await?;
/// let found = repo.get_by_ids(&ids).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, title = %product.title, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, description, price_cents, category, image,
                rating_rate, rating_count, is_available, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.rating.rate)
        .bind(product.rating.count)
        .bind(product.is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Loads every product whose id is in `ids`, in one query.
    ///
    /// Returns only the products that exist; the caller diffs against the
    /// request to find missing ids.
    pub async fn get_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Loading products by id");

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(SELECT_PRODUCT);
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists one page of products in the requested order.
    pub async fn list(&self, page: PageRequest, order: &[OrderBy]) -> DbResult<Page<Product>> {
        debug!(page = page.page, size = page.size, "Listing products");

        let total = self.count().await?;

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(SELECT_PRODUCT);
        push_order_by(&mut builder, order, ORDER_COLUMNS)?;
        builder.push(" LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Product::from).collect(),
            total,
        })
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Writes every editable field of `product`.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                title = ?, description = ?, price_cents = ?, category = ?, image = ?,
                rating_rate = ?, rating_count = ?, is_available = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.rating.rate)
        .bind(product.rating.count)
        .bind(product.is_available)
        .bind(product.updated_at)
        .bind(&product.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }
        Ok(())
    }

    /// Sets the availability flag and bumps `updated_at`.
    pub async fn set_availability(&self, id: &str, available: bool) -> DbResult<()> {
        debug!(id = %id, available, "Setting product availability");

        let result = sqlx::query("UPDATE products SET is_available = ?, updated_at = ? WHERE id = ?")
            .bind(available)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Hard-deletes a product.
    ///
    /// Fails with [`DbError::ForeignKeyViolation`] while any sale line
    /// references it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
