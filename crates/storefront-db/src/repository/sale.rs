//! # Sale Repository
//!
//! Database operations for sales and their lines.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create      insert_with_items   BEGIN; sale; items...; COMMIT          │
//! │  update      apply_changes       BEGIN; Added/Updated/Removed...;       │
//! │                                         sale header; COMMIT             │
//! │  close       save                header only                            │
//! │  cancel      save                header only                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Removed lines are soft-deleted: `is_cancelled = 1`, the row stays. Reads
//! only return active lines, in insertion order. Listings load the lines of
//! a whole page with one `sale_id IN (...)` query.
//!
//! A transaction that is dropped before `commit()` rolls back, so an error
//! returned through `?` part way through a change set leaves the sale as it
//! was.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use storefront_core::validation::{OrderBy, PageRequest};
use storefront_core::{ItemChange, Sale, SaleItem, SaleStatus};

use super::{push_order_by, Page};
use crate::error::{DbError, DbResult};

/// Sort names accepted by [`SaleRepository::list`].
pub const SALE_SORT_COLUMNS: &[&str] = &[
    "id",
    "sale_date",
    "branch",
    "total_amount",
    "status",
    "created_at",
];

const ORDER_COLUMNS: &[(&str, &str)] = &[
    ("id", "s.id"),
    ("sale_date", "s.sale_date"),
    ("branch", "s.branch"),
    ("total_amount", "s.total_amount_cents"),
    ("status", "s.status"),
    ("created_at", "s.created_at"),
];

const SELECT_LISTING: &str = r#"
    SELECT s.id, s.sale_date, s.customer_id, s.branch, s.total_amount_cents,
           s.total_discount_cents, s.is_cancelled, s.status, s.created_at, s.updated_at,
           c.name AS customer_name
    FROM sales s
    INNER JOIN customers c ON c.id = s.customer_id
"#;

const SELECT_ITEMS: &str = r#"
    SELECT id, sale_id, product_id, product_title, quantity,
           unit_price_cents, total_amount_cents, is_cancelled
    FROM sale_items
"#;

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    sale_date: DateTime<Utc>,
    customer_id: String,
    branch: String,
    total_amount_cents: i64,
    total_discount_cents: i64,
    is_cancelled: bool,
    status: SaleStatus,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> Sale {
        Sale {
            id: self.id,
            sale_date: self.sale_date,
            customer_id: self.customer_id,
            branch: self.branch,
            total_amount_cents: self.total_amount_cents,
            total_discount_cents: self.total_discount_cents,
            is_cancelled: self.is_cancelled,
            status: self.status,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleListingRow {
    #[sqlx(flatten)]
    sale: SaleRow,
    customer_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    product_id: String,
    product_title: String,
    quantity: i64,
    unit_price_cents: i64,
    total_amount_cents: i64,
    is_cancelled: bool,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            product_title: row.product_title,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            total_amount_cents: row.total_amount_cents,
            is_cancelled: row.is_cancelled,
        }
    }
}

// =============================================================================
// Public Types
// =============================================================================

/// Optional filters for sale listings and summaries.
///
/// | Field         | Matches                                  |
/// |---------------|------------------------------------------|
/// | `branch`      | exact name, ignoring ASCII case          |
/// | `status`      | exact status                             |
/// | `customer_id` | exact id                                 |
/// | `from`        | `sale_date >= from`                      |
/// | `to`          | `sale_date < to`                         |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    pub branch: Option<String>,
    pub status: Option<SaleStatus>,
    pub customer_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SaleFilter {
    fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        let mut keyword = " WHERE ";
        if let Some(branch) = &self.branch {
            push_clause(builder, &mut keyword, "s.branch = ");
            builder.push_bind(branch.clone());
            builder.push(" COLLATE NOCASE");
        }
        if let Some(status) = self.status {
            push_clause(builder, &mut keyword, "s.status = ");
            builder.push_bind(status);
        }
        if let Some(customer_id) = &self.customer_id {
            push_clause(builder, &mut keyword, "s.customer_id = ");
            builder.push_bind(customer_id.clone());
        }
        // Stored dates carry an offset and nanoseconds, so compare as julian
        // day numbers rather than as text.
        if let Some(from) = self.from {
            push_clause(builder, &mut keyword, "julianday(s.sale_date) >= julianday(");
            builder.push_bind(from);
            builder.push(")");
        }
        if let Some(to) = self.to {
            push_clause(builder, &mut keyword, "julianday(s.sale_date) < julianday(");
            builder.push_bind(to);
            builder.push(")");
        }
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Sqlite>, keyword: &mut &'static str, sql: &str) {
    builder.push(*keyword);
    builder.push(sql);
    *keyword = " AND ";
}

/// A sale with its active items and its customer's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleListing {
    pub sale: Sale,
    pub customer_name: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = SaleRepository::new(pool);
/// repo.insert_with_items(&sale).await?;
/// repo.apply_changes(&sale, &reconciliation.changes).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its active items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, sale_date, customer_id, branch, total_amount_cents,
                   total_discount_cents, is_cancelled, status, created_at, updated_at
            FROM sales
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.get_items(id).await?;
                Ok(Some(row.into_sale(items)))
            }
            None => Ok(None),
        }
    }

    /// Active items of a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!("{SELECT_ITEMS} WHERE sale_id = ? AND is_cancelled = 0 ORDER BY rowid");
        let rows = sqlx::query_as::<_, SaleItemRow>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SaleItem::from).collect())
    }

    /// Active items of several sales in one query, grouped by sale id.
    ///
    /// Sales without active items have no entry.
    pub async fn get_items_for(
        &self,
        sale_ids: &[String],
    ) -> DbResult<HashMap<String, Vec<SaleItem>>> {
        if sale_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(SELECT_ITEMS);
        builder.push(" WHERE is_cancelled = 0 AND sale_id IN (");
        let mut separated = builder.separated(", ");
        for id in sale_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");
        builder.push(" ORDER BY rowid");

        let rows = builder
            .build_query_as::<SaleItemRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.sale_id.clone())
                .or_default()
                .push(SaleItem::from(row));
        }
        Ok(grouped)
    }

    /// Inserts a sale and all its items in one transaction.
    pub async fn insert_with_items(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, items = sale.items.len(), "Inserting sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_date, customer_id, branch, total_amount_cents,
                total_discount_cents, is_cancelled, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.sale_date)
        .bind(&sale.customer_id)
        .bind(&sale.branch)
        .bind(sale.total_amount_cents)
        .bind(sale.total_discount_cents)
        .bind(sale.is_cancelled)
        .bind(sale.status)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &sale.items {
            insert_item(&mut *tx, item).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Writes the sale header: totals, status, cancellation flag, `updated_at`.
    pub async fn save(&self, sale: &Sale) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        save_header(&mut *conn, sale).await
    }

    /// Inserts new lines in one transaction.
    pub async fn add_items(&self, items: &[SaleItem]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        for item in items {
            insert_item(&mut *tx, item).await?;
        }
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Overwrites quantity and gross of existing lines in one transaction.
    pub async fn update_items(&self, items: &[SaleItem]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        for item in items {
            update_item(&mut *tx, item).await?;
        }
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Persists a reconciled sale: every line change in order, then the header,
    /// all in one transaction.
    pub async fn apply_changes(&self, sale: &Sale, changes: &[ItemChange]) -> DbResult<()> {
        debug!(id = %sale.id, changes = changes.len(), "Applying sale changes");

        let mut tx = self.pool.begin().await?;

        for change in changes {
            match change {
                ItemChange::Added(item) => insert_item(&mut *tx, item).await?,
                ItemChange::Updated(item) => update_item(&mut *tx, item).await?,
                ItemChange::Removed(item) => cancel_item(&mut *tx, item).await?,
            }
        }
        save_header(&mut *tx, sale).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Lists one page of sales with their active items and customer names.
    pub async fn list(
        &self,
        filter: &SaleFilter,
        page: PageRequest,
        order: &[OrderBy],
    ) -> DbResult<Page<SaleListing>> {
        debug!(?filter, page = page.page, size = page.size, "Listing sales");

        let total = self.count(filter).await?;

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(SELECT_LISTING);
        filter.push_where(&mut builder);
        push_order_by(&mut builder, order, ORDER_COLUMNS)?;
        builder.push(" LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder
            .build_query_as::<SaleListingRow>()
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<String> = rows.iter().map(|row| row.sale.id.clone()).collect();
        let mut lines = self.get_items_for(&ids).await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let sale_items = lines.remove(&row.sale.id).unwrap_or_default();
                SaleListing {
                    sale: row.sale.into_sale(sale_items),
                    customer_name: row.customer_name,
                }
            })
            .collect();

        Ok(Page { items, total })
    }

    /// Every sale header matching `filter`, for aggregation.
    pub async fn list_headers(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r#"
            SELECT s.id, s.sale_date, s.customer_id, s.branch, s.total_amount_cents,
                   s.total_discount_cents, s.is_cancelled, s.status, s.created_at, s.updated_at
            FROM sales s
            "#,
        );
        filter.push_where(&mut builder);

        let rows = builder
            .build_query_as::<SaleRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_sale(Vec::new())).collect())
    }

    pub async fn count(&self, filter: &SaleFilter) -> DbResult<i64> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM sales s");
        filter.push_where(&mut builder);

        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Statement Helpers
// =============================================================================
// Shared by pool-level calls and transactions.

async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, product_title, quantity,
            unit_price_cents, total_amount_cents, is_cancelled, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_title)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.total_amount_cents)
    .bind(item.is_cancelled)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

async fn update_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sale_items
        SET quantity = ?, total_amount_cents = ?, updated_at = ?
        WHERE id = ? AND is_cancelled = 0
        "#,
    )
    .bind(item.quantity)
    .bind(item.total_amount_cents)
    .bind(Utc::now())
    .bind(&item.id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("SaleItem", &item.id));
    }
    Ok(())
}

async fn cancel_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE sale_items SET is_cancelled = 1, updated_at = ? WHERE id = ? AND is_cancelled = 0",
    )
    .bind(Utc::now())
    .bind(&item.id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("SaleItem", &item.id));
    }
    Ok(())
}

async fn save_header(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, status = %sale.status, "Saving sale header");

    let result = sqlx::query(
        r#"
        UPDATE sales SET
            branch = ?, total_amount_cents = ?, total_discount_cents = ?,
            is_cancelled = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&sale.branch)
    .bind(sale.total_amount_cents)
    .bind(sale.total_discount_cents)
    .bind(sale.is_cancelled)
    .bind(sale.status)
    .bind(sale.updated_at)
    .bind(&sale.id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", &sale.id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use storefront_core::validation::SortDirection;
    use storefront_core::{Customer, Product, ProductInput, ProductQuantity, Rating, SaleEvent};

    struct Fixture {
        db: Database,
        customer: Customer,
        alpha: Product,
        bravo: Product,
    }

    fn product(title: &str, price_cents: i64) -> Product {
        Product::new(ProductInput {
            title: title.to_string(),
            description: "A test product".to_string(),
            price_cents,
            category: "testing".to_string(),
            image: "img.png".to_string(),
            rating: Rating::default(),
        })
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = Customer::new("Grace Hopper", "grace@example.com");
        db.customers().insert(&customer).await.unwrap();

        let alpha = product("Alpha", 10_000);
        let bravo = product("Bravo", 2_500);
        db.products().insert(&alpha).await.unwrap();
        db.products().insert(&bravo).await.unwrap();

        Fixture {
            db,
            customer,
            alpha,
            bravo,
        }
    }

    fn sale_for(f: &Fixture, branch: &str, qty: i64) -> Sale {
        let mut sale = Sale::open(&f.customer.id, branch).unwrap();
        let item = SaleItem::for_product(&sale.id, &f.alpha, qty);
        sale.add_item(item).unwrap();
        sale
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let f = fixture().await;
        let sale = sale_for(&f, "Downtown", 4);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        let loaded = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SaleStatus::Open);
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.total_amount_cents, 36_000);
        assert_eq!(loaded.total_discount_cents, 4_000);

        assert!(f.db.sales().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_for_unknown_customer_is_fk_violation() {
        let f = fixture().await;
        let mut sale = Sale::open("no-such-customer", "Downtown").unwrap();
        sale.add_item(SaleItem::for_product(&sale.id, &f.alpha, 1))
            .unwrap();

        assert!(matches!(
            f.db.sales().insert_with_items(&sale).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
        assert!(f.db.sales().get_by_id(&sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_changes_soft_deletes_removed_lines() {
        let f = fixture().await;
        let mut sale = sale_for(&f, "Downtown", 5);
        f.db.sales().insert_with_items(&sale).await.unwrap();
        let removed_id = sale.items[0].id.clone();

        let result = sale
            .reconcile(
                &[
                    ProductQuantity::new(&f.alpha.id, 0),
                    ProductQuantity::new(&f.bravo.id, 3),
                ],
                &[f.alpha.clone(), f.bravo.clone()],
            )
            .unwrap();
        f.db.sales().apply_changes(&sale, &result.changes).await.unwrap();

        let loaded = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].product_id, f.bravo.id);
        assert_eq!(loaded.total_amount_cents, 7_500);

        let cancelled: bool =
            sqlx::query_scalar("SELECT is_cancelled FROM sale_items WHERE id = ?")
                .bind(&removed_id)
                .fetch_one(f.db.pool())
                .await
                .unwrap();
        assert!(cancelled);
    }

    #[tokio::test]
    async fn test_apply_changes_rolls_back_on_failure() {
        let f = fixture().await;
        let sale = sale_for(&f, "Downtown", 2);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        let mut changed = sale.clone();
        changed
            .update_item_quantity(&f.alpha.id, 10)
            .unwrap();
        let ghost = SaleItem::for_product(&sale.id, &f.bravo, 1);
        let changes = vec![
            ItemChange::Updated(changed.items[0].clone()),
            ItemChange::Removed(ghost),
        ];

        assert!(matches!(
            f.db.sales().apply_changes(&changed, &changes).await,
            Err(DbError::NotFound { .. })
        ));

        let loaded = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.items[0].quantity, 2);
        assert_eq!(loaded.total_amount_cents, sale.total_amount_cents);
    }

    #[tokio::test]
    async fn test_save_persists_status() {
        let f = fixture().await;
        let mut sale = sale_for(&f, "Downtown", 1);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        sale.close().unwrap();
        f.db.sales().save(&sale).await.unwrap();

        let loaded = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SaleStatus::Closed);
        assert!(loaded.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_add_and_update_items() {
        let f = fixture().await;
        let mut sale = sale_for(&f, "Downtown", 1);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        let added = sale
            .add_item(SaleItem::for_product(&sale.id, &f.bravo, 2))
            .unwrap();
        f.db.sales().add_items(&[added]).await.unwrap();

        let updated = sale.update_item_quantity(&f.alpha.id, 3).unwrap();
        f.db.sales().update_items(&[updated]).await.unwrap();

        let items = f.db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, f.alpha.id);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[1].product_id, f.bravo.id);
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let f = fixture().await;
        for (branch, qty) in [("North", 1), ("North", 2), ("South", 3)] {
            let sale = sale_for(&f, branch, qty);
            f.db.sales().insert_with_items(&sale).await.unwrap();
        }

        let order = vec![OrderBy {
            column: "total_amount".to_string(),
            direction: SortDirection::Desc,
        }];
        let filter = SaleFilter {
            branch: Some("North".to_string()),
            ..Default::default()
        };
        let page = f
            .db
            .sales()
            .list(&filter, PageRequest { page: 1, size: 1 }, &order)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].sale.total_amount_cents, 20_000);
        assert_eq!(page.items[0].customer_name, "Grace Hopper");

        let closed = SaleFilter {
            status: Some(SaleStatus::Closed),
            ..Default::default()
        };
        assert_eq!(f.db.sales().count(&closed).await.unwrap(), 0);
        assert_eq!(
            f.db.sales().list_headers(&SaleFilter::default()).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_list_matches_branch_ignoring_case() {
        let f = fixture().await;
        for branch in ["North", "South"] {
            let sale = sale_for(&f, branch, 1);
            f.db.sales().insert_with_items(&sale).await.unwrap();
        }

        for name in ["north", "NORTH", "North"] {
            let filter = SaleFilter {
                branch: Some(name.to_string()),
                ..Default::default()
            };
            let page = f
                .db
                .sales()
                .list(&filter, PageRequest { page: 1, size: 10 }, &[])
                .await
                .unwrap();
            assert_eq!(page.total, 1, "branch {name}");
            assert_eq!(page.items[0].sale.branch, "North");
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_customer_and_date_range() {
        let f = fixture().await;
        let other = Customer::new("Ada Lovelace", "ada@example.com");
        f.db.customers().insert(&other).await.unwrap();

        let day = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap();
        for (customer_id, d) in [
            (&f.customer.id, 1),
            (&f.customer.id, 5),
            (&other.id, 5),
            (&f.customer.id, 9),
        ] {
            let mut sale = Sale::open(customer_id, "North").unwrap();
            sale.sale_date = day(d);
            sale.add_item(SaleItem::for_product(&sale.id, &f.alpha, 1))
                .unwrap();
            f.db.sales().insert_with_items(&sale).await.unwrap();
        }

        let by_customer = SaleFilter {
            customer_id: Some(f.customer.id.clone()),
            ..Default::default()
        };
        assert_eq!(f.db.sales().count(&by_customer).await.unwrap(), 3);

        // `to` is exclusive: the sale at exactly day 9 noon is out.
        let window = SaleFilter {
            from: Some(day(5)),
            to: Some(day(9)),
            ..Default::default()
        };
        assert_eq!(f.db.sales().count(&window).await.unwrap(), 2);

        let both = SaleFilter {
            customer_id: Some(other.id.clone()),
            ..window.clone()
        };
        let page = f
            .db
            .sales()
            .list(&both, PageRequest { page: 1, size: 10 }, &[])
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].customer_name, "Ada Lovelace");

        let since = SaleFilter {
            from: Some(day(5)),
            ..Default::default()
        };
        assert_eq!(f.db.sales().list_headers(&since).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_rows_carry_active_items() {
        let f = fixture().await;
        let mut first = sale_for(&f, "North", 2);
        first
            .add_item(SaleItem::for_product(&first.id, &f.bravo, 1))
            .unwrap();
        f.db.sales().insert_with_items(&first).await.unwrap();
        let second = sale_for(&f, "South", 1);
        f.db.sales().insert_with_items(&second).await.unwrap();

        let result = first
            .reconcile(&[ProductQuantity::new(&f.alpha.id, 0)], &[f.alpha.clone()])
            .unwrap();
        f.db.sales().apply_changes(&first, &result.changes).await.unwrap();

        let order = vec![OrderBy {
            column: "branch".to_string(),
            direction: SortDirection::Asc,
        }];
        let page = f
            .db
            .sales()
            .list(&SaleFilter::default(), PageRequest { page: 1, size: 10 }, &order)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        let north = &page.items[0].sale;
        assert_eq!(north.items.len(), 1);
        assert_eq!(north.items[0].product_id, f.bravo.id);
        let south = &page.items[1].sale;
        assert_eq!(south.items.len(), 1);
        assert_eq!(south.items[0].product_id, f.alpha.id);

        assert!(f.db.sales().get_items_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_then_update_same_product_in_one_request() {
        let f = fixture().await;
        let mut sale = sale_for(&f, "Downtown", 1);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        let result = sale
            .reconcile(
                &[
                    ProductQuantity::new(&f.bravo.id, 3),
                    ProductQuantity::new(&f.bravo.id, 5),
                ],
                &[f.bravo.clone()],
            )
            .unwrap();
        assert_eq!(result.count("added"), 1);
        assert_eq!(result.count("updated"), 1);
        f.db.sales().apply_changes(&sale, &result.changes).await.unwrap();

        let rows: Vec<(i64, i64, bool)> = sqlx::query_as(
            "SELECT quantity, total_amount_cents, is_cancelled FROM sale_items \
             WHERE sale_id = ? AND product_id = ?",
        )
        .bind(&sale.id)
        .bind(&f.bravo.id)
        .fetch_all(f.db.pool())
        .await
        .unwrap();
        assert_eq!(rows, vec![(5, 12_500, false)]);

        // Alpha 1 × 100.00, Bravo 5 × 25.00 less 10%.
        let loaded = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.total_amount_cents, 21_250);
        assert_eq!(loaded.total_discount_cents, 1_250);
    }

    #[tokio::test]
    async fn test_add_then_remove_same_product_in_one_request() {
        let f = fixture().await;
        let mut sale = sale_for(&f, "Downtown", 1);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        let result = sale
            .reconcile(
                &[
                    ProductQuantity::new(&f.bravo.id, 3),
                    ProductQuantity::new(&f.bravo.id, 0),
                ],
                &[f.bravo.clone()],
            )
            .unwrap();
        assert_eq!(result.count("added"), 1);
        assert_eq!(result.count("removed"), 1);
        f.db.sales().apply_changes(&sale, &result.changes).await.unwrap();

        let removed_id = result
            .events
            .iter()
            .find_map(|e| match e {
                SaleEvent::ItemRemoved { item_id, .. } => Some(item_id.clone()),
                _ => None,
            })
            .unwrap();

        // The removed line was inserted and then cancelled in the same commit.
        let (product_id, quantity, cancelled): (String, i64, bool) = sqlx::query_as(
            "SELECT product_id, quantity, is_cancelled FROM sale_items WHERE id = ?",
        )
        .bind(&removed_id)
        .fetch_one(f.db.pool())
        .await
        .unwrap();
        assert_eq!(product_id, f.bravo.id);
        assert_eq!(quantity, 3);
        assert!(cancelled);

        let loaded = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].product_id, f.alpha.id);
        assert_eq!(loaded.total_amount_cents, 10_000);
        assert_eq!(loaded.total_discount_cents, 0);
    }

    #[tokio::test]
    async fn test_referenced_product_cannot_be_deleted() {
        let f = fixture().await;
        let sale = sale_for(&f, "Downtown", 1);
        f.db.sales().insert_with_items(&sale).await.unwrap();

        assert!(matches!(
            f.db.products().delete(&f.alpha.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
