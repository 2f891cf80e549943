//! # Customer Repository
//!
//! Customers are a small reference entity: sales point at them, listings show
//! their name and the close notification carries their email.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use storefront_core::Customer;

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer. A reused email fails with `UniqueViolation`.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query("INSERT INTO customers (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(customer.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, created_at FROM customers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// Looks a customer up by email, used by the seed binary to stay idempotent.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, created_at FROM customers WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_get_and_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let ada = Customer::new("Ada Lovelace", "ada@example.com");
        repo.insert(&ada).await.unwrap();

        let loaded = repo.get_by_id(&ada.id).await.unwrap().unwrap();
        assert_eq!(loaded.email, "ada@example.com");
        assert_eq!(
            repo.get_by_email("ada@example.com").await.unwrap().map(|c| c.id),
            Some(ada.id.clone())
        );
        assert!(repo.get_by_id("missing").await.unwrap().is_none());

        let clash = Customer::new("Someone Else", "ada@example.com");
        assert!(matches!(
            repo.insert(&clash).await,
            Err(DbError::UniqueViolation { .. })
        ));
    }
}
