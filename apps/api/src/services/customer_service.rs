//! Customer workflows.

use tracing::info;

use storefront_core::validation::{validate_customer, validate_id};
use storefront_core::{CoreError, Customer};
use storefront_db::Database;

use crate::dto::CreateCustomerRequest;
use crate::error::ApiResult;

#[derive(Debug, Clone)]
pub struct CustomerService {
    db: Database,
}

impl CustomerService {
    pub fn new(db: Database) -> Self {
        CustomerService { db }
    }

    pub async fn create(&self, request: CreateCustomerRequest) -> ApiResult<Customer> {
        let name = request.name.trim();
        let email = request.email.trim().to_lowercase();
        validate_customer(name, &email)?;

        let customer = Customer::new(name, email);
        self.db.customers().insert(&customer).await?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Customer> {
        validate_id("id", id)?;

        let customer = self
            .db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))?;
        Ok(customer)
    }
}
