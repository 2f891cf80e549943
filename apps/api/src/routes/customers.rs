//! `/api/customers` handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use storefront_core::Customer;

use crate::dto::{ApiResponse, CreateCustomerRequest};
use crate::error::ApiResult;
use crate::services::CustomerService;
use crate::AppState;

pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Customer>>)> {
    let Json(request) = payload?;
    let customer = CustomerService::new(state.db.clone()).create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Customer created successfully", customer)),
    ))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Customer>>> {
    let customer = CustomerService::new(state.db.clone()).get(&id).await?;
    Ok(Json(ApiResponse::ok("Customer retrieved successfully", customer)))
}
