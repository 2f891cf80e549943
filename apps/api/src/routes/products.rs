//! `/api/products` handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use storefront_core::{Product, ProductInput};

use crate::dto::{ApiResponse, ListQuery, Paginated};
use crate::error::ApiResult;
use crate::services::ProductService;
use crate::AppState;

fn service(state: &AppState) -> ProductService {
    ProductService::new(state.db.clone())
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let Json(input) = payload?;
    let product = service(&state).create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Product created successfully", product)),
    ))
}

pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Paginated<Product>>>> {
    let Query(query) = query?;
    let page = service(&state).list(&query).await?;
    Ok(Json(ApiResponse::ok("Products retrieved successfully", page)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = service(&state).get(&id).await?;
    Ok(Json(ApiResponse::ok("Product retrieved successfully", product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let Json(input) = payload?;
    let product = service(&state).update(&id, input).await?;
    Ok(Json(ApiResponse::ok("Product updated successfully", product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    service(&state).delete(&id).await?;
    Ok(Json(ApiResponse::ok("Product deleted successfully", ())))
}

pub async fn activate_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = service(&state).set_availability(&id, true).await?;
    Ok(Json(ApiResponse::ok("Product activated successfully", product)))
}

pub async fn deactivate_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = service(&state).set_availability(&id, false).await?;
    Ok(Json(ApiResponse::ok("Product deactivated successfully", product)))
}
