//! `/api/sales` handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use storefront_core::SalesSummary;

use crate::dto::{
    ApiResponse, CreateSaleRequest, Paginated, SaleListQuery, SaleSummaryRow, SaleUpdateView,
    SaleView, UpdateSaleRequest,
};
use crate::error::ApiResult;
use crate::services::SaleService;
use crate::AppState;

fn service(state: &AppState) -> SaleService {
    SaleService::new(state.db.clone(), state.bus.clone())
}

pub async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SaleView>>)> {
    let Json(request) = payload?;
    let sale = service(&state).create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Sale created successfully", sale)),
    ))
}

pub async fn list_sales(
    State(state): State<AppState>,
    query: Result<Query<SaleListQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Paginated<SaleSummaryRow>>>> {
    let Query(query) = query?;
    let page = service(&state).list(&query).await?;
    Ok(Json(ApiResponse::ok("Sales retrieved successfully", page)))
}

pub async fn sales_summary(
    State(state): State<AppState>,
    query: Result<Query<SaleListQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<SalesSummary>>> {
    let Query(query) = query?;
    let summary = service(&state).summary(&query).await?;
    Ok(Json(ApiResponse::ok("Sales summary retrieved successfully", summary)))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<SaleView>>> {
    let sale = service(&state).get(&id).await?;
    Ok(Json(ApiResponse::ok("Sale retrieved successfully", sale)))
}

pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSaleRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SaleUpdateView>>> {
    let Json(request) = payload?;
    let sale = service(&state).update(&id, request).await?;
    Ok(Json(ApiResponse::ok("Sale updated successfully", sale)))
}

pub async fn close_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<SaleView>>> {
    let sale = service(&state).close(&id).await?;
    Ok(Json(ApiResponse::ok("Sale closed successfully", sale)))
}

/// `DELETE /api/sales/{id}` cancels; the row is kept.
pub async fn cancel_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<SaleView>>> {
    let sale = service(&state).cancel(&id).await?;
    Ok(Json(ApiResponse::ok("Sale cancelled successfully", sale)))
}
