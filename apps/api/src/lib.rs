//! # storefront-api: HTTP Server for the Storefront Backend
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        API Request Lifecycle                            │
//! │                                                                         │
//! │  HTTP request                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  router() ──► routes::<resource> handler                                │
//! │       │           extract Path / Query / Json (rejections → 400)        │
//! │       ▼                                                                 │
//! │  services::<Resource>Service                                            │
//! │       │     storefront-core rules, storefront-db repositories           │
//! │       ▼                                                                 │
//! │  ApiResponse envelope  or  ApiError (status from ErrorCode)            │
//! │                                                                         │
//! │  Side channel: SaleService ──► NotificationBus ──► dispatcher task      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - TOML + environment configuration
//! - [`error`] - `ApiError` and HTTP status mapping
//! - [`dto`] - Request/response shapes
//! - [`notifications`] - In-process sale event bus
//! - [`services`] - Workflows per resource
//! - [`routes`] - axum handlers

pub mod config;
pub mod dto;
pub mod error;
pub mod notifications;
pub mod routes;
pub mod services;

use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use storefront_db::Database;

use crate::config::{LogFormat, LoggingSettings};
use crate::notifications::NotificationBus;
use crate::routes::{customers, health, products, sales};

/// Shared application state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub bus: NotificationBus,
}

impl AppState {
    pub fn new(db: Database, bus: NotificationBus) -> Self {
        AppState { db, bus }
    }
}

/// Builds the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Products
        .route(
            "/api/products",
            post(products::create_product).get(products::list_products),
        )
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/products/{id}/activate", post(products::activate_product))
        .route("/api/products/{id}/deactivate", post(products::deactivate_product))
        // Customers
        .route("/api/customers", post(customers::create_customer))
        .route("/api/customers/{id}", get(customers::get_customer))
        // Sales
        .route("/api/sales", post(sales::create_sale).get(sales::list_sales))
        .route("/api/sales/summary", get(sales::sales_summary))
        .route(
            "/api/sales/{id}",
            get(sales::get_sale)
                .put(sales::update_sale)
                .delete(sales::cancel_sale),
        )
        .route("/api/sales/{id}/close", post(sales::close_sale))
        .with_state(state)
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Calling this
/// twice is harmless; the second call is ignored.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}
