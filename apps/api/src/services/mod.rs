//! # Services
//!
//! One service per resource. Handlers build a service from [`crate::AppState`]
//! and call a single workflow method; the service validates input, talks to
//! the repositories, and publishes notifications.
//!
//! ```text
//! handler ──► service.workflow() ──► core rules ──► repository ──► bus.publish()
//! ```

pub mod customer_service;
pub mod product_service;
pub mod sale_service;

pub use customer_service::CustomerService;
pub use product_service::ProductService;
pub use sale_service::SaleService;
