//! HTTP routes, grouped by resource.

pub mod customers;
pub mod health;
pub mod products;
pub mod sales;
