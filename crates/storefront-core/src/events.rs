//! # Sale Events
//!
//! Notifications emitted by sale workflows. They are plain values: building
//! one has no side effect, and delivery is the application's concern.
//!
//! | Event            | Emitted when                          |
//! |------------------|---------------------------------------|
//! | `SaleCreated`    | a sale and its first lines are stored |
//! | `SaleModified`   | a reconciliation was committed        |
//! | `ItemRemoved`    | a line was removed by reconciliation  |
//! | `SaleClosed`     | a sale was closed                     |
//! | `SaleCancelled`  | a sale was cancelled                  |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SaleEvent {
    SaleCreated {
        sale_id: String,
        customer_id: String,
        total_amount_cents: i64,
        occurred_at: DateTime<Utc>,
    },
    SaleModified {
        sale_id: String,
        total_amount_cents: i64,
        occurred_at: DateTime<Utc>,
    },
    ItemRemoved {
        sale_id: String,
        item_id: String,
        occurred_at: DateTime<Utc>,
    },
    SaleClosed {
        sale_id: String,
        total_amount_cents: i64,
        /// `None` when the customer record could not be loaded.
        customer_email: Option<String>,
        occurred_at: DateTime<Utc>,
    },
    SaleCancelled {
        sale_id: String,
        occurred_at: DateTime<Utc>,
    },
}

impl SaleEvent {
    pub fn created(sale_id: &str, customer_id: &str, total: Money) -> Self {
        SaleEvent::SaleCreated {
            sale_id: sale_id.to_string(),
            customer_id: customer_id.to_string(),
            total_amount_cents: total.cents(),
            occurred_at: Utc::now(),
        }
    }

    pub fn modified(sale_id: &str, total: Money) -> Self {
        SaleEvent::SaleModified {
            sale_id: sale_id.to_string(),
            total_amount_cents: total.cents(),
            occurred_at: Utc::now(),
        }
    }

    pub fn item_removed(sale_id: &str, item_id: &str) -> Self {
        SaleEvent::ItemRemoved {
            sale_id: sale_id.to_string(),
            item_id: item_id.to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub fn closed(sale_id: &str, total: Money, customer_email: Option<String>) -> Self {
        SaleEvent::SaleClosed {
            sale_id: sale_id.to_string(),
            total_amount_cents: total.cents(),
            customer_email,
            occurred_at: Utc::now(),
        }
    }

    pub fn cancelled(sale_id: &str) -> Self {
        SaleEvent::SaleCancelled {
            sale_id: sale_id.to_string(),
            occurred_at: Utc::now(),
        }
    }

    /// Stable event name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            SaleEvent::SaleCreated { .. } => "sale_created",
            SaleEvent::SaleModified { .. } => "sale_modified",
            SaleEvent::ItemRemoved { .. } => "item_removed",
            SaleEvent::SaleClosed { .. } => "sale_closed",
            SaleEvent::SaleCancelled { .. } => "sale_cancelled",
        }
    }

    pub fn sale_id(&self) -> &str {
        match self {
            SaleEvent::SaleCreated { sale_id, .. }
            | SaleEvent::SaleModified { sale_id, .. }
            | SaleEvent::ItemRemoved { sale_id, .. }
            | SaleEvent::SaleClosed { sale_id, .. }
            | SaleEvent::SaleCancelled { sale_id, .. } => sale_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleCreated { occurred_at, .. }
            | SaleEvent::SaleModified { occurred_at, .. }
            | SaleEvent::ItemRemoved { occurred_at, .. }
            | SaleEvent::SaleClosed { occurred_at, .. }
            | SaleEvent::SaleCancelled { occurred_at, .. } => *occurred_at,
        }
    }

    /// JSON payload for audit sinks.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged() {
        let event = SaleEvent::closed("s-1", Money::from_cents(1_250), Some("a@b.io".into()));
        let payload = event.payload();

        assert_eq!(payload["type"], "sale_closed");
        assert_eq!(payload["sale_id"], "s-1");
        assert_eq!(payload["total_amount_cents"], 1_250);
        assert_eq!(payload["customer_email"], "a@b.io");
        assert_eq!(event.name(), "sale_closed");
    }

    #[test]
    fn test_accessors() {
        let event = SaleEvent::item_removed("s-2", "i-9");
        assert_eq!(event.sale_id(), "s-2");
        assert!(event.occurred_at() <= Utc::now());
    }
}
