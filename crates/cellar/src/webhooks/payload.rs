//! Webhook event bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cider_cellar_core::AlertSeverity;

use crate::models::InventoryAlert;

/// Event name for low-stock notifications.
pub const LOW_STOCK_EVENT: &str = "inventory.low_stock";

/// Body of an `inventory.low_stock` webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockPayload {
    /// Always [`LOW_STOCK_EVENT`].
    pub event: String,
    /// When the scan ran.
    pub generated_at: DateTime<Utc>,
    /// Number of critical alerts in `alerts`.
    pub critical_count: usize,
    /// Alerts, critical first.
    pub alerts: Vec<InventoryAlert>,
}

impl LowStockPayload {
    /// Wrap the alerts of one scan.
    #[must_use]
    pub fn new(alerts: Vec<InventoryAlert>, generated_at: DateTime<Utc>) -> Self {
        let critical_count = alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
            .count();
        Self {
            event: LOW_STOCK_EVENT.to_string(),
            generated_at,
            critical_count,
            alerts,
        }
    }
}
