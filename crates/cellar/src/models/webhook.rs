//! Outgoing webhook delivery records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cider_cellar_core::{DeliveryStatus, WebhookDeliveryId};

/// A queued or completed webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    /// Unique delivery ID.
    pub id: WebhookDeliveryId,
    /// Event name, e.g. `inventory.low_stock`.
    pub event_type: String,
    /// JSON body sent to the endpoint.
    pub payload: serde_json::Value,
    /// Current status.
    pub status: DeliveryStatus,
    /// Attempts made so far.
    pub attempts: i32,
    /// Earliest time the next attempt may run.
    pub next_attempt_at: DateTime<Utc>,
    /// Error from the most recent failed attempt.
    pub last_error: Option<String>,
    /// When the delivery was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the endpoint acknowledged the delivery.
    pub delivered_at: Option<DateTime<Utc>>,
}
