//! Low-stock scanning over the live inventory.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use cider_cellar_core::WebhookDeliveryId;

use crate::db::{
    BlendRepository, InventoryLotRepository, ThresholdRepository, WebhookDeliveryRepository,
};
use crate::error::AppError;
use crate::inventory::{check_low_stock, enabled_only};
use crate::models::InventoryAlert;
use crate::webhooks::{LOW_STOCK_EVENT, LowStockPayload, WebhookError};

/// Outcome of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct StockScan {
    /// Alerts, critical first.
    pub alerts: Vec<InventoryAlert>,
    /// Delivery queued for the alerts, if notification was requested.
    pub delivery_id: Option<WebhookDeliveryId>,
}

/// Low-stock scanning service.
pub struct StockAlertService {
    pool: PgPool,
}

impl StockAlertService {
    /// Create a new stock alert service.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Evaluate every threshold against the active lots.
    ///
    /// With `enabled_only_thresholds`, thresholds whose `alert_enabled` flag
    /// is off are skipped. With `notify`, a non-empty result is queued as a
    /// single `inventory.low_stock` webhook delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if loading or queueing fails, or
    /// `AppError::Webhook` if the payload cannot be serialized.
    #[instrument(skip(self))]
    pub async fn scan(
        &self,
        enabled_only_thresholds: bool,
        notify: bool,
    ) -> Result<StockScan, AppError> {
        let lots = InventoryLotRepository::new(&self.pool)
            .list_active_lots()
            .await?;
        let mut thresholds = ThresholdRepository::new(&self.pool)
            .list_thresholds()
            .await?;
        if enabled_only_thresholds {
            thresholds = enabled_only(&thresholds);
        }
        let names = BlendRepository::new(&self.pool).names().await?;

        let alerts = check_low_stock(&lots, &thresholds, &names);
        info!(
            thresholds = thresholds.len(),
            alerts = alerts.len(),
            "Low-stock scan complete"
        );

        let delivery_id = if notify && !alerts.is_empty() {
            let payload = LowStockPayload::new(alerts.clone(), Utc::now());
            let body = serde_json::to_value(&payload).map_err(WebhookError::from)?;
            let delivery = WebhookDeliveryRepository::new(&self.pool)
                .enqueue(LOW_STOCK_EVENT, &body)
                .await?;
            info!(delivery_id = %delivery.id, "Queued low-stock webhook");
            Some(delivery.id)
        } else {
            None
        };

        Ok(StockScan {
            alerts,
            delivery_id,
        })
    }
}
