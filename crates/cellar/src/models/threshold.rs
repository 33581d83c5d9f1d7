//! Low-stock threshold policies and the alerts they raise.

use serde::{Deserialize, Serialize};

use cider_cellar_core::{AlertSeverity, BlendBatchId, InventoryThresholdId};

/// Minimum stock policy for one blend at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryThreshold {
    /// Unique threshold ID.
    pub id: InventoryThresholdId,
    /// Blend the policy applies to.
    pub blend_batch_id: BlendBatchId,
    /// Location the policy applies to.
    pub location: String,
    /// Minimum acceptable 75cl bottles.
    pub min_quantity_75cl: i32,
    /// Minimum acceptable 150cl bottles.
    pub min_quantity_150cl: i32,
    /// Whether alerts were switched on for this policy.
    #[serde(default = "default_alert_enabled")]
    pub alert_enabled: bool,
}

const fn default_alert_enabled() -> bool {
    true
}

/// Input for creating or replacing the threshold of a (blend, location) pair.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertThresholdInput {
    /// Blend the policy applies to.
    pub blend_batch_id: BlendBatchId,
    /// Location the policy applies to.
    pub location: String,
    /// Minimum acceptable 75cl bottles.
    pub min_quantity_75cl: i32,
    /// Minimum acceptable 150cl bottles.
    pub min_quantity_150cl: i32,
    /// Whether alerts are switched on.
    pub alert_enabled: bool,
}

/// A (blend, location) pair whose stock fell under its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAlert {
    /// Blend that is running low.
    pub blend_batch_id: BlendBatchId,
    /// Display name of the blend.
    pub blend_name: String,
    /// Location that is running low.
    pub location: String,
    /// 75cl bottles across active lots.
    pub current_75cl: i64,
    /// 150cl bottles across active lots.
    pub current_150cl: i64,
    /// Configured 75cl minimum.
    pub threshold_75cl: i32,
    /// Configured 150cl minimum.
    pub threshold_150cl: i32,
    /// How far under the threshold the stock is.
    pub severity: AlertSeverity,
}
