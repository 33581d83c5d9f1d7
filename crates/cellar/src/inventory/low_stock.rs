//! Low-stock detection against per-(blend, location) thresholds.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use cider_cellar_core::{AlertSeverity, BlendBatchId, LotStatus};

use crate::models::{InventoryAlert, InventoryLot, InventoryThreshold, LotKey};

/// Remaining stock below this percentage of the threshold is critical.
pub const CRITICAL_PERCENT: f64 = 25.0;

/// Name used when a blend has no entry in the name map.
pub const UNKNOWN_BLEND_NAME: &str = "Unknown blend";

/// Aggregate stock of one (blend, location) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    /// 75cl bottles across active lots.
    pub quantity_75cl: i64,
    /// 150cl bottles across active lots.
    pub quantity_150cl: i64,
}

/// Sum current quantities of active lots per (blend, location).
///
/// Reserved and depleted lots do not count toward stock. Negative quantities
/// count as zero, as they do for allocation.
#[must_use]
pub fn stock_levels(lots: &[InventoryLot]) -> HashMap<LotKey, StockLevel> {
    let mut levels: HashMap<LotKey, StockLevel> = HashMap::new();
    for lot in lots.iter().filter(|lot| lot.status == LotStatus::Active) {
        let level = levels.entry(lot.key()).or_default();
        level.quantity_75cl += i64::from(lot.current_quantity_75cl.max(0));
        level.quantity_150cl += i64::from(lot.current_quantity_150cl.max(0));
    }
    levels
}

/// Evaluate every threshold against the current lots.
///
/// A threshold fires when stock is under its minimum in *either* bottle
/// size. A (blend, location) pair with no active lots counts as zero stock.
/// The `alert_enabled` flag is not consulted here; use [`enabled_only`]
/// beforehand to honour it.
///
/// Critical alerts come first. Within a severity, alerts keep the order of
/// `thresholds`.
#[must_use]
pub fn check_low_stock(
    lots: &[InventoryLot],
    thresholds: &[InventoryThreshold],
    blend_names: &HashMap<BlendBatchId, String>,
) -> Vec<InventoryAlert> {
    let levels = stock_levels(lots);

    let mut alerts: Vec<InventoryAlert> = thresholds
        .iter()
        .filter_map(|threshold| {
            let key = LotKey {
                blend_batch_id: threshold.blend_batch_id,
                location: threshold.location.clone(),
            };
            let level = levels.get(&key).copied().unwrap_or_default();

            let below_75cl = level.quantity_75cl < i64::from(threshold.min_quantity_75cl);
            let below_150cl = level.quantity_150cl < i64::from(threshold.min_quantity_150cl);
            if !below_75cl && !below_150cl {
                return None;
            }

            let severity = classify_severity(level, threshold);
            let blend_name = blend_names
                .get(&threshold.blend_batch_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_BLEND_NAME.to_string());

            Some(InventoryAlert {
                blend_batch_id: threshold.blend_batch_id,
                blend_name,
                location: key.location,
                current_75cl: level.quantity_75cl,
                current_150cl: level.quantity_150cl,
                threshold_75cl: threshold.min_quantity_75cl,
                threshold_150cl: threshold.min_quantity_150cl,
                severity,
            })
        })
        .collect();

    // Stable sort keeps threshold order within each severity.
    alerts.sort_by_key(|alert| alert.severity);

    debug!(
        thresholds = thresholds.len(),
        alerts = alerts.len(),
        critical = alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
            .count(),
        "Checked stock levels"
    );

    alerts
}

/// Thresholds with alerts switched on.
#[must_use]
pub fn enabled_only(thresholds: &[InventoryThreshold]) -> Vec<InventoryThreshold> {
    thresholds
        .iter()
        .filter(|t| t.alert_enabled)
        .cloned()
        .collect()
}

/// Remaining stock as a percentage of `minimum`.
///
/// A zero (or negative) minimum imposes no requirement and reads as 100%.
#[must_use]
pub fn stock_percent(current: i64, minimum: i32) -> f64 {
    if minimum <= 0 {
        return 100.0;
    }
    #[allow(clippy::cast_precision_loss)] // Bottle counts never approach 2^52
    let current = current as f64;
    current / f64::from(minimum) * 100.0
}

/// Severity of the weaker of the two bottle sizes.
fn classify_severity(level: StockLevel, threshold: &InventoryThreshold) -> AlertSeverity {
    let pct_75cl = stock_percent(level.quantity_75cl, threshold.min_quantity_75cl);
    let pct_150cl = stock_percent(level.quantity_150cl, threshold.min_quantity_150cl);
    if pct_75cl.min(pct_150cl) < CRITICAL_PERCENT {
        AlertSeverity::Critical
    } else {
        AlertSeverity::Low
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use cider_cellar_core::{InventoryLotId, InventoryThresholdId};

    use super::*;

    fn lot(id: i32, blend: i32, location: &str, q75: i32, q150: i32) -> InventoryLot {
        InventoryLot {
            id: InventoryLotId::new(id),
            blend_batch_id: BlendBatchId::new(blend),
            lot_number: format!("LOT-{id}"),
            bottling_date: NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(),
            location: location.to_string(),
            initial_quantity_75cl: q75,
            initial_quantity_150cl: q150,
            current_quantity_75cl: q75,
            current_quantity_150cl: q150,
            status: LotStatus::Active,
            version: 0,
            notes: None,
        }
    }

    fn threshold(id: i32, blend: i32, location: &str, min75: i32, min150: i32) -> InventoryThreshold {
        InventoryThreshold {
            id: InventoryThresholdId::new(id),
            blend_batch_id: BlendBatchId::new(blend),
            location: location.to_string(),
            min_quantity_75cl: min75,
            min_quantity_150cl: min150,
            alert_enabled: true,
        }
    }

    #[test]
    fn test_stock_levels_sum_active_lots_only() {
        let mut reserved = lot(3, 1, "Cellar", 500, 500);
        reserved.status = LotStatus::Reserved;
        let lots = vec![lot(1, 1, "Cellar", 30, 3), lot(2, 1, "Cellar", 20, 2), reserved];
        let levels = stock_levels(&lots);
        let key = LotKey {
            blend_batch_id: BlendBatchId::new(1),
            location: "Cellar".to_string(),
        };
        assert_eq!(
            levels.get(&key).copied().unwrap(),
            StockLevel {
                quantity_75cl: 50,
                quantity_150cl: 5
            }
        );
    }

    #[test]
    fn test_negative_quantities_count_as_zero() {
        let mut corrupt = lot(2, 1, "Cellar", 0, 0);
        corrupt.current_quantity_75cl = -40;
        corrupt.current_quantity_150cl = -3;
        let lots = vec![lot(1, 1, "Cellar", 100, 10), corrupt];

        let level = stock_levels(&lots).into_values().next().unwrap();
        assert_eq!(
            level,
            StockLevel {
                quantity_75cl: 100,
                quantity_150cl: 10
            }
        );
        assert_eq!(
            crate::inventory::available_stock(&lots, BlendBatchId::new(1), "Cellar"),
            (level.quantity_75cl, level.quantity_150cl)
        );

        let alerts = check_low_stock(&lots, &[threshold(1, 1, "Cellar", 100, 10)], &HashMap::new());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_no_alert_when_at_threshold() {
        let lots = vec![lot(1, 1, "Cellar", 100, 100)];
        let alerts = check_low_stock(&lots, &[threshold(1, 1, "Cellar", 100, 100)], &HashMap::new());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_missing_stock_counts_as_zero() {
        let alerts = check_low_stock(&[], &[threshold(1, 7, "Barn", 10, 0)], &HashMap::new());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].current_75cl, 0);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].blend_name, UNKNOWN_BLEND_NAME);
    }

    #[test]
    fn test_zero_minimums_never_fire() {
        let alerts = check_low_stock(&[], &[threshold(1, 7, "Barn", 0, 0)], &HashMap::new());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_uses_blend_name_map() {
        let names = HashMap::from([(BlendBatchId::new(1), "Autumn Harvest".to_string())]);
        let alerts = check_low_stock(&[], &[threshold(1, 1, "Cellar", 5, 0)], &names);
        assert_eq!(alerts[0].blend_name, "Autumn Harvest");
    }

    #[test]
    fn test_stock_percent_guards_zero_minimum() {
        assert!((stock_percent(0, 0) - 100.0).abs() < f64::EPSILON);
        assert!((stock_percent(50, 200) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_critical_sorted_before_low() {
        let lots = vec![lot(1, 1, "Cellar", 80, 0), lot(2, 2, "Cellar", 10, 0)];
        let thresholds = vec![
            threshold(1, 1, "Cellar", 100, 0),
            threshold(2, 2, "Cellar", 100, 0),
        ];
        let alerts = check_low_stock(&lots, &thresholds, &HashMap::new());
        let severities: Vec<AlertSeverity> = alerts.iter().map(|a| a.severity).collect();
        assert_eq!(severities, vec![AlertSeverity::Critical, AlertSeverity::Low]);
        assert_eq!(alerts[0].blend_batch_id, BlendBatchId::new(2));
    }

    #[test]
    fn test_alert_enabled_flag_is_not_consulted() {
        let mut disabled = threshold(1, 1, "Cellar", 100, 0);
        disabled.alert_enabled = false;
        let alerts = check_low_stock(&[], &[disabled.clone()], &HashMap::new());
        assert_eq!(alerts.len(), 1);
        assert!(enabled_only(&[disabled]).is_empty());
    }
}
