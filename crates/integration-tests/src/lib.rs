//! Integration tests for Cider Cellar.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cider-cellar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `fifo_allocation` - Allocation properties over in-memory lots
//! - `low_stock_alerts` - Threshold evaluation and severity
//! - `webhook_delivery` - Signing, retry policy and HTTP delivery
//!
//! None of these need a database.

use chrono::NaiveDate;

use cider_cellar::models::{AllocationRequest, InventoryLot, InventoryThreshold};
use cider_cellar_core::{BlendBatchId, InventoryLotId, InventoryThresholdId, LotStatus};

/// Location used by fixtures unless a test says otherwise.
pub const CELLAR: &str = "cellar-a";

/// Build a calendar date, panicking on invalid input.
///
/// # Panics
///
/// Panics if the date does not exist.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// An active, untouched lot of blend 1 in [`CELLAR`].
#[must_use]
pub fn lot(id: i32, bottled: NaiveDate, quantity_75cl: i32, quantity_150cl: i32) -> InventoryLot {
    InventoryLot {
        id: InventoryLotId::new(id),
        blend_batch_id: BlendBatchId::new(1),
        lot_number: format!("AH-{}", bottled.format("%y%m%d")),
        bottling_date: bottled,
        location: CELLAR.to_string(),
        initial_quantity_75cl: quantity_75cl,
        initial_quantity_150cl: quantity_150cl,
        current_quantity_75cl: quantity_75cl,
        current_quantity_150cl: quantity_150cl,
        status: LotStatus::Active,
        version: 0,
        notes: None,
    }
}

/// A request against blend 1 in [`CELLAR`].
#[must_use]
pub fn request(quantity_75cl: Option<i32>, quantity_150cl: Option<i32>) -> AllocationRequest {
    AllocationRequest {
        blend_batch_id: BlendBatchId::new(1),
        location: CELLAR.to_string(),
        quantity_75cl,
        quantity_150cl,
    }
}

/// An enabled threshold for blend 1 in [`CELLAR`].
#[must_use]
pub fn threshold(id: i32, min_quantity_75cl: i32, min_quantity_150cl: i32) -> InventoryThreshold {
    InventoryThreshold {
        id: InventoryThresholdId::new(id),
        blend_batch_id: BlendBatchId::new(1),
        location: CELLAR.to_string(),
        min_quantity_75cl,
        min_quantity_150cl,
        alert_enabled: true,
    }
}
