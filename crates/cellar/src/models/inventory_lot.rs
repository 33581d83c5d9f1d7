//! Inventory lot domain models for bottled cider sitting in the cellar.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use cider_cellar_core::{BlendBatchId, InventoryLotId, InventoryMovementId, LotStatus, MovementType};

/// An inventory lot - bottles from one bottling run stored in one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLot {
    /// Unique lot ID.
    pub id: InventoryLotId,
    /// Blend this lot was bottled from.
    pub blend_batch_id: BlendBatchId,
    /// Human-readable lot code (e.g. `AH-240915`).
    pub lot_number: String,
    /// Date the lot was bottled. Defines FIFO order.
    pub bottling_date: NaiveDate,
    /// Free-text storage location.
    pub location: String,
    /// 75cl bottles at bottling time.
    pub initial_quantity_75cl: i32,
    /// 150cl bottles at bottling time.
    pub initial_quantity_150cl: i32,
    /// 75cl bottles still in stock.
    pub current_quantity_75cl: i32,
    /// 150cl bottles still in stock.
    pub current_quantity_150cl: i32,
    /// Lifecycle status.
    #[serde(default)]
    pub status: LotStatus,
    /// Row version used for optimistic concurrency on writes.
    #[serde(default)]
    pub version: i32,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl InventoryLot {
    /// Whether this lot can be drawn from by an allocation.
    ///
    /// Only active lots with stock in at least one bottle size qualify.
    #[must_use]
    pub fn is_allocatable(&self) -> bool {
        self.status == LotStatus::Active
            && (self.current_quantity_75cl > 0 || self.current_quantity_150cl > 0)
    }

    /// Whether this lot belongs to the given (blend, location) partition.
    #[must_use]
    pub fn is_in(&self, blend_batch_id: BlendBatchId, location: &str) -> bool {
        self.blend_batch_id == blend_batch_id && self.location == location
    }

    /// The (blend, location) partition of this lot.
    #[must_use]
    pub fn key(&self) -> LotKey {
        LotKey {
            blend_batch_id: self.blend_batch_id,
            location: self.location.clone(),
        }
    }
}

/// A (blend, location) pair. Inventory is partitioned by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotKey {
    /// Blend batch.
    pub blend_batch_id: BlendBatchId,
    /// Storage location.
    pub location: String,
}

/// Request to draw stock of one blend from one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Blend to draw from.
    pub blend_batch_id: BlendBatchId,
    /// Location to draw from.
    pub location: String,
    /// 75cl bottles wanted. `None` means zero.
    #[serde(default)]
    pub quantity_75cl: Option<i32>,
    /// 150cl bottles wanted. `None` means zero.
    #[serde(default)]
    pub quantity_150cl: Option<i32>,
}

impl AllocationRequest {
    /// 75cl bottles wanted, with missing or negative amounts read as zero.
    #[must_use]
    pub fn wanted_75cl(&self) -> i32 {
        self.quantity_75cl.unwrap_or(0).max(0)
    }

    /// 150cl bottles wanted, with missing or negative amounts read as zero.
    #[must_use]
    pub fn wanted_150cl(&self) -> i32 {
        self.quantity_150cl.unwrap_or(0).max(0)
    }
}

/// Bottles drawn from a single lot by an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotAllocation {
    /// Lot allocated from.
    pub lot_id: InventoryLotId,
    /// Lot number, surfaced to users on pick lists.
    pub lot_number: String,
    /// 75cl bottles taken from the lot.
    pub quantity_75cl: i32,
    /// 150cl bottles taken from the lot.
    pub quantity_150cl: i32,
}

/// Outcome of a FIFO allocation.
///
/// A plan only: nothing has been written when this is returned. Partial
/// plans are returned as-is with `success == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// `true` iff nothing remains needed in either bottle size.
    pub success: bool,
    /// Per-lot draws, oldest lot first.
    pub allocations: Vec<LotAllocation>,
    /// 75cl bottles that could not be allocated.
    pub remaining_needed_75cl: i32,
    /// 150cl bottles that could not be allocated.
    pub remaining_needed_150cl: i32,
}

impl AllocationResult {
    /// Total 75cl bottles across all allocations.
    #[must_use]
    pub fn allocated_75cl(&self) -> i64 {
        self.allocations
            .iter()
            .map(|a| i64::from(a.quantity_75cl))
            .sum()
    }

    /// Total 150cl bottles across all allocations.
    #[must_use]
    pub fn allocated_150cl(&self) -> i64 {
        self.allocations
            .iter()
            .map(|a| i64::from(a.quantity_150cl))
            .sum()
    }
}

/// A recorded change to a lot's quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovement {
    /// Unique movement ID.
    pub id: InventoryMovementId,
    /// Lot that changed.
    pub lot_id: InventoryLotId,
    /// Why it changed.
    pub movement_type: MovementType,
    /// 75cl bottles removed (positive) or added (negative).
    pub quantity_75cl: i32,
    /// 150cl bottles removed (positive) or added (negative).
    pub quantity_150cl: i32,
    /// Free-text reference (order number, shipment ID).
    pub reference: Option<String>,
    /// When the movement was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new inventory lot on bottling.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLotInput {
    /// Blend that was bottled.
    pub blend_batch_id: BlendBatchId,
    /// Lot number. Generated from the blend name and date when absent.
    pub lot_number: Option<String>,
    /// Bottling date.
    pub bottling_date: NaiveDate,
    /// Storage location.
    pub location: String,
    /// 75cl bottles produced.
    pub quantity_75cl: i32,
    /// 150cl bottles produced.
    pub quantity_150cl: i32,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Filter criteria for listing lots.
#[derive(Debug, Clone, Default)]
pub struct LotFilter {
    /// Filter by blend.
    pub blend_batch_id: Option<BlendBatchId>,
    /// Filter by location.
    pub location: Option<String>,
    /// Filter by status.
    pub status: Option<LotStatus>,
    /// Only lots with stock remaining in at least one bottle size.
    pub has_remaining: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}
