//! Turning an allocation plan into per-lot quantity changes.
//!
//! [`plan_decrements`] validates a plan against the lots it was computed
//! from and derives the new quantities and status of every touched lot.
//! The database repository writes those changes guarded by each lot's
//! `version`; [`apply_decrements`] does the same to an in-memory snapshot.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use cider_cellar_core::{InventoryLotId, LotStatus};

use crate::models::{AllocationResult, InventoryLot};

/// Errors raised while validating or applying an allocation plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The plan references a lot that is not in the snapshot.
    #[error("lot {0} not found")]
    UnknownLot(InventoryLotId),

    /// The plan draws from the same lot twice.
    #[error("lot {0} appears more than once in the allocation")]
    DuplicateLot(InventoryLotId),

    /// The plan draws from a lot that is not active.
    #[error("lot {lot_id} is {status}, only active lots can be allocated")]
    InactiveLot {
        /// Offending lot.
        lot_id: InventoryLotId,
        /// Its current status.
        status: LotStatus,
    },

    /// The plan draws a negative quantity.
    #[error("lot {0} has a negative allocation")]
    NegativeQuantity(InventoryLotId),

    /// The plan draws more than the lot holds.
    #[error("lot {lot_id} holds {available} x {size}, allocation wants {requested}")]
    Overdrawn {
        /// Offending lot.
        lot_id: InventoryLotId,
        /// Bottle size label (`75cl` or `150cl`).
        size: &'static str,
        /// Bottles in the lot.
        available: i32,
        /// Bottles the plan takes.
        requested: i32,
    },

    /// The lot changed since the plan was computed.
    #[error("lot {lot_id} changed since planning (expected version {expected}, found {found})")]
    VersionConflict {
        /// Offending lot.
        lot_id: InventoryLotId,
        /// Version the plan was computed against.
        expected: i32,
        /// Version currently stored.
        found: i32,
    },

    /// A full allocation was required but stock ran short.
    #[error(
        "insufficient stock: {remaining_75cl} x 75cl and {remaining_150cl} x 150cl could not be allocated"
    )]
    Insufficient {
        /// Unmet 75cl bottles.
        remaining_75cl: i32,
        /// Unmet 150cl bottles.
        remaining_150cl: i32,
    },
}

/// The change one allocation makes to one lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotDecrement {
    /// Lot being drawn from.
    pub lot_id: InventoryLotId,
    /// Lot version the plan was computed against.
    pub expected_version: i32,
    /// 75cl bottles taken.
    pub taken_75cl: i32,
    /// 150cl bottles taken.
    pub taken_150cl: i32,
    /// 75cl bottles left afterwards.
    pub new_quantity_75cl: i32,
    /// 150cl bottles left afterwards.
    pub new_quantity_150cl: i32,
    /// Status afterwards. `Depleted` once both sizes reach zero.
    pub new_status: LotStatus,
}

/// Validate `result` against `lots` and compute the per-lot changes.
///
/// # Errors
///
/// Returns `AllocationError` if the plan references unknown, duplicate or
/// inactive lots, or takes negative or excessive quantities.
pub fn plan_decrements(
    lots: &[InventoryLot],
    result: &AllocationResult,
) -> Result<Vec<LotDecrement>, AllocationError> {
    let mut seen = HashSet::new();
    let mut decrements = Vec::with_capacity(result.allocations.len());

    for allocation in &result.allocations {
        if !seen.insert(allocation.lot_id) {
            return Err(AllocationError::DuplicateLot(allocation.lot_id));
        }

        let lot = lots
            .iter()
            .find(|lot| lot.id == allocation.lot_id)
            .ok_or(AllocationError::UnknownLot(allocation.lot_id))?;

        if lot.status != LotStatus::Active {
            return Err(AllocationError::InactiveLot {
                lot_id: lot.id,
                status: lot.status,
            });
        }
        if allocation.quantity_75cl < 0 || allocation.quantity_150cl < 0 {
            return Err(AllocationError::NegativeQuantity(lot.id));
        }
        if allocation.quantity_75cl > lot.current_quantity_75cl {
            return Err(AllocationError::Overdrawn {
                lot_id: lot.id,
                size: "75cl",
                available: lot.current_quantity_75cl,
                requested: allocation.quantity_75cl,
            });
        }
        if allocation.quantity_150cl > lot.current_quantity_150cl {
            return Err(AllocationError::Overdrawn {
                lot_id: lot.id,
                size: "150cl",
                available: lot.current_quantity_150cl,
                requested: allocation.quantity_150cl,
            });
        }

        let new_quantity_75cl = lot.current_quantity_75cl - allocation.quantity_75cl;
        let new_quantity_150cl = lot.current_quantity_150cl - allocation.quantity_150cl;
        let new_status = if new_quantity_75cl == 0 && new_quantity_150cl == 0 {
            LotStatus::Depleted
        } else {
            LotStatus::Active
        };

        decrements.push(LotDecrement {
            lot_id: lot.id,
            expected_version: lot.version,
            taken_75cl: allocation.quantity_75cl,
            taken_150cl: allocation.quantity_150cl,
            new_quantity_75cl,
            new_quantity_150cl,
            new_status,
        });
    }

    Ok(decrements)
}

/// Apply decrements to an in-memory snapshot, all or nothing.
///
/// Each touched lot must still carry the version the plan was computed
/// against; its version is bumped on success.
///
/// # Errors
///
/// Returns `AllocationError::UnknownLot` or `AllocationError::VersionConflict`
/// without modifying `lots`.
pub fn apply_decrements(
    lots: &mut [InventoryLot],
    decrements: &[LotDecrement],
) -> Result<(), AllocationError> {
    for decrement in decrements {
        let lot = lots
            .iter()
            .find(|lot| lot.id == decrement.lot_id)
            .ok_or(AllocationError::UnknownLot(decrement.lot_id))?;
        if lot.version != decrement.expected_version {
            return Err(AllocationError::VersionConflict {
                lot_id: lot.id,
                expected: decrement.expected_version,
                found: lot.version,
            });
        }
    }

    for decrement in decrements {
        if let Some(lot) = lots.iter_mut().find(|lot| lot.id == decrement.lot_id) {
            lot.current_quantity_75cl = decrement.new_quantity_75cl;
            lot.current_quantity_150cl = decrement.new_quantity_150cl;
            lot.status = decrement.new_status;
            lot.version += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use cider_cellar_core::BlendBatchId;

    use super::*;
    use crate::models::LotAllocation;

    fn lot(id: i32, q75: i32, q150: i32) -> InventoryLot {
        InventoryLot {
            id: InventoryLotId::new(id),
            blend_batch_id: BlendBatchId::new(1),
            lot_number: format!("LOT-{id}"),
            bottling_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            location: "Cellar".to_string(),
            initial_quantity_75cl: q75,
            initial_quantity_150cl: q150,
            current_quantity_75cl: q75,
            current_quantity_150cl: q150,
            status: LotStatus::Active,
            version: 3,
            notes: None,
        }
    }

    fn plan(allocations: Vec<(i32, i32, i32)>) -> AllocationResult {
        AllocationResult {
            success: true,
            allocations: allocations
                .into_iter()
                .map(|(id, q75, q150)| LotAllocation {
                    lot_id: InventoryLotId::new(id),
                    lot_number: format!("LOT-{id}"),
                    quantity_75cl: q75,
                    quantity_150cl: q150,
                })
                .collect(),
            remaining_needed_75cl: 0,
            remaining_needed_150cl: 0,
        }
    }

    #[test]
    fn test_plan_marks_emptied_lot_depleted() {
        let lots = vec![lot(1, 10, 0), lot(2, 10, 5)];
        let decrements = plan_decrements(&lots, &plan(vec![(1, 10, 0), (2, 4, 0)])).unwrap();
        assert_eq!(decrements[0].new_status, LotStatus::Depleted);
        assert_eq!(decrements[0].expected_version, 3);
        assert_eq!(decrements[1].new_status, LotStatus::Active);
        assert_eq!(decrements[1].new_quantity_75cl, 6);
        assert_eq!(decrements[1].new_quantity_150cl, 5);
    }

    #[test]
    fn test_plan_rejects_overdraw() {
        let lots = vec![lot(1, 10, 0)];
        let err = plan_decrements(&lots, &plan(vec![(1, 11, 0)])).unwrap_err();
        assert!(matches!(err, AllocationError::Overdrawn { size: "75cl", .. }));
    }

    #[test]
    fn test_plan_rejects_unknown_and_duplicate_lots() {
        let lots = vec![lot(1, 10, 0)];
        assert_eq!(
            plan_decrements(&lots, &plan(vec![(2, 1, 0)])).unwrap_err(),
            AllocationError::UnknownLot(InventoryLotId::new(2))
        );
        assert_eq!(
            plan_decrements(&lots, &plan(vec![(1, 1, 0), (1, 1, 0)])).unwrap_err(),
            AllocationError::DuplicateLot(InventoryLotId::new(1))
        );
    }

    #[test]
    fn test_plan_rejects_inactive_lot() {
        let mut reserved = lot(1, 10, 0);
        reserved.status = LotStatus::Reserved;
        let err = plan_decrements(&[reserved], &plan(vec![(1, 1, 0)])).unwrap_err();
        assert!(matches!(err, AllocationError::InactiveLot { .. }));
    }

    #[test]
    fn test_apply_updates_snapshot_and_bumps_version() {
        let mut lots = vec![lot(1, 10, 2)];
        let decrements = plan_decrements(&lots, &plan(vec![(1, 10, 2)])).unwrap();
        apply_decrements(&mut lots, &decrements).unwrap();
        assert_eq!(lots[0].current_quantity_75cl, 0);
        assert_eq!(lots[0].current_quantity_150cl, 0);
        assert_eq!(lots[0].status, LotStatus::Depleted);
        assert_eq!(lots[0].version, 4);
    }

    #[test]
    fn test_apply_twice_conflicts_without_changes() {
        let mut lots = vec![lot(1, 10, 0), lot(2, 10, 0)];
        let decrements = plan_decrements(&lots, &plan(vec![(1, 5, 0), (2, 5, 0)])).unwrap();
        apply_decrements(&mut lots, &decrements).unwrap();
        let after_first = lots.clone();

        let err = apply_decrements(&mut lots, &decrements).unwrap_err();
        assert!(matches!(err, AllocationError::VersionConflict { expected: 3, found: 4, .. }));
        assert_eq!(lots, after_first);
    }
}
