//! First-in, first-out allocation of bottled stock.
//!
//! Oldest bottling date is drawn first. Lots bottled on the same day are
//! drawn in ascending lot ID order so that the plan does not depend on the
//! order the lots were loaded in.

use tracing::debug;

use cider_cellar_core::BlendBatchId;

use crate::models::{AllocationRequest, AllocationResult, InventoryLot, LotAllocation};

/// Compute a FIFO allocation plan for `request` over `lots`.
///
/// `lots` may contain lots of any blend, location or status; only active lots
/// of the requested blend and location with stock remaining are considered.
/// The function is pure: `lots` is not modified and nothing is written.
///
/// Unmet demand is not an error. The result carries `success == false`,
/// the exact shortfall per bottle size, and whatever partial plan could be
/// built. Whether to apply a partial plan is the caller's decision.
#[must_use]
pub fn allocate_fifo(lots: &[InventoryLot], request: &AllocationRequest) -> AllocationResult {
    let mut eligible: Vec<&InventoryLot> = lots
        .iter()
        .filter(|lot| lot.is_in(request.blend_batch_id, &request.location) && lot.is_allocatable())
        .collect();
    eligible.sort_by_key(|lot| (lot.bottling_date, lot.id));

    let mut remaining_75cl = request.wanted_75cl();
    let mut remaining_150cl = request.wanted_150cl();
    let mut allocations = Vec::new();

    for lot in eligible {
        if remaining_75cl == 0 && remaining_150cl == 0 {
            break;
        }

        let take_75cl = remaining_75cl.min(lot.current_quantity_75cl.max(0));
        let take_150cl = remaining_150cl.min(lot.current_quantity_150cl.max(0));

        if take_75cl > 0 || take_150cl > 0 {
            allocations.push(LotAllocation {
                lot_id: lot.id,
                lot_number: lot.lot_number.clone(),
                quantity_75cl: take_75cl,
                quantity_150cl: take_150cl,
            });
            remaining_75cl -= take_75cl;
            remaining_150cl -= take_150cl;
        }
    }

    let success = remaining_75cl == 0 && remaining_150cl == 0;

    debug!(
        blend_batch_id = %request.blend_batch_id,
        location = %request.location,
        lots_used = allocations.len(),
        remaining_75cl,
        remaining_150cl,
        success,
        "Computed FIFO allocation"
    );

    AllocationResult {
        success,
        allocations,
        remaining_needed_75cl: remaining_75cl,
        remaining_needed_150cl: remaining_150cl,
    }
}

/// Total allocatable stock `(75cl, 150cl)` of one blend at one location.
#[must_use]
pub fn available_stock(
    lots: &[InventoryLot],
    blend_batch_id: BlendBatchId,
    location: &str,
) -> (i64, i64) {
    lots.iter()
        .filter(|lot| lot.is_in(blend_batch_id, location) && lot.is_allocatable())
        .fold((0, 0), |(q75, q150), lot| {
            (
                q75 + i64::from(lot.current_quantity_75cl.max(0)),
                q150 + i64::from(lot.current_quantity_150cl.max(0)),
            )
        })
}
