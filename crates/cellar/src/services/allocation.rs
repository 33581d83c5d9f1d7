//! Allocation service: FIFO planning plus an optimistic-concurrency write.
//!
//! The allocator itself is pure. Between reading the lots and writing the
//! decrements another caller may have drawn from the same lots, so every
//! write is guarded by the lot `version` and a conflict restarts the whole
//! read-plan-write cycle.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::db::InventoryLotRepository;
use crate::error::AppError;
use crate::inventory::{AllocationError, LotDecrement, allocate_fifo, plan_decrements};
use crate::models::{AllocationRequest, AllocationResult, InventoryMovement};

/// What a committed allocation did.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedAllocation {
    /// The plan that was written.
    pub result: AllocationResult,
    /// Per-lot changes that were written.
    pub decrements: Vec<LotDecrement>,
    /// Movement records created.
    pub movements: Vec<InventoryMovement>,
    /// Read-plan-write cycles it took (1 when nothing raced).
    pub attempts: u32,
}

/// Allocation service backed by `PostgreSQL`.
pub struct AllocationService {
    pool: PgPool,
    max_retries: u32,
}

impl AllocationService {
    /// Create a new allocation service.
    ///
    /// `max_retries` bounds how often a version conflict restarts the cycle.
    #[must_use]
    pub const fn new(pool: PgPool, max_retries: u32) -> Self {
        Self { pool, max_retries }
    }

    /// Compute a FIFO plan without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the lots cannot be loaded.
    #[instrument(skip(self, request), fields(blend_batch_id = %request.blend_batch_id, location = %request.location))]
    pub async fn preview(&self, request: &AllocationRequest) -> Result<AllocationResult, AppError> {
        let lots = InventoryLotRepository::new(&self.pool)
            .list_allocatable(request.blend_batch_id, &request.location)
            .await?;
        Ok(allocate_fifo(&lots, request))
    }

    /// Allocate stock oldest-first and persist the decrements.
    ///
    /// With `require_full`, a plan that cannot cover the whole request is
    /// rejected before anything is written. Otherwise the partial plan is
    /// committed and `result.success` reports the shortfall.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Allocation` for a rejected plan and
    /// `AppError::Database` when the write fails or conflicts persist after
    /// all retries.
    #[instrument(skip(self, request), fields(blend_batch_id = %request.blend_batch_id, location = %request.location))]
    pub async fn allocate_and_commit(
        &self,
        request: &AllocationRequest,
        require_full: bool,
        reference: Option<&str>,
    ) -> Result<CommittedAllocation, AppError> {
        let repo = InventoryLotRepository::new(&self.pool);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let lots = repo
                .list_allocatable(request.blend_batch_id, &request.location)
                .await?;
            let result = allocate_fifo(&lots, request);
            ensure_complete(&result, require_full)?;
            let decrements = plan_decrements(&lots, &result)?;

            if decrements.is_empty() {
                return Ok(CommittedAllocation {
                    result,
                    decrements,
                    movements: Vec::new(),
                    attempts,
                });
            }

            match repo.apply_decrements(&decrements, reference).await {
                Ok(movements) => {
                    info!(
                        lots = decrements.len(),
                        success = result.success,
                        attempts,
                        "Allocation committed"
                    );
                    return Ok(CommittedAllocation {
                        result,
                        decrements,
                        movements,
                        attempts,
                    });
                }
                Err(e) => {
                    let error = AppError::from(e);
                    if !should_retry(&error, attempts, self.max_retries) {
                        return Err(error);
                    }
                    warn!(%error, attempts, "Stock changed during allocation, retrying");
                }
            }
        }
    }
}

/// Whether a failed write after `attempts` cycles should restart the cycle.
///
/// `max_retries` counts restarts, so at most `max_retries + 1` cycles run.
#[must_use]
pub const fn should_retry(error: &AppError, attempts: u32, max_retries: u32) -> bool {
    error.is_transient() && attempts <= max_retries
}

/// Reject a short plan when the caller needs the whole request.
///
/// # Errors
///
/// Returns `AllocationError::Insufficient` if `require_full` is set and the
/// plan leaves demand unmet.
pub const fn ensure_complete(
    result: &AllocationResult,
    require_full: bool,
) -> Result<(), AllocationError> {
    if require_full && !result.success {
        return Err(AllocationError::Insufficient {
            remaining_75cl: result.remaining_needed_75cl,
            remaining_150cl: result.remaining_needed_150cl,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    fn result(success: bool, remaining_75cl: i32) -> AllocationResult {
        AllocationResult {
            success,
            allocations: Vec::new(),
            remaining_needed_75cl: remaining_75cl,
            remaining_needed_150cl: 0,
        }
    }

    #[test]
    fn test_conflict_retries_until_budget_spent() {
        let conflict = AppError::from(RepositoryError::Conflict("lot 4 changed".to_string()));
        assert!(should_retry(&conflict, 1, 3));
        assert!(should_retry(&conflict, 3, 3));
        assert!(!should_retry(&conflict, 4, 3));
        assert!(!should_retry(&conflict, 1, 0));
    }

    #[test]
    fn test_invalid_input_is_not_retried() {
        let invalid = AppError::from(RepositoryError::InvalidInput("negative".to_string()));
        assert!(!should_retry(&invalid, 1, 3));
        assert!(!should_retry(&AppError::from(RepositoryError::NotFound), 1, 3));
    }

    #[test]
    fn test_ensure_complete_accepts_full_plan() {
        assert_eq!(ensure_complete(&result(true, 0), true), Ok(()));
    }

    #[test]
    fn test_ensure_complete_accepts_partial_plan_when_not_required() {
        assert_eq!(ensure_complete(&result(false, 20), false), Ok(()));
    }

    #[test]
    fn test_ensure_complete_rejects_partial_plan() {
        assert_eq!(
            ensure_complete(&result(false, 20), true),
            Err(AllocationError::Insufficient {
                remaining_75cl: 20,
                remaining_150cl: 0,
            })
        );
    }
}
