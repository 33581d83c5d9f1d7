//! Database operations for inventory lots and their movements.
//!
//! Writes that change quantities are guarded by the lot's `version` column.
//! A lot that changed between planning and writing fails the whole
//! transaction with [`RepositoryError::Conflict`].

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use cider_cellar_core::{BlendBatchId, InventoryLotId, InventoryMovementId, LotStatus, MovementType};

use super::blend::BlendRepository;
use super::{RepositoryError, is_unique_violation};
use crate::inventory::{LotDecrement, generate_lot_number, with_sequence_suffix};
use crate::models::{CreateLotInput, InventoryLot, InventoryMovement, LotFilter};

const LOT_COLUMNS: &str = "
    id, blend_batch_id, lot_number, bottling_date, location,
    initial_quantity_75cl, initial_quantity_150cl,
    current_quantity_75cl, current_quantity_150cl,
    status, version, notes";

/// Generated lot numbers tried before giving up on concurrent inserts.
const MAX_LOT_NUMBER_ATTEMPTS: u32 = 5;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for inventory lot queries.
#[derive(Debug, sqlx::FromRow)]
struct InventoryLotRow {
    id: i32,
    blend_batch_id: i32,
    lot_number: String,
    bottling_date: NaiveDate,
    location: String,
    initial_quantity_75cl: i32,
    initial_quantity_150cl: i32,
    current_quantity_75cl: i32,
    current_quantity_150cl: i32,
    status: LotStatus,
    version: i32,
    notes: Option<String>,
}

impl From<InventoryLotRow> for InventoryLot {
    fn from(row: InventoryLotRow) -> Self {
        Self {
            id: InventoryLotId::new(row.id),
            blend_batch_id: BlendBatchId::new(row.blend_batch_id),
            lot_number: row.lot_number,
            bottling_date: row.bottling_date,
            location: row.location,
            initial_quantity_75cl: row.initial_quantity_75cl,
            initial_quantity_150cl: row.initial_quantity_150cl,
            current_quantity_75cl: row.current_quantity_75cl,
            current_quantity_150cl: row.current_quantity_150cl,
            status: row.status,
            version: row.version,
            notes: row.notes,
        }
    }
}

/// Internal row type for movement queries.
#[derive(Debug, sqlx::FromRow)]
struct InventoryMovementRow {
    id: i32,
    lot_id: i32,
    movement_type: MovementType,
    quantity_75cl: i32,
    quantity_150cl: i32,
    reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<InventoryMovementRow> for InventoryMovement {
    fn from(row: InventoryMovementRow) -> Self {
        Self {
            id: InventoryMovementId::new(row.id),
            lot_id: InventoryLotId::new(row.lot_id),
            movement_type: row.movement_type,
            quantity_75cl: row.quantity_75cl,
            quantity_150cl: row.quantity_150cl,
            reference: row.reference,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory lot database operations.
pub struct InventoryLotRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryLotRepository<'a> {
    /// Create a new inventory lot repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Lot CRUD
    // =========================================================================

    /// Create a new lot on bottling.
    ///
    /// When `input.lot_number` is absent it is generated from the blend name
    /// and bottling date, with a `-N` suffix if that number is already used.
    /// Uniqueness is enforced by the `lot_number` key: a generated number
    /// lost to a concurrent insert is regenerated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidInput` for negative quantities or a
    /// supplied lot number that is taken, `RepositoryError::NotFound` if the
    /// blend does not exist and a lot number must be generated,
    /// `RepositoryError::Conflict` if concurrent inserts kept taking the
    /// generated number, or `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, input), fields(blend_batch_id = %input.blend_batch_id))]
    pub async fn create_lot(&self, input: &CreateLotInput) -> Result<InventoryLot, RepositoryError> {
        validate_lot_input(input)?;

        let mut attempts = 0;
        loop {
            attempts += 1;

            let lot_number = match &input.lot_number {
                Some(number) => number.clone(),
                None => self.next_lot_number(input).await?,
            };

            match self.insert_lot(input, &lot_number).await {
                Ok(row) => {
                    debug!(lot_id = row.id, lot_number = %row.lot_number, "Created inventory lot");
                    return Ok(row.into());
                }
                Err(e) if is_unique_violation(&e) => {
                    if input.lot_number.is_some() {
                        return Err(RepositoryError::InvalidInput(format!(
                            "lot number {lot_number} is already in use"
                        )));
                    }
                    if attempts >= MAX_LOT_NUMBER_ATTEMPTS {
                        return Err(RepositoryError::Conflict(format!(
                            "no free lot number after {attempts} attempts, last tried {lot_number}"
                        )));
                    }
                    warn!(%lot_number, attempts, "Lot number taken concurrently, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// First free lot number for the blend and bottling date of `input`.
    async fn next_lot_number(&self, input: &CreateLotInput) -> Result<String, RepositoryError> {
        let name = BlendRepository::new(self.pool)
            .name(input.blend_batch_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let base = generate_lot_number(&name, input.bottling_date);
        let taken: Vec<String> = sqlx::query_scalar(
            "SELECT lot_number FROM inventory_lot
            WHERE lot_number = $1 OR lot_number LIKE $1 || '-%'",
        )
        .bind(&base)
        .fetch_all(self.pool)
        .await?;

        Ok(with_sequence_suffix(&base, &taken))
    }

    async fn insert_lot(
        &self,
        input: &CreateLotInput,
        lot_number: &str,
    ) -> Result<InventoryLotRow, sqlx::Error> {
        sqlx::query_as(&format!(
            "INSERT INTO inventory_lot (
                blend_batch_id, lot_number, bottling_date, location,
                initial_quantity_75cl, initial_quantity_150cl,
                current_quantity_75cl, current_quantity_150cl, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $5, $6, $7)
            RETURNING {LOT_COLUMNS}"
        ))
        .bind(input.blend_batch_id.as_i32())
        .bind(lot_number)
        .bind(input.bottling_date)
        .bind(&input.location)
        .bind(input.quantity_75cl)
        .bind(input.quantity_150cl)
        .bind(&input.notes)
        .fetch_one(self.pool)
        .await
    }

    /// Get an inventory lot by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_lot(&self, id: InventoryLotId) -> Result<Option<InventoryLot>, RepositoryError> {
        let row: Option<InventoryLotRow> =
            sqlx::query_as(&format!("SELECT {LOT_COLUMNS} FROM inventory_lot WHERE id = $1"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// List lots with filtering, oldest bottling first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_lots(&self, filter: &LotFilter) -> Result<Vec<InventoryLot>, RepositoryError> {
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);

        let rows: Vec<InventoryLotRow> = sqlx::query_as(&format!(
            "SELECT {LOT_COLUMNS}
            FROM inventory_lot
            WHERE
                ($1::int IS NULL OR blend_batch_id = $1)
                AND ($2::text IS NULL OR location = $2)
                AND ($3::lot_status IS NULL OR status = $3)
                AND ($4::bool IS NULL OR NOT $4
                     OR current_quantity_75cl > 0 OR current_quantity_150cl > 0)
            ORDER BY bottling_date ASC, id ASC
            LIMIT $5 OFFSET $6"
        ))
        .bind(filter.blend_batch_id.map(|id| id.as_i32()))
        .bind(&filter.location)
        .bind(filter.status)
        .bind(filter.has_remaining)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active lots of one blend at one location, in FIFO order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_allocatable(
        &self,
        blend_batch_id: BlendBatchId,
        location: &str,
    ) -> Result<Vec<InventoryLot>, RepositoryError> {
        let rows: Vec<InventoryLotRow> = sqlx::query_as(&format!(
            "SELECT {LOT_COLUMNS}
            FROM inventory_lot
            WHERE blend_batch_id = $1 AND location = $2 AND status = 'active'
                AND (current_quantity_75cl > 0 OR current_quantity_150cl > 0)
            ORDER BY bottling_date ASC, id ASC"
        ))
        .bind(blend_batch_id.as_i32())
        .bind(location)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every active lot, for stock-level checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active_lots(&self) -> Result<Vec<InventoryLot>, RepositoryError> {
        let rows: Vec<InventoryLotRow> = sqlx::query_as(&format!(
            "SELECT {LOT_COLUMNS}
            FROM inventory_lot
            WHERE status = 'active'
            ORDER BY blend_batch_id, location, bottling_date ASC, id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Change the status of a lot (e.g. reserve or release it).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the lot does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: InventoryLotId,
        status: LotStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE inventory_lot
            SET status = $2, version = version + 1, updated_at = NOW()
            WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Write an allocation plan in one transaction.
    ///
    /// Each lot update only matches the row version the plan was computed
    /// against. One allocation movement is recorded per lot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any lot changed since planning
    /// (nothing is written), or `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, decrements), fields(lots = decrements.len()))]
    pub async fn apply_decrements(
        &self,
        decrements: &[LotDecrement],
        reference: Option<&str>,
    ) -> Result<Vec<InventoryMovement>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut movements = Vec::with_capacity(decrements.len());

        for decrement in decrements {
            let updated = sqlx::query(
                "UPDATE inventory_lot
                SET current_quantity_75cl = $2,
                    current_quantity_150cl = $3,
                    status = $4,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $1 AND version = $5",
            )
            .bind(decrement.lot_id.as_i32())
            .bind(decrement.new_quantity_75cl)
            .bind(decrement.new_quantity_150cl)
            .bind(decrement.new_status)
            .bind(decrement.expected_version)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // Dropping `tx` rolls back the updates made so far.
                return Err(RepositoryError::Conflict(format!(
                    "lot {} changed since allocation was planned",
                    decrement.lot_id
                )));
            }

            let movement: InventoryMovementRow = sqlx::query_as(
                "INSERT INTO inventory_movement (
                    lot_id, movement_type, quantity_75cl, quantity_150cl, reference
                )
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, lot_id, movement_type, quantity_75cl, quantity_150cl,
                    reference, created_at",
            )
            .bind(decrement.lot_id.as_i32())
            .bind(MovementType::Allocation)
            .bind(decrement.taken_75cl)
            .bind(decrement.taken_150cl)
            .bind(reference)
            .fetch_one(&mut *tx)
            .await?;

            movements.push(movement.into());
        }

        tx.commit().await?;
        debug!(movements = movements.len(), "Applied allocation");
        Ok(movements)
    }

    /// Movement history of a lot, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_movements(
        &self,
        lot_id: InventoryLotId,
    ) -> Result<Vec<InventoryMovement>, RepositoryError> {
        let rows: Vec<InventoryMovementRow> = sqlx::query_as(
            "SELECT id, lot_id, movement_type, quantity_75cl, quantity_150cl,
                reference, created_at
            FROM inventory_movement
            WHERE lot_id = $1
            ORDER BY created_at DESC, id DESC",
        )
        .bind(lot_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Reject lot input the schema would refuse.
fn validate_lot_input(input: &CreateLotInput) -> Result<(), RepositoryError> {
    if input.quantity_75cl < 0 || input.quantity_150cl < 0 {
        return Err(RepositoryError::InvalidInput(
            "lot quantities must not be negative".to_string(),
        ));
    }
    if input.location.trim().is_empty() {
        return Err(RepositoryError::InvalidInput(
            "lot location must not be blank".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(q75: i32, q150: i32) -> CreateLotInput {
        CreateLotInput {
            blend_batch_id: BlendBatchId::new(1),
            lot_number: None,
            bottling_date: NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(),
            location: "cellar-a".to_string(),
            quantity_75cl: q75,
            quantity_150cl: q150,
            notes: None,
        }
    }

    #[test]
    fn test_validate_accepts_bottling_run() {
        assert!(validate_lot_input(&input(480, 0)).is_ok());
    }

    #[test]
    fn test_negative_quantity_is_invalid_input() {
        let err = validate_lot_input(&input(-1, 0)).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidInput(_)));
        let err = validate_lot_input(&input(0, -6)).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidInput(_)));
    }

    #[test]
    fn test_blank_location_is_invalid_input() {
        let mut blank = input(10, 0);
        blank.location = "  ".to_string();
        assert!(matches!(
            validate_lot_input(&blank),
            Err(RepositoryError::InvalidInput(_))
        ));
    }
}
