//! # Movement Repository
//!
//! The append-only stock movement log.
//!
//! ## Ledger Shape
//! ```text
//! stock_movements (never UPDATEd, never DELETEd)
//! ┌────┬─────────┬────────────┬──────────┬───────┬──────────────┐
//! │ id │ product │ type       │ quantity │ delta │ reference_id │
//! ├────┼─────────┼────────────┼──────────┼───────┼──────────────┤
//! │  1 │    7    │ IN         │    10    │  +10  │  (opening)   │
//! │  2 │    7    │ OUT        │     3    │   -3  │  sale #1     │
//! │  3 │    7    │ ADJUSTMENT │   100    │   -7  │  (clamped)   │
//! └────┴─────────┴────────────┴──────────┴───────┴──────────────┘
//!                               SUM(delta) = 0 = products.current_stock
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::validation::validate_quantity;
use stockroom_core::{MovementType, StockMovement, ValidationError};
use tracing::debug;

use crate::error::{DbError, DbResult};

const MOVEMENT_COLUMNS: &str =
    "id, product_id, movement_type, quantity, delta, reference_id, notes, created_at";

/// A movement about to be written inside a ledger transaction.
#[derive(Debug, Clone)]
pub(crate) struct MovementRecord<'a> {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub delta: i64,
    pub reference_id: Option<i64>,
    pub notes: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Inserts a movement on an open connection or transaction.
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    record: &MovementRecord<'_>,
) -> DbResult<StockMovement> {
    validate_quantity("quantity", record.quantity)?;

    let result = sqlx::query(
        r#"
        INSERT INTO stock_movements (
            product_id, movement_type, quantity, delta, reference_id, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(record.product_id)
    .bind(record.movement_type)
    .bind(record.quantity)
    .bind(record.delta)
    .bind(record.reference_id)
    .bind(record.notes)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(StockMovement {
        id: result.last_insert_rowid(),
        product_id: record.product_id,
        movement_type: record.movement_type,
        quantity: record.quantity,
        delta: record.delta,
        reference_id: record.reference_id,
        notes: record.notes.map(str::to_string),
        created_at: record.created_at,
    })
}

/// Newest-first movements for one product.
pub(crate) async fn recent_movements(
    conn: &mut SqliteConnection,
    product_id: i64,
    limit: i64,
) -> DbResult<Vec<StockMovement>> {
    let sql = format!(
        "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
         WHERE product_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
    );

    let movements = sqlx::query_as::<_, StockMovement>(&sql)
        .bind(product_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

    Ok(movements)
}

/// Repository for the movement log.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
    default_limit: i64,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool, default_limit: i64) -> Self {
        MovementRepository {
            pool,
            default_limit,
        }
    }

    /// Appends one movement on its own.
    ///
    /// This writes the log only; `current_stock` is untouched. Business
    /// events go through the stock ledger, which pairs every append with
    /// the matching stock update.
    ///
    /// Only IN and OUT can be appended here. An adjustment's applied delta
    /// depends on the stock it clamps against, so ADJUSTMENT goes through
    /// `StockLedger::adjust_stock`.
    ///
    /// ## Errors
    /// - `InvalidQuantity` if `quantity <= 0`
    /// - `NotFound` if the product does not exist
    /// - `ConstraintViolation` (`InvalidFormat`) for `MovementType::Adjustment`
    pub async fn append(
        &self,
        product_id: i64,
        movement_type: MovementType,
        quantity: i64,
        reference_id: Option<i64>,
        notes: Option<&str>,
    ) -> DbResult<StockMovement> {
        debug!(product_id, %movement_type, quantity, "Appending movement");

        let delta = match movement_type {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
            MovementType::Adjustment => {
                return Err(ValidationError::InvalidFormat {
                    field: "movement_type".to_string(),
                    reason: "adjustments are recorded with StockLedger::adjust_stock".to_string(),
                }
                .into());
            }
        };

        let mut conn = self.pool.acquire().await?;
        let record = MovementRecord {
            product_id,
            movement_type,
            quantity,
            delta,
            reference_id,
            notes,
            created_at: Utc::now(),
        };

        insert_movement(&mut conn, &record)
            .await
            .map_err(|e| match e {
                DbError::ForeignKeyViolation { .. } => DbError::not_found("Product", product_id),
                other => other,
            })
    }

    /// Most-recent-first history, `limit` entries at most.
    ///
    /// `None` uses the configured default (50).
    pub async fn history(&self, product_id: i64, limit: Option<i64>) -> DbResult<Vec<StockMovement>> {
        let limit = limit.unwrap_or(self.default_limit).max(0);
        debug!(product_id, limit, "Loading movement history");

        let mut conn = self.pool.acquire().await?;
        recent_movements(&mut conn, product_id, limit).await
    }

    /// Movements that reference a sale or purchase id.
    pub async fn by_reference(
        &self,
        movement_type: MovementType,
        reference_id: i64,
    ) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE movement_type = ?1 AND reference_id = ?2 ORDER BY id"
        );

        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(movement_type)
            .bind(reference_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Signed sum of every movement for the product.
    ///
    /// Equals `products.current_stock` whenever stock has only been moved
    /// through the ledger.
    pub async fn ledger_balance(&self, product_id: i64) -> DbResult<i64> {
        let balance: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(delta), 0) FROM stock_movements WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    pub async fn count(&self, product_id: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
