//! # Database Migrations
//!
//! Embedded SQL migrations for Stockroom.
//!
//! ## Schema
//! ```text
//! 001_initial_schema.sql
//!   products.category_id      → categories  (ON DELETE SET NULL)
//!   products.supplier_id      → suppliers   (ON DELETE SET NULL)
//!   purchases.supplier_id     → suppliers   (ON DELETE SET NULL)
//!   sale_items                → sales, products
//!   purchase_items            → purchases, products
//!   stock_movements.product_id → products   (blocks product delete)
//! ```
//!
//! Applied in order on `Database::new` when `run_migrations` is set;
//! `_sqlx_migrations` records checksums. Schema changes go in a new
//! `NNN_description.sql` file, never in an applied one.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent; each migration runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((total, usize::try_from(applied).unwrap_or(0)))
}
