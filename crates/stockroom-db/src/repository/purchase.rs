//! # Purchase Repository
//!
//! Reads for purchases and purchase items, plus the row writers the stock
//! ledger calls inside its purchase transactions.
//!
//! ## Status Lifecycle
//! ```text
//!            record_purchase(status = RECEIVED) ──► stock posted at once
//!            record_purchase(status = PENDING)
//!                     │
//!        ┌────────────┴────────────┐
//!        ▼                         ▼
//!  receive_purchase          cancel_purchase
//!  PENDING → RECEIVED        PENDING → CANCELLED
//!  (stock posted)            (nothing posted)
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::{
    NewPurchase, NewPurchaseItem, Purchase, PurchaseDetail, PurchaseItem, PurchaseItemDetail,
    PurchaseStatus, PurchaseWithItems,
};

use crate::error::{DbError, DbResult};

const PURCHASE_SELECT: &str = r#"
    SELECT
        pu.id, pu.supplier_id, s.name AS supplier_name,
        pu.total_amount, pu.status, pu.created_at, pu.updated_at
    FROM purchases pu
    LEFT JOIN suppliers s ON s.id = pu.supplier_id
"#;

const PURCHASE_ITEM_COLUMNS: &str = "id, purchase_id, product_id, quantity, unit_price, subtotal";

// =============================================================================
// Transaction Writers
// =============================================================================

pub(crate) async fn insert_purchase_header(
    conn: &mut SqliteConnection,
    purchase: &NewPurchase,
    total_amount: i64,
    created_at: DateTime<Utc>,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO purchases (supplier_id, total_amount, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(purchase.supplier_id)
    .bind(total_amount)
    .bind(purchase.status)
    .bind(created_at)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub(crate) async fn insert_purchase_item(
    conn: &mut SqliteConnection,
    purchase_id: i64,
    item: &NewPurchaseItem,
    subtotal: i64,
) -> DbResult<PurchaseItem> {
    let result = sqlx::query(
        r#"
        INSERT INTO purchase_items (purchase_id, product_id, quantity, unit_price, subtotal)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(purchase_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(subtotal)
    .execute(&mut *conn)
    .await?;

    Ok(PurchaseItem {
        id: result.last_insert_rowid(),
        purchase_id,
        product_id: item.product_id,
        quantity: item.quantity,
        unit_price: item.unit_price,
        subtotal,
    })
}

/// Moves a purchase from `from` to `to`; returns false if it was not in `from`.
pub(crate) async fn transition_status(
    conn: &mut SqliteConnection,
    id: i64,
    from: PurchaseStatus,
    to: PurchaseStatus,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE purchases SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(to)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn fetch_purchase(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Purchase>> {
    let sql = format!("{PURCHASE_SELECT} WHERE pu.id = ?1");
    let purchase = sqlx::query_as::<_, Purchase>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(purchase)
}

pub(crate) async fn fetch_purchase_items(
    conn: &mut SqliteConnection,
    purchase_id: i64,
) -> DbResult<Vec<PurchaseItem>> {
    let sql = format!(
        "SELECT {PURCHASE_ITEM_COLUMNS} FROM purchase_items WHERE purchase_id = ?1 ORDER BY id"
    );
    let items = sqlx::query_as::<_, PurchaseItem>(&sql)
        .bind(purchase_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for purchase reads.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        fetch_purchase(&mut conn, id).await
    }

    pub async fn get(&self, id: i64) -> DbResult<Purchase> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))
    }

    /// All purchases with supplier names, newest first.
    pub async fn list(&self) -> DbResult<Vec<Purchase>> {
        let sql = format!("{PURCHASE_SELECT} ORDER BY pu.created_at DESC, pu.id DESC");
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }

    pub async fn items(&self, purchase_id: i64) -> DbResult<Vec<PurchaseItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_purchase_items(&mut conn, purchase_id).await
    }

    pub async fn get_with_items(&self, id: i64) -> DbResult<PurchaseWithItems> {
        let purchase = self.get(id).await?;
        let items = self.items(id).await?;
        Ok(PurchaseWithItems { purchase, items })
    }

    /// Purchase with each item joined to its product's name and SKU.
    pub async fn get_detailed(&self, id: i64) -> DbResult<PurchaseDetail> {
        let purchase = self.get(id).await?;

        let items = sqlx::query_as::<_, PurchaseItemDetail>(
            r#"
            SELECT
                pi.id, pi.purchase_id, pi.product_id, pi.quantity, pi.unit_price, pi.subtotal,
                p.name AS product_name,
                p.sku AS product_sku
            FROM purchase_items pi
            INNER JOIN products p ON p.id = pi.product_id
            WHERE pi.purchase_id = ?1
            ORDER BY pi.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PurchaseDetail { purchase, items })
    }
}
