//! # Sale Repository
//!
//! Reads for sales and sale items, plus the row writers the stock ledger
//! calls inside its sale transaction.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  StockLedger::record_sale (one transaction)                            │
//! │     ├── insert_sale_header()  total = Σ subtotal                        │
//! │     ├── per item: stock −qty, insert_sale_item(), OUT movement          │
//! │     └── COMMIT                                                          │
//! │                                                                         │
//! │  Afterwards: read-only. No update, no delete (financial record).       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::{NewSale, NewSaleItem, Sale, SaleDetail, SaleItem, SaleItemDetail, SaleWithItems};

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "id, total_amount, payment_method, customer_name, created_at";
const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, quantity, unit_price, subtotal";

// =============================================================================
// Transaction Writers
// =============================================================================

pub(crate) async fn insert_sale_header(
    conn: &mut SqliteConnection,
    sale: &NewSale,
    total_amount: i64,
    created_at: DateTime<Utc>,
) -> DbResult<Sale> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales (total_amount, payment_method, customer_name, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(total_amount)
    .bind(sale.payment_method)
    .bind(&sale.customer_name)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(Sale {
        id: result.last_insert_rowid(),
        total_amount,
        payment_method: sale.payment_method,
        customer_name: sale.customer_name.clone(),
        created_at,
    })
}

pub(crate) async fn insert_sale_item(
    conn: &mut SqliteConnection,
    sale_id: i64,
    item: &NewSaleItem,
    subtotal: i64,
) -> DbResult<SaleItem> {
    let result = sqlx::query(
        r#"
        INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, subtotal)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(sale_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(subtotal)
    .execute(&mut *conn)
    .await?;

    Ok(SaleItem {
        id: result.last_insert_rowid(),
        sale_id,
        product_id: item.product_id,
        quantity: item.quantity,
        unit_price: item.unit_price,
        subtotal,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    pub async fn get(&self, id: i64) -> DbResult<Sale> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// All sales, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id DESC");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Items of a sale in entry order.
    pub async fn items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let sql = format!("SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY id");
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn get_with_items(&self, id: i64) -> DbResult<SaleWithItems> {
        let sale = self.get(id).await?;
        let items = self.items(id).await?;
        Ok(SaleWithItems { sale, items })
    }

    /// Sale with each item joined to its product's name and SKU.
    pub async fn get_detailed(&self, id: i64) -> DbResult<SaleDetail> {
        let sale = self.get(id).await?;

        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT
                si.id, si.sale_id, si.product_id, si.quantity, si.unit_price, si.subtotal,
                p.name AS product_name,
                p.sku AS product_sku
            FROM sale_items si
            INNER JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SaleDetail { sale, items })
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
