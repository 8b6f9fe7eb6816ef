//! # Stock Ledger
//!
//! The stock mutation engine. Every operation here is one SQLite
//! transaction that touches `products.current_stock`, appends to
//! `stock_movements`, and, for sales and purchases, writes the financial
//! rows. Either all of it commits or none of it does.
//!
//! ## Operations
//! ```text
//! ┌──────────────────┬──────────────────────────────┬────────────────────────────┐
//! │ Operation        │ Stock effect                 │ Movement                   │
//! ├──────────────────┼──────────────────────────────┼────────────────────────────┤
//! │ record_sale      │ −qty per item, never below 0 │ OUT  qty, delta −qty       │
//! │ record_purchase  │ +qty per item if RECEIVED    │ IN   qty, delta +qty       │
//! │ receive_purchase │ +qty per item                │ IN   qty, delta +qty       │
//! │ cancel_purchase  │ none                         │ none                       │
//! │ adjust_stock     │ max(0, stock + delta)        │ ADJ |delta|, delta applied │
//! └──────────────────┴──────────────────────────────┴────────────────────────────┘
//! ```
//!
//! ## Locking
//! SQLite takes the write lock on a transaction's first write. Each
//! operation therefore writes before it reads, so two concurrent
//! mutations of the same product queue on the lock (up to the busy
//! timeout) instead of both reading the same stock.
//!
//! ## Sales vs. Adjustments
//! A sale that would take stock below zero fails with
//! `InsufficientStock`. An adjustment that would do the same is clamped
//! at zero: it records a count correction, not a promise to a customer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::validation::{validate_adjustment, validate_purchase_items, validate_sale_items};
use stockroom_core::{
    CoreError, Money, MovementType, NewPurchase, NewPurchaseItem, NewSale, NewSaleItem, Product,
    Purchase, PurchaseStatus, PurchaseWithItems, SaleWithItems, StockMovement,
};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::movement::{insert_movement, MovementRecord};
use crate::repository::product::fetch_product;
use crate::repository::purchase::{
    fetch_purchase, fetch_purchase_items, insert_purchase_header, insert_purchase_item,
    transition_status,
};
use crate::repository::sale::{insert_sale_header, insert_sale_item};

/// A product whose stored stock disagrees with its movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerDiscrepancy {
    pub product_id: i64,
    pub current_stock: i64,
    pub ledger_balance: i64,
}

/// The stock mutation engine.
///
/// ## Example
/// ```rust,ignore
/// let ledger = db.ledger();
///
/// let sale = ledger
///     .record_sale(
///         &NewSale::default(),
///         &[NewSaleItem { product_id: cola.id, quantity: 2, unit_price: 99 }],
///     )
///     .await?;
/// assert_eq!(sale.sale.total_amount, 198);
/// ```
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Records a sale and its items.
    ///
    /// ## Transaction
    /// ```text
    /// BEGIN
    ///   INSERT sales (total = Σ unit_price × qty)
    ///   for each item:
    ///     UPDATE products SET stock = stock − qty WHERE stock ≥ qty
    ///       └─ 0 rows? → NotFound | InsufficientStock → ROLLBACK
    ///     INSERT sale_items
    ///     INSERT stock_movements (OUT, reference = sale id)
    /// COMMIT
    /// ```
    ///
    /// ## Errors
    /// - `InvalidQuantity` - empty item list, or an item with qty ≤ 0
    /// - `InvalidAmount` - negative price or overflowing total
    /// - `NotFound` - an item names an unknown product
    /// - `InsufficientStock` - an item asks for more than is on hand
    pub async fn record_sale(&self, sale: &NewSale, items: &[NewSaleItem]) -> DbResult<SaleWithItems> {
        validate_sale_items(items)?;

        let subtotals = items
            .iter()
            .map(|i| line_subtotal(i.unit_price, i.quantity))
            .collect::<Result<Vec<_>, _>>()?;
        let total = checked_total(&subtotals)?;
        let now = Utc::now();

        debug!(items = items.len(), total = %total, "Recording sale");

        let mut tx = self.pool.begin().await?;

        let header = insert_sale_header(&mut tx, sale, total.cents(), now).await?;
        let notes = format!("Sale #{}", header.id);

        let mut sale_items = Vec::with_capacity(items.len());
        for (item, subtotal) in items.iter().zip(&subtotals) {
            take_stock(&mut tx, item.product_id, item.quantity, now).await?;

            sale_items.push(insert_sale_item(&mut tx, header.id, item, subtotal.cents()).await?);

            let movement = MovementRecord {
                product_id: item.product_id,
                movement_type: MovementType::Out,
                quantity: item.quantity,
                delta: -item.quantity,
                reference_id: Some(header.id),
                notes: Some(&notes),
                created_at: now,
            };
            insert_movement(&mut tx, &movement).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = header.id,
            items = sale_items.len(),
            total = %total,
            "Sale recorded"
        );

        Ok(SaleWithItems {
            sale: header,
            items: sale_items,
        })
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Records a purchase and its items.
    ///
    /// A `RECEIVED` purchase posts every item at once: stock `+qty`,
    /// buying price replaced by the item's unit price (last price wins),
    /// and an IN movement. `PENDING` and `CANCELLED` purchases store rows
    /// only.
    ///
    /// ## Errors
    /// - `InvalidQuantity` / `InvalidAmount` - no items, or a bad item
    /// - `NotFound` - an item names an unknown product
    /// - `ForeignKeyViolation` - unknown supplier
    pub async fn record_purchase(
        &self,
        purchase: &NewPurchase,
        items: &[NewPurchaseItem],
    ) -> DbResult<PurchaseWithItems> {
        validate_purchase_items(items)?;

        let subtotals = items
            .iter()
            .map(|i| line_subtotal(i.unit_price, i.quantity))
            .collect::<Result<Vec<_>, _>>()?;
        let total = checked_total(&subtotals)?;
        let now = Utc::now();

        debug!(
            items = items.len(),
            total = %total,
            status = %purchase.status,
            "Recording purchase"
        );

        let mut tx = self.pool.begin().await?;

        let purchase_id = insert_purchase_header(&mut tx, purchase, total.cents(), now).await?;

        let mut purchase_items = Vec::with_capacity(items.len());
        for (item, subtotal) in items.iter().zip(&subtotals) {
            if purchase.status.posts_stock() {
                receive_stock(&mut tx, purchase_id, item.product_id, item.quantity, item.unit_price, now)
                    .await?;
            }

            let stored = insert_purchase_item(&mut tx, purchase_id, item, subtotal.cents())
                .await
                .map_err(|e| match e {
                    DbError::ForeignKeyViolation { .. } => {
                        DbError::not_found("Product", item.product_id)
                    }
                    other => other,
                })?;
            purchase_items.push(stored);
        }

        let header = load_purchase(&mut tx, purchase_id).await?;
        tx.commit().await?;

        info!(
            purchase_id,
            items = purchase_items.len(),
            total = %total,
            status = %header.status,
            "Purchase recorded"
        );

        Ok(PurchaseWithItems {
            purchase: header,
            items: purchase_items,
        })
    }

    /// Receives a pending purchase, posting all of its items.
    ///
    /// ## Errors
    /// - `NotFound` - unknown purchase
    /// - `InvalidPurchaseStatus` - purchase is not PENDING
    pub async fn receive_purchase(&self, id: i64) -> DbResult<PurchaseWithItems> {
        debug!(purchase_id = id, "Receiving purchase");
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        if !transition_status(&mut tx, id, PurchaseStatus::Pending, PurchaseStatus::Received, now).await? {
            return Err(rejected_transition(&mut tx, id, "receive").await);
        }

        let items = fetch_purchase_items(&mut tx, id).await?;
        for item in &items {
            receive_stock(&mut tx, id, item.product_id, item.quantity, item.unit_price, now).await?;
        }

        let purchase = load_purchase(&mut tx, id).await?;
        tx.commit().await?;

        info!(purchase_id = id, items = items.len(), "Purchase received");

        Ok(PurchaseWithItems { purchase, items })
    }

    /// Cancels a pending purchase. Nothing is posted.
    pub async fn cancel_purchase(&self, id: i64) -> DbResult<Purchase> {
        debug!(purchase_id = id, "Cancelling purchase");
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        if !transition_status(&mut tx, id, PurchaseStatus::Pending, PurchaseStatus::Cancelled, now).await? {
            return Err(rejected_transition(&mut tx, id, "cancel").await);
        }

        let purchase = load_purchase(&mut tx, id).await?;
        tx.commit().await?;

        info!(purchase_id = id, "Purchase cancelled");
        Ok(purchase)
    }

    // =========================================================================
    // Adjustments
    // =========================================================================

    /// Corrects a product's stock by `delta`, clamping the result at zero.
    ///
    /// The movement records `|delta|` as its quantity and the change
    /// actually applied as its `delta`; the note reads `"+5 - recount"`.
    ///
    /// ## Example
    /// ```text
    /// stock 30, adjust_stock(id, −100, "damaged")
    ///   → stock 0
    ///   → ADJUSTMENT quantity 100, delta −30, notes "-100 - damaged"
    /// ```
    ///
    /// ## Errors
    /// - `NotFound` - unknown product
    /// - `InvalidQuantity` - `delta` is zero
    pub async fn adjust_stock(&self, product_id: i64, delta: i64, reason: &str) -> DbResult<Product> {
        validate_adjustment(delta)?;
        let quantity = delta
            .checked_abs()
            .ok_or_else(|| CoreError::invalid_quantity("adjustment", delta))?;
        let now = Utc::now();

        debug!(product_id, delta, reason = %reason, "Adjusting stock");

        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE products SET updated_at = ?1 WHERE id = ?2")
            .bind(now)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        let mut product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let previous = product.current_stock;
        let new_stock = previous.saturating_add(delta).max(0);

        sqlx::query("UPDATE products SET current_stock = ?1 WHERE id = ?2")
            .bind(new_stock)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        let notes = adjustment_note(delta, reason);
        let movement = MovementRecord {
            product_id,
            movement_type: MovementType::Adjustment,
            quantity,
            delta: new_stock - previous,
            reference_id: None,
            notes: Some(&notes),
            created_at: now,
        };
        insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        if previous.saturating_add(delta) < 0 {
            warn!(product_id, previous, delta, "Adjustment clamped at zero");
        }
        info!(product_id, previous, new_stock, "Stock adjusted");

        product.current_stock = new_stock;
        product.updated_at = now;
        Ok(product)
    }

    // =========================================================================
    // Audit
    // =========================================================================

    /// Products whose `current_stock` differs from the sum of their
    /// movement deltas. Empty when the ledger is consistent.
    pub async fn audit(&self) -> DbResult<Vec<LedgerDiscrepancy>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT p.id, p.current_stock, COALESCE(SUM(m.delta), 0) AS balance
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id, p.current_stock
            HAVING p.current_stock <> COALESCE(SUM(m.delta), 0)
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, current_stock, ledger_balance)| LedgerDiscrepancy {
                product_id,
                current_stock,
                ledger_balance,
            })
            .collect())
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Decrements stock for one sale line, refusing to go below zero.
async fn take_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET current_stock = current_stock - ?1, updated_at = ?2
        WHERE id = ?3 AND current_stock >= ?1
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    match fetch_product(conn, product_id).await? {
        None => Err(DbError::not_found("Product", product_id)),
        Some(product) => {
            warn!(
                product_id,
                available = product.current_stock,
                requested = quantity,
                "Sale rejected: insufficient stock"
            );
            Err(CoreError::InsufficientStock {
                product_id,
                product: product.name,
                available: product.current_stock,
                requested: quantity,
            }
            .into())
        }
    }
}

/// Posts one received purchase line: stock, buying price, IN movement.
async fn receive_stock(
    conn: &mut SqliteConnection,
    purchase_id: i64,
    product_id: i64,
    quantity: i64,
    unit_price: i64,
    now: DateTime<Utc>,
) -> DbResult<StockMovement> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET current_stock = current_stock + ?1, buying_price = ?2, updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(quantity)
    .bind(unit_price)
    .bind(now)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    let notes = format!("Purchase #{purchase_id} received");
    let movement = MovementRecord {
        product_id,
        movement_type: MovementType::In,
        quantity,
        delta: quantity,
        reference_id: Some(purchase_id),
        notes: Some(&notes),
        created_at: now,
    };
    insert_movement(conn, &movement).await
}

async fn load_purchase(conn: &mut SqliteConnection, id: i64) -> DbResult<Purchase> {
    fetch_purchase(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase", id))
}

/// Explains why a status transition matched no row.
async fn rejected_transition(conn: &mut SqliteConnection, id: i64, action: &str) -> DbError {
    match fetch_purchase(conn, id).await {
        Ok(Some(purchase)) => CoreError::InvalidPurchaseStatus {
            purchase_id: id,
            current: purchase.status,
            action: action.to_string(),
        }
        .into(),
        Ok(None) => DbError::not_found("Purchase", id),
        Err(e) => e,
    }
}

// =============================================================================
// Money Helpers
// =============================================================================

fn line_subtotal(unit_price: i64, quantity: i64) -> Result<Money, CoreError> {
    Money::from_cents(unit_price)
        .checked_times(quantity)
        .ok_or_else(|| CoreError::invalid_amount("subtotal", "overflows"))
}

fn checked_total(subtotals: &[Money]) -> Result<Money, CoreError> {
    subtotals
        .iter()
        .try_fold(Money::zero(), |acc, s| acc.checked_add(*s))
        .ok_or_else(|| CoreError::invalid_amount("total_amount", "overflows"))
}

fn adjustment_note(delta: i64, reason: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        format!("{delta:+}")
    } else {
        format!("{delta:+} - {reason}")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::{Database, DbConfig};
    use stockroom_core::{NewProduct, PaymentMethod};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, stock: i64, min: i64) -> Product {
        db.products()
            .create(&NewProduct::new(name).prices(400, 500).stock(stock, min))
            .await
            .unwrap()
    }

    fn sale_line(product_id: i64, quantity: i64) -> NewSaleItem {
        NewSaleItem {
            product_id,
            quantity,
            unit_price: 500,
        }
    }

    fn purchase_line(product_id: i64, quantity: i64, unit_price: i64) -> NewPurchaseItem {
        NewPurchaseItem {
            product_id,
            quantity,
            unit_price,
        }
    }

    async fn assert_consistent(db: &Database) {
        assert_eq!(db.ledger().audit().await.unwrap(), vec![]);
    }

    #[test]
    fn test_adjustment_note() {
        assert_eq!(adjustment_note(5, "recount"), "+5 - recount");
        assert_eq!(adjustment_note(-100, " damaged "), "-100 - damaged");
        assert_eq!(adjustment_note(3, ""), "+3");
    }

    #[test]
    fn test_total_overflow() {
        assert!(line_subtotal(i64::MAX, 2).is_err());
        let huge = [Money::from_cents(i64::MAX), Money::from_cents(1)];
        assert!(checked_total(&huge).is_err());
    }

    #[tokio::test]
    async fn test_record_sale() {
        let db = setup().await;
        let cola = product(&db, "Cola", 10, 2).await;
        let chips = product(&db, "Chips", 4, 1).await;

        let sale = db
            .ledger()
            .record_sale(
                &NewSale {
                    payment_method: PaymentMethod::MobileMoney,
                    customer_name: Some("Ama".to_string()),
                },
                &[sale_line(cola.id, 3), sale_line(chips.id, 4)],
            )
            .await
            .unwrap();

        assert_eq!(sale.sale.total_amount, 3500);
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].subtotal, 1500);

        assert_eq!(db.products().get(cola.id).await.unwrap().current_stock, 7);
        assert_eq!(db.products().get(chips.id).await.unwrap().current_stock, 0);

        let outs = db
            .movements()
            .by_reference(MovementType::Out, sale.sale.id)
            .await
            .unwrap();
        assert_eq!(outs.len(), 2);
        assert_eq!(outs[0].delta, -3);

        let stored = db.sales().get_detailed(sale.sale.id).await.unwrap();
        assert_eq!(stored.sale.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(stored.items[1].product_name, "Chips");

        assert_consistent(&db).await;
    }

    #[tokio::test]
    async fn test_sale_insufficient_stock_leaves_no_trace() {
        let db = setup().await;
        let cola = product(&db, "Cola", 2, 1).await;

        let err = db
            .ledger()
            .record_sale(&NewSale::default(), &[sale_line(cola.id, 3)])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert_eq!(db.products().get(cola.id).await.unwrap().current_stock, 2);
        assert_eq!(db.movements().count(cola.id).await.unwrap(), 1); // opening balance
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sale_rolls_back_earlier_items() {
        let db = setup().await;
        let cola = product(&db, "Cola", 10, 1).await;

        let err = db
            .ledger()
            .record_sale(&NewSale::default(), &[sale_line(cola.id, 4), sale_line(9999, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(db.products().get(cola.id).await.unwrap().current_stock, 10);
        assert_eq!(db.movements().count(cola.id).await.unwrap(), 1);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_consistent(&db).await;
    }

    #[tokio::test]
    async fn test_sale_validation() {
        let db = setup().await;
        let cola = product(&db, "Cola", 10, 1).await;

        let err = db.ledger().record_sale(&NewSale::default(), &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);

        let err = db
            .ledger()
            .record_purchase(&NewPurchase::default(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert!(db.purchases().list().await.unwrap().is_empty());

        let err = db
            .ledger()
            .record_sale(&NewSale::default(), &[sale_line(cola.id, 0)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);

        let mut negative = sale_line(cola.id, 1);
        negative.unit_price = -1;
        let err = db
            .ledger()
            .record_sale(&NewSale::default(), &[negative])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
    }

    #[tokio::test]
    async fn test_received_purchase_posts_stock_and_price() {
        let db = setup().await;
        let cola = product(&db, "Cola", 5, 2).await;
        assert_eq!(cola.buying_price, 400);

        let purchase = db
            .ledger()
            .record_purchase(&NewPurchase::default(), &[purchase_line(cola.id, 10, 500)])
            .await
            .unwrap();

        assert_eq!(purchase.purchase.status, PurchaseStatus::Received);
        assert_eq!(purchase.purchase.total_amount, 5000);

        let stored = db.products().get(cola.id).await.unwrap();
        assert_eq!(stored.current_stock, 15);
        assert_eq!(stored.buying_price, 500);

        let ins = db
            .movements()
            .by_reference(MovementType::In, purchase.purchase.id)
            .await
            .unwrap();
        assert_eq!(ins.len(), 1);
        assert_eq!(ins[0].quantity, 10);
        assert_eq!(
            ins[0].notes.as_deref(),
            Some(format!("Purchase #{} received", purchase.purchase.id).as_str())
        );

        assert_consistent(&db).await;
    }

    #[tokio::test]
    async fn test_purchase_with_supplier_name() {
        let db = setup().await;
        let cola = product(&db, "Cola", 0, 2).await;
        let supplier = db
            .suppliers()
            .create(&stockroom_core::NewSupplier {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let purchase = db
            .ledger()
            .record_purchase(
                &NewPurchase {
                    supplier_id: Some(supplier.id),
                    status: PurchaseStatus::Received,
                },
                &[purchase_line(cola.id, 1, 300)],
            )
            .await
            .unwrap();
        assert_eq!(purchase.purchase.supplier_name.as_deref(), Some("Acme"));

        let listed = db.purchases().list().await.unwrap();
        assert_eq!(listed[0].supplier_name.as_deref(), Some("Acme"));

        let detail = db.purchases().get_detailed(purchase.purchase.id).await.unwrap();
        assert_eq!(detail.items[0].product_name, "Cola");
    }

    #[tokio::test]
    async fn test_pending_purchase_lifecycle() {
        let db = setup().await;
        let cola = product(&db, "Cola", 5, 2).await;

        let pending = db
            .ledger()
            .record_purchase(
                &NewPurchase {
                    supplier_id: None,
                    status: PurchaseStatus::Pending,
                },
                &[purchase_line(cola.id, 10, 450)],
            )
            .await
            .unwrap();

        // nothing posted yet
        let stored = db.products().get(cola.id).await.unwrap();
        assert_eq!(stored.current_stock, 5);
        assert_eq!(stored.buying_price, 400);

        let received = db.ledger().receive_purchase(pending.purchase.id).await.unwrap();
        assert_eq!(received.purchase.status, PurchaseStatus::Received);
        assert_eq!(received.items.len(), 1);

        let stored = db.products().get(cola.id).await.unwrap();
        assert_eq!(stored.current_stock, 15);
        assert_eq!(stored.buying_price, 450);

        // second receive is rejected without posting again
        let err = db.ledger().receive_purchase(pending.purchase.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        assert_eq!(db.products().get(cola.id).await.unwrap().current_stock, 15);

        let err = db.ledger().cancel_purchase(pending.purchase.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidPurchaseStatus {
                current: PurchaseStatus::Received,
                ..
            })
        ));

        assert_consistent(&db).await;
    }

    #[tokio::test]
    async fn test_cancel_purchase() {
        let db = setup().await;
        let cola = product(&db, "Cola", 5, 2).await;

        let pending = db
            .ledger()
            .record_purchase(
                &NewPurchase {
                    supplier_id: None,
                    status: PurchaseStatus::Pending,
                },
                &[purchase_line(cola.id, 10, 450)],
            )
            .await
            .unwrap();

        let cancelled = db.ledger().cancel_purchase(pending.purchase.id).await.unwrap();
        assert_eq!(cancelled.status, PurchaseStatus::Cancelled);

        let err = db.ledger().receive_purchase(pending.purchase.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        assert_eq!(db.products().get(cola.id).await.unwrap().current_stock, 5);

        let err = db.ledger().cancel_purchase(4242).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_purchase_unknown_product_rolls_back() {
        let db = setup().await;
        let cola = product(&db, "Cola", 5, 2).await;

        for status in [PurchaseStatus::Received, PurchaseStatus::Pending] {
            let err = db
                .ledger()
                .record_purchase(
                    &NewPurchase {
                        supplier_id: None,
                        status,
                    },
                    &[purchase_line(cola.id, 3, 500), purchase_line(777, 1, 100)],
                )
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        let stored = db.products().get(cola.id).await.unwrap();
        assert_eq!(stored.current_stock, 5);
        assert_eq!(stored.buying_price, 400);
        assert!(db.purchases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjust_stock_clamps_at_zero() {
        let db = setup().await;
        let crates = product(&db, "Crates", 30, 5).await;

        let adjusted = db.ledger().adjust_stock(crates.id, -100, "damaged").await.unwrap();
        assert_eq!(adjusted.current_stock, 0);

        let history = db.movements().history(crates.id, Some(1)).await.unwrap();
        let adj = &history[0];
        assert_eq!(adj.movement_type, MovementType::Adjustment);
        assert_eq!(adj.quantity, 100);
        assert_eq!(adj.delta, -30);
        assert_eq!(adj.notes.as_deref(), Some("-100 - damaged"));

        assert_eq!(db.products().get(crates.id).await.unwrap().current_stock, 0);
        assert_consistent(&db).await;
    }

    #[tokio::test]
    async fn test_adjust_stock_errors() {
        let db = setup().await;
        let cola = product(&db, "Cola", 3, 1).await;

        let err = db.ledger().adjust_stock(999, 5, "found").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = db.ledger().adjust_stock(cola.id, 0, "noop").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);

        let up = db.ledger().adjust_stock(cola.id, 7, "recount").await.unwrap();
        assert_eq!(up.current_stock, 10);
    }

    #[tokio::test]
    async fn test_ledger_invariant_over_mixed_sequence() {
        let db = setup().await;
        let a = product(&db, "A", 10, 2).await;
        let b = product(&db, "B", 0, 2).await;
        let ledger = db.ledger();

        ledger
            .record_purchase(&NewPurchase::default(), &[purchase_line(b.id, 8, 100)])
            .await
            .unwrap();
        ledger
            .record_sale(&NewSale::default(), &[sale_line(a.id, 4), sale_line(b.id, 3)])
            .await
            .unwrap();
        ledger.adjust_stock(a.id, -50, "shrinkage").await.unwrap();
        ledger.adjust_stock(b.id, 2, "found").await.unwrap();
        let _ = ledger
            .record_sale(&NewSale::default(), &[sale_line(b.id, 100)])
            .await
            .unwrap_err();

        for p in [&a, &b] {
            let stock = db.products().get(p.id).await.unwrap().current_stock;
            assert_eq!(stock, db.movements().ledger_balance(p.id).await.unwrap());
        }
        assert_eq!(db.products().get(a.id).await.unwrap().current_stock, 0);
        assert_eq!(db.products().get(b.id).await.unwrap().current_stock, 7);
        assert_consistent(&db).await;
    }

    #[tokio::test]
    async fn test_audit_reports_direct_writes() {
        let db = setup().await;
        let cola = product(&db, "Cola", 5, 1).await;

        sqlx::query("UPDATE products SET current_stock = 9 WHERE id = ?1")
            .bind(cola.id)
            .execute(db.pool())
            .await
            .unwrap();

        let report = db.ledger().audit().await.unwrap();
        assert_eq!(
            report,
            vec![LedgerDiscrepancy {
                product_id: cola.id,
                current_stock: 9,
                ledger_balance: 5,
            }]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_do_not_oversell() {
        let path = std::env::temp_dir().join(format!(
            "stockroom-ledger-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let cola = product(&db, "Cola", 5, 1).await;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = db.ledger();
                let id = cola.id;
                tokio::spawn(async move {
                    ledger
                        .record_sale(&NewSale::default(), &[sale_line(id, 2)])
                        .await
                })
            })
            .collect();

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 2,
                Err(e) => assert_eq!(e.kind(), ErrorKind::InsufficientStock),
            }
        }

        assert_eq!(sold, 4);
        assert_eq!(db.products().get(cola.id).await.unwrap().current_stock, 1);
        assert_consistent(&db).await;

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
