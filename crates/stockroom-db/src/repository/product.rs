//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD, with stock excluded from updates
//! - Substring search over name, SKU and description
//! - Low-stock listing and alert summary
//!
//! ## Stock Is Not Editable Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes current_stock                             │
//! │                                                                         │
//! │  ProductRepository::create   ── opening balance + IN movement (1 tx)   │
//! │  ProductRepository::update   ── never (ProductUpdate has no stock)     │
//! │  StockLedger::record_sale    ── −qty + OUT movement                     │
//! │  StockLedger::record_purchase── +qty + IN movement                      │
//! │  StockLedger::adjust_stock   ── ±delta + ADJUSTMENT movement            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::validation::{validate_new_product, validate_product_update, validate_search_query};
use stockroom_core::{MovementType, NewProduct, Product, ProductUpdate, StockAlertSummary};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use crate::repository::movement::{insert_movement, MovementRecord};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, sku, category_id, supplier_id, \
     buying_price, selling_price, current_stock, minimum_stock_level, unit_of_measurement, \
     created_at, updated_at";

pub(crate) const OPENING_BALANCE_NOTE: &str = "Opening balance";

/// Loads a product on an open connection or transaction.
pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let cola = repo.create(&NewProduct::new("Cola 330ml").sku("COLA-330")).await?;
/// let hits = repo.search("cola").await?;
/// let low = repo.list_low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// A non-zero opening stock is posted as an IN movement in the same
    /// transaction.
    ///
    /// ## Errors
    /// - `UniqueViolation` - SKU already exists
    /// - `ForeignKeyViolation` - unknown category or supplier
    /// - `Core(Validation / InvalidAmount)` - bad input
    pub async fn create(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;

        let name = product.name.trim().to_string();
        let sku = product.sku.as_deref().map(str::trim).map(str::to_string);
        let now = Utc::now();

        debug!(name = %name, sku = ?sku, "Inserting product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, sku, category_id, supplier_id,
                buying_price, selling_price, current_stock, minimum_stock_level,
                unit_of_measurement, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&name)
        .bind(&product.description)
        .bind(&sku)
        .bind(product.category_id)
        .bind(product.supplier_id)
        .bind(product.buying_price)
        .bind(product.selling_price)
        .bind(product.current_stock)
        .bind(product.minimum_stock_level)
        .bind(&product.unit_of_measurement)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, sku.clone().unwrap_or_default())
            }
            other => other,
        })?;

        let id = result.last_insert_rowid();

        if product.current_stock > 0 {
            let opening = MovementRecord {
                product_id: id,
                movement_type: MovementType::In,
                quantity: product.current_stock,
                delta: product.current_stock,
                reference_id: None,
                notes: Some(OPENING_BALANCE_NOTE),
                created_at: now,
            };
            insert_movement(&mut tx, &opening).await?;
        }

        tx.commit().await?;

        info!(id, name = %name, stock = product.current_stock, "Product created");

        Ok(Product {
            id,
            name,
            description: product.description.clone(),
            sku,
            category_id: product.category_id,
            supplier_id: product.supplier_id,
            buying_price: product.buying_price,
            selling_price: product.selling_price,
            current_stock: product.current_stock,
            minimum_stock_level: product.minimum_stock_level,
            unit_of_measurement: product.unit_of_measurement.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product, failing with `NotFound` if it doesn't exist.
    pub async fn get(&self, id: i64) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists every product ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Applies an update and returns the stored product.
    ///
    /// ## Errors
    /// - `NotFound` - product doesn't exist
    /// - `UniqueViolation` - new SKU collides
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update)?;
        debug!(id, "Updating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Write first so the row is locked before it is read
        let touched = sqlx::query("UPDATE products SET updated_at = ?1 WHERE id = ?2")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let mut product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        update.apply_to(&mut product);
        product.name = product.name.trim().to_string();
        product.sku = product.sku.map(|s| s.trim().to_string());
        product.updated_at = now;

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?1,
                description = ?2,
                sku = ?3,
                category_id = ?4,
                supplier_id = ?5,
                buying_price = ?6,
                selling_price = ?7,
                minimum_stock_level = ?8,
                unit_of_measurement = ?9
            WHERE id = ?10
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(product.category_id)
        .bind(product.supplier_id)
        .bind(product.buying_price)
        .bind(product.selling_price)
        .bind(product.minimum_stock_level)
        .bind(&product.unit_of_measurement)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, product.sku.clone().unwrap_or_default())
            }
            other => other,
        })?;

        tx.commit().await?;

        Ok(product)
    }

    /// Deletes a product.
    ///
    /// Products with sales, purchases or movements are protected by
    /// foreign keys and fail with `ForeignKeyViolation`.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Case-insensitive substring search over name, SKU and description.
    ///
    /// Returns the full match set ordered by name. An empty term lists
    /// everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = validate_search_query(term)?;
        debug!(query = %term, "Searching products");

        if term.is_empty() {
            return self.list().await;
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' \
                OR sku LIKE ?1 ESCAPE '\\' \
                OR description LIKE ?1 ESCAPE '\\' \
             ORDER BY name, id"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(like_pattern(&term))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Products at or below their reorder threshold, ordered by name.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE current_stock <= minimum_stock_level ORDER BY name, id"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Count plus a compact row per low-stock product.
    pub async fn stock_alert_summary(&self) -> DbResult<StockAlertSummary> {
        let low = self.list_low_stock().await?;
        Ok(StockAlertSummary::from_products(&low))
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_posts_opening_balance() {
        let db = setup().await;

        let cola = db
            .products()
            .create(&NewProduct::new("Cola").sku("COLA").prices(400, 500).stock(24, 6))
            .await
            .unwrap();

        assert_eq!(cola.current_stock, 24);
        assert_eq!(db.movements().ledger_balance(cola.id).await.unwrap(), 24);

        let empty = db.products().create(&NewProduct::new("Water")).await.unwrap();
        assert_eq!(db.movements().count(empty.id).await.unwrap(), 0);

        let stored = db.products().get(cola.id).await.unwrap();
        assert_eq!(stored.sku.as_deref(), Some("COLA"));
        assert_eq!(stored.selling_price, 500);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_constraint_violation() {
        let db = setup().await;
        db.products().create(&NewProduct::new("Cola").sku("COLA")).await.unwrap();

        let err = db
            .products()
            .create(&NewProduct::new("Cola again").sku("COLA").stock(5, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "COLA"));
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        // the failed insert left no opening movement behind
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_to_taken_sku_names_it() {
        let db = setup().await;
        db.products().create(&NewProduct::new("Cola").sku("COLA")).await.unwrap();
        let water = db
            .products()
            .create(&NewProduct::new("Water").sku("WATER"))
            .await
            .unwrap();

        let update = ProductUpdate {
            sku: Some(Some(" COLA ".to_string())),
            ..Default::default()
        };
        let err = db.products().update(water.id, &update).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "COLA"));
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        // rolled back: the SKU is unchanged
        let stored = db.products().get(water.id).await.unwrap();
        assert_eq!(stored.sku.as_deref(), Some("WATER"));
    }

    #[tokio::test]
    async fn test_many_products_without_sku() {
        let db = setup().await;
        db.products().create(&NewProduct::new("Loose apples")).await.unwrap();
        db.products().create(&NewProduct::new("Loose pears")).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let db = setup().await;
        assert!(db.products().get_by_id(42).await.unwrap().is_none());
        assert_eq!(db.products().get(42).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_keeps_stock() {
        let db = setup().await;
        let p = db
            .products()
            .create(&NewProduct::new("Cola").sku("COLA").stock(10, 5))
            .await
            .unwrap();

        let update = ProductUpdate {
            name: Some("  Cola Zero ".to_string()),
            description: Some(Some("No sugar".to_string())),
            selling_price: Some(650),
            ..Default::default()
        };
        let updated = db.products().update(p.id, &update).await.unwrap();

        assert_eq!(updated.name, "Cola Zero");
        assert_eq!(updated.current_stock, 10);

        let stored = db.products().get(p.id).await.unwrap();
        assert_eq!(stored.description.as_deref(), Some("No sugar"));
        assert_eq!(stored.selling_price, 650);
        assert_eq!(stored.current_stock, 10);

        let err = db.products().update(999, &update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let fresh = db.products().create(&NewProduct::new("Temp")).await.unwrap();
        db.products().delete(fresh.id).await.unwrap();
        assert!(db.products().get_by_id(fresh.id).await.unwrap().is_none());

        // history protects the row
        let stocked = db.products().create(&NewProduct::new("Kept").stock(3, 1)).await.unwrap();
        let err = db.products().delete(stocked.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        assert_eq!(db.products().delete(fresh.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_search() {
        let db = setup().await;
        let repo = db.products();
        repo.create(&NewProduct::new("Coca-Cola 330ml").sku("COKE-330")).await.unwrap();
        repo.create(&NewProduct::new("Pepsi").sku("PEPSI").description("cola drink"))
            .await
            .unwrap();
        repo.create(&NewProduct::new("100% Juice").sku("JUICE")).await.unwrap();

        let hits = repo.search("cola").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Coca-Cola 330ml", "Pepsi"]);

        assert_eq!(repo.search("coke-").await.unwrap().len(), 1);
        assert_eq!(repo.search("%").await.unwrap().len(), 1);
        assert_eq!(repo.search("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_low_stock_and_alert_summary() {
        let db = setup().await;
        let repo = db.products();
        repo.create(&NewProduct::new("Zucchini").stock(5, 5)).await.unwrap();
        repo.create(&NewProduct::new("Apples").stock(2, 5)).await.unwrap();
        repo.create(&NewProduct::new("Bread").stock(6, 5)).await.unwrap();

        let low = repo.list_low_stock().await.unwrap();
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Apples", "Zucchini"]);

        let summary = repo.stock_alert_summary().await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.items[0].name, "Apples");
        assert_eq!(summary.items[0].current, 2);
        assert_eq!(summary.items[0].min, 5);
    }
}
