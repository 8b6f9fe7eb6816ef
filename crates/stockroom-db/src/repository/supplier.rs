//! # Supplier Repository
//!
//! Supplier CRUD and search. Deleting a supplier detaches it from its
//! products and purchases (`ON DELETE SET NULL`).

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::validation::{validate_new_supplier, validate_search_query, validate_supplier_update};
use stockroom_core::{NewSupplier, Supplier, SupplierUpdate};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;

const SUPPLIER_COLUMNS: &str =
    "id, name, contact_person, phone, email, address, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a supplier. Email, when given, must look like an address.
    pub async fn create(&self, supplier: &NewSupplier) -> DbResult<Supplier> {
        validate_new_supplier(supplier)?;

        let name = supplier.name.trim().to_string();
        let now = Utc::now();
        debug!(name = %name, "Inserting supplier");

        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (
                name, contact_person, phone, email, address, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Supplier {
            id: result.last_insert_rowid(),
            name,
            contact_person: supplier.contact_person.clone(),
            phone: supplier.phone.clone(),
            email: supplier.email.clone(),
            address: supplier.address.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn get(&self, id: i64) -> DbResult<Supplier> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// All suppliers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name, id");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    pub async fn update(&self, id: i64, update: &SupplierUpdate) -> DbResult<Supplier> {
        validate_supplier_update(update)?;
        debug!(id, "Updating supplier");

        let mut supplier = self.get(id).await?;
        update.apply_to(&mut supplier);
        supplier.name = supplier.name.trim().to_string();
        supplier.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?1,
                contact_person = ?2,
                phone = ?3,
                email = ?4,
                address = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(supplier)
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    /// Substring search over name, contact person and email.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Supplier>> {
        let term = validate_search_query(term)?;
        if term.is_empty() {
            return self.list().await;
        }

        let sql = format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             WHERE name LIKE ?1 ESCAPE '\\' \
                OR contact_person LIKE ?1 ESCAPE '\\' \
                OR email LIKE ?1 ESCAPE '\\' \
             ORDER BY name, id"
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(like_pattern(&term))
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::{Database, DbConfig};
    use stockroom_core::NewProduct;

    fn acme() -> NewSupplier {
        NewSupplier {
            name: "Acme Wholesale".to_string(),
            contact_person: Some("Dana Reyes".to_string()),
            email: Some("orders@acme.test".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_supplier_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.suppliers();

        let acme = repo.create(&acme()).await.unwrap();
        assert_eq!(repo.get(acme.id).await.unwrap().name, "Acme Wholesale");

        let updated = repo
            .update(
                acme.id,
                &SupplierUpdate {
                    phone: Some(Some("555-0100".to_string())),
                    email: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.email, None);

        let stored = repo.get(acme.id).await.unwrap();
        assert_eq!(stored.phone.as_deref(), Some("555-0100"));
        assert_eq!(stored.contact_person.as_deref(), Some("Dana Reyes"));

        repo.delete(acme.id).await.unwrap();
        assert_eq!(repo.get(acme.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut bad = acme();
        bad.email = Some("not-an-email".to_string());

        let err = db.suppliers().create(&bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }

    #[tokio::test]
    async fn test_search_and_detach_on_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let acme = db.suppliers().create(&acme()).await.unwrap();
        db.suppliers()
            .create(&NewSupplier {
                name: "Fresh Farms".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(db.suppliers().search("dana").await.unwrap().len(), 1);
        assert_eq!(db.suppliers().search("acme.test").await.unwrap().len(), 1);
        assert_eq!(db.suppliers().search("").await.unwrap().len(), 2);

        let cola = db
            .products()
            .create(&NewProduct::new("Cola").supplier(acme.id))
            .await
            .unwrap();
        db.suppliers().delete(acme.id).await.unwrap();
        assert_eq!(db.products().get(cola.id).await.unwrap().supplier_id, None);
    }
}
