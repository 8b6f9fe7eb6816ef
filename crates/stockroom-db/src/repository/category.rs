//! # Category Repository

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::validation::validate_new_category;
use stockroom_core::{Category, NewCategory};
use tracing::debug;

use crate::error::{DbError, DbResult};

const CATEGORY_COLUMNS: &str = "id, name, description, created_at";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn create(&self, category: &NewCategory) -> DbResult<Category> {
        validate_new_category(category)?;

        let name = category.name.trim().to_string();
        let now = Utc::now();
        debug!(name = %name, "Inserting category");

        let result = sqlx::query(
            "INSERT INTO categories (name, description, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(&name)
        .bind(&category.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name,
            description: category.description.clone(),
            created_at: now,
        })
    }

    pub async fn get(&self, id: i64) -> DbResult<Category> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name, id");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }
}
