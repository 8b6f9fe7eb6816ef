//! # Database Error Types
//!
//! Error types for storage and engine operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)       CoreError (ledger rules)             │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  DbError (this module) ← classified, transaction already rolled back   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::kind() → ErrorKind ← stable taxonomy for the request layer   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use stockroom_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Unknown product, supplier, category, sale or purchase id
    /// - A sale or purchase line names a product that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting or updating to a duplicate SKU
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent supplier or category
    /// - Deleting a product that has ledger history
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ledger rule violation raised before or during a transaction.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Caller-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    ConstraintViolation,
    InvalidQuantity,
    InsufficientStock,
    InvalidAmount,
    DegenerateMargin,
    /// Connection, migration, configuration and other infrastructure faults.
    Storage,
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Collapses the error onto the caller-facing taxonomy.
    ///
    /// ```text
    /// NotFound                         → NotFound
    /// UniqueViolation, ForeignKey...   → ConstraintViolation
    /// Core(InvalidPurchaseStatus)      → ConstraintViolation
    /// Core(Validation)                 → ConstraintViolation
    /// Core(InvalidQuantity) etc.       → same name
    /// everything else                  → Storage
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ErrorKind::ConstraintViolation
            }
            DbError::Core(core) => match core {
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
                CoreError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
                CoreError::DegenerateMargin { .. } => ErrorKind::DegenerateMargin,
                CoreError::InvalidPurchaseStatus { .. } | CoreError::Validation(_) => {
                    ErrorKind::ConstraintViolation
                }
            },
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Config(_)
            | DbError::Internal(_) => ErrorKind::Storage,
        }
    }
}

impl From<stockroom_core::ValidationError> for DbError {
    fn from(err: stockroom_core::ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: products.sku"
                // "FOREIGN KEY constraint failed"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{PurchaseStatus, ValidationError};

    #[test]
    fn test_kind_taxonomy() {
        assert_eq!(DbError::not_found("Product", 7).kind(), ErrorKind::NotFound);
        assert_eq!(
            DbError::duplicate("products.sku", "COLA").kind(),
            ErrorKind::ConstraintViolation
        );

        let stock: DbError = CoreError::InsufficientStock {
            product_id: 1,
            product: "Cola".to_string(),
            available: 2,
            requested: 3,
        }
        .into();
        assert_eq!(stock.kind(), ErrorKind::InsufficientStock);

        let status: DbError = CoreError::InvalidPurchaseStatus {
            purchase_id: 1,
            current: PurchaseStatus::Cancelled,
            action: "receive".to_string(),
        }
        .into();
        assert_eq!(status.kind(), ErrorKind::ConstraintViolation);

        let validation: DbError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert_eq!(validation.kind(), ErrorKind::ConstraintViolation);

        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            DbError::not_found("Purchase", 12).to_string(),
            "Purchase not found: 12"
        );
    }
}
