//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, quantity, field)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::PurchaseStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent ledger rule violations. None of them leaves a
/// partial write behind: the storage layer rolls back the enclosing
/// transaction before surfacing them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale would drive a product's stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// record_sale(items: [{ product: 7, qty: 3 }])
    ///      │
    ///      ▼
    /// Product 7 has current_stock = 2
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Cola", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, stock stays 2
    /// ```
    #[error("Insufficient stock for {product} (#{product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        product: String,
        available: i64,
        requested: i64,
    },

    /// A quantity that must be strictly positive was not.
    #[error("Invalid quantity for {field}: {value} (must be greater than zero)")]
    InvalidQuantity { field: String, value: i64 },

    /// A monetary value was negative, unrepresentable, or overflowed.
    #[error("Invalid amount for {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    /// Profit margin requested for a product whose selling price is zero.
    #[error("Profit margin is undefined for product #{product_id}: selling price is zero")]
    DegenerateMargin { product_id: i64 },

    /// A purchase status transition that is not allowed.
    ///
    /// Only PENDING purchases can be received or cancelled.
    #[error("Purchase #{purchase_id} is {current}, cannot {action}")]
    InvalidPurchaseStatus {
        purchase_id: i64,
        current: PurchaseStatus,
        action: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidQuantity error.
    pub fn invalid_quantity(field: impl Into<String>, value: i64) -> Self {
        CoreError::InvalidQuantity {
            field: field.into(),
            value,
        }
    }

    /// Creates an InvalidAmount error.
    pub fn invalid_amount(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any SQL runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed SKU or email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
