//! # Validation Module
//!
//! Input validation for everything the ledger accepts.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (before any SQL runs)                            │
//! │  ├── Field format (empty, length, SKU charset, email shape)            │
//! │  ├── Quantities > 0          → CoreError::InvalidQuantity              │
//! │  └── Money ≥ 0               → CoreError::InvalidAmount                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Stock ledger transaction                                     │
//! │  └── Stock never below zero  → CoreError::InsufficientStock            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── UNIQUE(sku)                                                       │
//! │  ├── FOREIGN KEY product/supplier/category                             │
//! │  └── CHECK(current_stock >= 0), CHECK(quantity > 0)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("COLA-330").unwrap();
//! validate_quantity("quantity", 5).unwrap();
//! assert!(validate_quantity("quantity", 0).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{
    NewCategory, NewProduct, NewPurchaseItem, NewSaleItem, NewSupplier, ProductUpdate,
    SupplierUpdate,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_SKU_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_QUERY_LEN: usize = 100;
const MAX_UNIT_LEN: usize = 20;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("COLA-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, supplier, category).
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_name;
///
/// assert!(validate_name("name", "Cola 330ml").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a unit of measurement label ("pcs", "kg", "l").
pub fn validate_unit(unit: &str) -> ValidationResult<()> {
    let unit = unit.trim();

    if unit.is_empty() {
        return Err(ValidationError::Required {
            field: "unit_of_measurement".to_string(),
        });
    }

    if unit.len() > MAX_UNIT_LEN {
        return Err(ValidationError::TooLong {
            field: "unit_of_measurement".to_string(),
            max: MAX_UNIT_LEN,
        });
    }

    Ok(())
}

/// Validates an email address loosely: one `@`, non-empty local part and
/// a dotted domain.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_email;
///
/// assert!(validate_email("orders@acme.test").is_ok());
/// assert!(validate_email("acme.test").is_err());
/// assert!(validate_email("orders@acme").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (matches everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement or line-item quantity.
///
/// ## Rules
/// - Must be strictly positive
///
/// ```text
/// append_movement(product, OUT, qty)
///       │
///       ▼
/// validate_quantity("quantity", qty) ← THIS FUNCTION
///       │
///       ├── qty <= 0? → InvalidQuantity (nothing written)
///       │
///       └── OK → INSERT INTO stock_movements
/// ```
pub fn validate_quantity(field: &str, qty: i64) -> CoreResult<()> {
    if qty <= 0 {
        return Err(CoreError::invalid_quantity(field, qty));
    }
    Ok(())
}

/// Validates a price or other monetary field in minor units.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("selling_price", 1099).is_ok());
/// assert!(validate_price_cents("selling_price", 0).is_ok());
/// assert!(validate_price_cents("selling_price", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> CoreResult<()> {
    if cents < 0 {
        return Err(CoreError::invalid_amount(
            field,
            format!("{cents} is negative"),
        ));
    }
    Ok(())
}

/// Validates a stock level (opening stock or reorder threshold).
pub fn validate_stock_level(field: &str, level: i64) -> ValidationResult<()> {
    if level < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a stock adjustment delta. Zero is a no-op and rejected.
pub fn validate_adjustment(delta: i64) -> CoreResult<()> {
    if delta == 0 {
        return Err(CoreError::invalid_quantity("adjustment", delta));
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

pub fn validate_new_product(product: &NewProduct) -> CoreResult<()> {
    validate_name("name", &product.name)?;
    if let Some(sku) = &product.sku {
        validate_sku(sku)?;
    }
    validate_price_cents("buying_price", product.buying_price)?;
    validate_price_cents("selling_price", product.selling_price)?;
    validate_stock_level("current_stock", product.current_stock)?;
    validate_stock_level("minimum_stock_level", product.minimum_stock_level)?;
    validate_unit(&product.unit_of_measurement)?;
    Ok(())
}

pub fn validate_product_update(update: &ProductUpdate) -> CoreResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    if let Some(Some(sku)) = &update.sku {
        validate_sku(sku)?;
    }
    if let Some(price) = update.buying_price {
        validate_price_cents("buying_price", price)?;
    }
    if let Some(price) = update.selling_price {
        validate_price_cents("selling_price", price)?;
    }
    if let Some(minimum) = update.minimum_stock_level {
        validate_stock_level("minimum_stock_level", minimum)?;
    }
    if let Some(unit) = &update.unit_of_measurement {
        validate_unit(unit)?;
    }
    Ok(())
}

pub fn validate_new_supplier(supplier: &NewSupplier) -> ValidationResult<()> {
    validate_name("name", &supplier.name)?;
    if let Some(email) = &supplier.email {
        validate_email(email)?;
    }
    Ok(())
}

pub fn validate_supplier_update(update: &SupplierUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    if let Some(Some(email)) = &update.email {
        validate_email(email)?;
    }
    Ok(())
}

pub fn validate_new_category(category: &NewCategory) -> ValidationResult<()> {
    validate_name("name", &category.name)
}

/// Validates sale lines: at least one, positive quantities, non-negative prices.
///
/// An empty list is an `InvalidQuantity` of zero lines.
pub fn validate_sale_items(items: &[NewSaleItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::invalid_quantity("items", 0));
    }
    for item in items {
        validate_quantity("quantity", item.quantity)?;
        validate_price_cents("unit_price", item.unit_price)?;
    }
    Ok(())
}

/// Validates purchase lines with the same rules as sale lines.
pub fn validate_purchase_items(items: &[NewPurchaseItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::invalid_quantity("items", 0));
    }
    for item in items {
        validate_quantity("quantity", item.quantity)?;
        validate_price_cents("unit_price", item.unit_price)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COLA-330").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Cola 330ml").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a@@b.co").is_err());
        assert!(validate_email("a@b.").is_err());
        assert!(validate_email("a b@c.co").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 10_000).is_ok());

        let err = validate_quantity("quantity", 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { value: 0, .. }));
        assert!(validate_quantity("quantity", -1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents("price", 0).is_ok());
        assert!(validate_price_cents("price", 1099).is_ok());

        let err = validate_price_cents("price", -100).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_validate_new_product() {
        let ok = NewProduct::new("Cola").sku("COLA").prices(400, 500).stock(10, 5);
        assert!(validate_new_product(&ok).is_ok());

        let negative_stock = NewProduct::new("Cola").stock(-1, 5);
        assert!(matches!(
            validate_new_product(&negative_stock),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let negative_price = NewProduct::new("Cola").prices(-1, 500);
        assert!(matches!(
            validate_new_product(&negative_price),
            Err(CoreError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_validate_sale_items() {
        assert!(matches!(
            validate_sale_items(&[]),
            Err(CoreError::InvalidQuantity { value: 0, .. })
        ));
        assert!(matches!(
            validate_purchase_items(&[]),
            Err(CoreError::InvalidQuantity { value: 0, .. })
        ));

        let zero = NewSaleItem {
            product_id: 1,
            quantity: 0,
            unit_price: 500,
        };
        assert!(matches!(
            validate_sale_items(&[zero]),
            Err(CoreError::InvalidQuantity { .. })
        ));

        let ok = NewSaleItem {
            product_id: 1,
            quantity: 2,
            unit_price: 500,
        };
        assert!(validate_sale_items(&[ok]).is_ok());
    }

    #[test]
    fn test_validate_supplier_update_clearing_email() {
        let update = SupplierUpdate {
            email: Some(None),
            ..Default::default()
        };
        assert!(validate_supplier_update(&update).is_ok());

        let update = SupplierUpdate {
            email: Some(Some("nope".to_string())),
            ..Default::default()
        };
        assert!(validate_supplier_update(&update).is_err());
    }
}
