//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  StockMovement  │   │  Sale/Purchase  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │◄──│  product_id     │   │  id (i64)       │       │
//! │  │  sku (unique?)  │   │  movement_type  │   │  total_amount   │       │
//! │  │  *_price cents  │   │  quantity ≥ 1   │──►│  items[]        │       │
//! │  │  current_stock  │   │  delta (signed) │   │                 │       │
//! │  └─────────────────┘   │  reference_id   │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ledger Invariant
//! `Product::current_stock` is a materialized projection of the movement
//! log: it always equals the sum of `StockMovement::delta` for that
//! product. Only the stock ledger in `stockroom-db` writes either side.
//!
//! ## Inputs vs. Entities
//! `New*` structs are what callers submit (no id, no timestamps). Update
//! structs list exactly the fields a caller may change; `current_stock`
//! is never among them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreResult;
use crate::money::{to_minor_units, Money};
use crate::{DEFAULT_MINIMUM_STOCK_LEVEL, DEFAULT_UNIT_OF_MEASUREMENT};

// =============================================================================
// Movement Type
// =============================================================================

/// Why a stock movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Stock received (purchase, opening balance).
    In,
    /// Stock sold.
    Out,
    /// Manual correction, either direction.
    Adjustment,
}

impl MovementType {
    /// Returns the persisted label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }

    /// Whether this movement counts towards turnover.
    pub const fn is_outflow(&self) -> bool {
        matches!(self, MovementType::Out | MovementType::Adjustment)
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    MobileMoney,
}

// =============================================================================
// Purchase Status
// =============================================================================

/// Lifecycle of a purchase order.
///
/// ```text
///   PENDING ──receive──► RECEIVED   (stock posted)
///      │
///      └────cancel────► CANCELLED  (nothing posted)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseStatus {
    Pending,
    #[default]
    Received,
    Cancelled,
}

impl PurchaseStatus {
    /// Returns the persisted label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "PENDING",
            PurchaseStatus::Received => "RECEIVED",
            PurchaseStatus::Cancelled => "CANCELLED",
        }
    }

    /// Only received purchases move stock.
    pub const fn posts_stock(&self) -> bool {
        matches!(self, PurchaseStatus::Received)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Mutable supplier fields.
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact_person: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

impl SupplierUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact_person.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
    }

    /// Applies the changes to a loaded supplier.
    pub fn apply_to(&self, supplier: &mut Supplier) {
        if let Some(name) = &self.name {
            supplier.name = name.clone();
        }
        if let Some(contact_person) = &self.contact_person {
            supplier.contact_person = contact_person.clone();
        }
        if let Some(phone) = &self.phone {
            supplier.phone = phone.clone();
        }
        if let Some(email) = &self.email {
            supplier.email = email.clone();
        }
        if let Some(address) = &self.address {
            supplier.address = address.clone();
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Display name.
    pub name: String,

    pub description: Option<String>,

    /// Stock Keeping Unit, unique when present.
    pub sku: Option<String>,

    pub category_id: Option<i64>,

    pub supplier_id: Option<i64>,

    /// Last purchase price in minor units.
    pub buying_price: i64,

    /// Shelf price in minor units.
    pub selling_price: i64,

    /// Units on hand. Never negative; written only by the stock ledger.
    pub current_stock: i64,

    /// Reorder threshold.
    pub minimum_stock_level: i64,

    pub unit_of_measurement: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the buying price as Money.
    #[inline]
    pub fn buying_price(&self) -> Money {
        Money::from_cents(self.buying_price)
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price)
    }

    /// Whether the product sits at or below its reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock_level
    }
}

/// Fields for creating a product.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use stockroom_core::NewProduct;
///
/// let product = NewProduct::new("Cola 330ml")
///     .sku("COLA-330")
///     .decimal_prices(Decimal::new(45, 2), Decimal::new(99, 2))
///     .unwrap()
///     .stock(24, 6);
///
/// assert_eq!(product.buying_price, 45);
/// assert_eq!(product.selling_price, 99);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub buying_price: i64,
    pub selling_price: i64,
    /// Opening balance, posted as an IN movement on creation.
    pub current_stock: i64,
    pub minimum_stock_level: i64,
    pub unit_of_measurement: String,
}

impl NewProduct {
    /// Starts a product with zero prices, zero stock and default threshold.
    pub fn new(name: impl Into<String>) -> Self {
        NewProduct {
            name: name.into(),
            description: None,
            sku: None,
            category_id: None,
            supplier_id: None,
            buying_price: 0,
            selling_price: 0,
            current_stock: 0,
            minimum_stock_level: DEFAULT_MINIMUM_STOCK_LEVEL,
            unit_of_measurement: DEFAULT_UNIT_OF_MEASUREMENT.to_string(),
        }
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn supplier(mut self, supplier_id: i64) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measurement = unit.into();
        self
    }

    /// Sets prices already expressed in minor units.
    pub fn prices(mut self, buying_price: i64, selling_price: i64) -> Self {
        self.buying_price = buying_price;
        self.selling_price = selling_price;
        self
    }

    /// Sets prices from decimal amounts through the money codec.
    pub fn decimal_prices(mut self, buying: Decimal, selling: Decimal) -> CoreResult<Self> {
        self.buying_price = to_minor_units(buying)?;
        self.selling_price = to_minor_units(selling)?;
        Ok(self)
    }

    /// Sets the opening balance and the reorder threshold.
    pub fn stock(mut self, current_stock: i64, minimum_stock_level: i64) -> Self {
        self.current_stock = current_stock;
        self.minimum_stock_level = minimum_stock_level;
        self
    }
}

/// Mutable product fields.
///
/// Stock is deliberately absent: `current_stock` changes only through a
/// sale, purchase or adjustment. `None` leaves a field untouched;
/// `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub sku: Option<Option<String>>,
    pub category_id: Option<Option<i64>>,
    pub supplier_id: Option<Option<i64>>,
    pub buying_price: Option<i64>,
    pub selling_price: Option<i64>,
    pub minimum_stock_level: Option<i64>,
    pub unit_of_measurement: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.sku.is_none()
            && self.category_id.is_none()
            && self.supplier_id.is_none()
            && self.buying_price.is_none()
            && self.selling_price.is_none()
            && self.minimum_stock_level.is_none()
            && self.unit_of_measurement.is_none()
    }

    /// Applies the changes to a loaded product.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.clone();
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(supplier_id) = self.supplier_id {
            product.supplier_id = supplier_id;
        }
        if let Some(buying_price) = self.buying_price {
            product.buying_price = buying_price;
        }
        if let Some(selling_price) = self.selling_price {
            product.selling_price = selling_price;
        }
        if let Some(minimum) = self.minimum_stock_level {
            product.minimum_stock_level = minimum;
        }
        if let Some(unit) = &self.unit_of_measurement {
            product.unit_of_measurement = unit.clone();
        }
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    /// Unsigned magnitude as requested (always ≥ 1).
    pub quantity: i64,
    /// Signed change actually applied to `current_stock`.
    ///
    /// Equals `±quantity` except for an adjustment clamped at zero.
    pub delta: i64,
    /// Originating sale or purchase id.
    pub reference_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A checkout. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    /// Sum of item subtotals in minor units.
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price in minor units at time of sale.
    pub unit_price: i64,
    /// `unit_price × quantity`.
    pub subtotal: i64,
}

/// Sale item joined with the product it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItemDetail {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
    pub product_name: String,
    pub product_sku: Option<String>,
}

/// Sale header as submitted by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSale {
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSaleItem {
    pub product_id: i64,
    pub quantity: i64,
    /// Minor units.
    pub unit_price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItemDetail>,
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase order. Moves stock only once RECEIVED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: i64,
    pub supplier_id: Option<i64>,
    /// Joined from suppliers for display.
    pub supplier_name: Option<String>,
    pub total_amount: i64,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItemDetail {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
    pub product_name: String,
    pub product_sku: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPurchase {
    pub supplier_id: Option<i64>,
    pub status: PurchaseStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseItem {
    pub product_id: i64,
    pub quantity: i64,
    /// Minor units; becomes the product's buying price when received.
    pub unit_price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseWithItems {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItemDetail>,
}

// =============================================================================
// Stock Alerts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub id: i64,
    pub name: String,
    pub current: i64,
    pub min: i64,
}

/// Low-stock digest for a dashboard badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlertSummary {
    pub count: usize,
    pub items: Vec<LowStockItem>,
}

impl StockAlertSummary {
    pub fn from_products(products: &[Product]) -> Self {
        let items: Vec<LowStockItem> = products
            .iter()
            .map(|p| LowStockItem {
                id: p.id,
                name: p.name.clone(),
                current: p.current_stock,
                min: p.minimum_stock_level,
            })
            .collect();

        StockAlertSummary {
            count: items.len(),
            items,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(current_stock: i64, minimum_stock_level: i64) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            name: "Cola 330ml".to_string(),
            description: None,
            sku: Some("COLA-330".to_string()),
            category_id: None,
            supplier_id: None,
            buying_price: 400,
            selling_price: 500,
            current_stock,
            minimum_stock_level,
            unit_of_measurement: "pcs".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_new_product_defaults() {
        let p = NewProduct::new("Rice 1kg");
        assert_eq!(p.minimum_stock_level, 5);
        assert_eq!(p.unit_of_measurement, "pcs");
        assert_eq!(p.current_stock, 0);
    }

    #[test]
    fn test_decimal_prices_use_codec() {
        let p = NewProduct::new("Rice 1kg")
            .decimal_prices(Decimal::new(1250, 2), Decimal::new(14995, 3))
            .unwrap();
        assert_eq!(p.buying_price, 1250);
        assert_eq!(p.selling_price, 1500); // 14.995 rounds away from zero
    }

    #[test]
    fn test_product_update_leaves_stock_alone() {
        let mut p = product(12, 5);
        let update = ProductUpdate {
            name: Some("Cola 500ml".to_string()),
            sku: Some(None),
            selling_price: Some(650),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut p);

        assert_eq!(p.name, "Cola 500ml");
        assert_eq!(p.sku, None);
        assert_eq!(p.selling_price, 650);
        assert_eq!(p.buying_price, 400);
        assert_eq!(p.current_stock, 12);
    }

    #[test]
    fn test_purchase_status_posting() {
        assert!(PurchaseStatus::Received.posts_stock());
        assert!(!PurchaseStatus::Pending.posts_stock());
        assert!(!PurchaseStatus::Cancelled.posts_stock());
        assert_eq!(PurchaseStatus::default(), PurchaseStatus::Received);
    }

    #[test]
    fn test_movement_type_serde_labels() {
        let json = serde_json::to_string(&MovementType::Adjustment).unwrap();
        assert_eq!(json, "\"ADJUSTMENT\"");
        let json = serde_json::to_string(&PaymentMethod::MobileMoney).unwrap();
        assert_eq!(json, "\"MOBILE_MONEY\"");
        assert!(MovementType::Out.is_outflow());
        assert!(!MovementType::In.is_outflow());
    }

    #[test]
    fn test_alert_summary() {
        let summary = StockAlertSummary::from_products(&[product(2, 5), product(5, 5)]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.items[0].current, 2);
        assert_eq!(summary.items[1].min, 5);
    }
}
