//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.products().search("cola")                                  │
//! │       ▼                                                                 │
//! │  ProductRepository (holds a SqlitePool clone)                          │
//! │  ├── create / get / list / update / delete                             │
//! │  ├── search                                                            │
//! │  └── list_low_stock / stock_alert_summary                              │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Connection-level helpers (`fetch_product`, `insert_movement`, ...)    │
//! │  take `&mut SqliteConnection` so the stock ledger can run them inside  │
//! │  its own transactions.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, search, low stock
//! - [`SupplierRepository`](supplier::SupplierRepository) - Supplier CRUD and search
//! - [`CategoryRepository`](category::CategoryRepository) - Categories
//! - [`MovementRepository`](movement::MovementRepository) - Movement log and history
//! - [`SaleRepository`](sale::SaleRepository) - Sale reads
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchase reads

pub mod category;
pub mod movement;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod supplier;

/// Wraps a search term for `LIKE ... ESCAPE '\'`, escaping wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
