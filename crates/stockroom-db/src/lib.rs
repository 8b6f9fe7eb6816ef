//! # stockroom-db: Ledger Store for Stockroom
//!
//! SQLite persistence for the stock ledger, the transactional stock
//! mutation engine, and the read services that compute metrics and
//! reorder recommendations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Caller (POS screen, CLI, seed binary)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │   Database    │   │  StockLedger  │   │  Repositories  │   │   │
//! │  │   │   (pool.rs)   │──►│  (ledger.rs)  │   │  products      │   │   │
//! │  │   │               │   │  sale/purch/  │   │  suppliers     │   │   │
//! │  │   │ SqlitePool    │   │  adjust txns  │   │  sales, ...    │   │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘   │   │
//! │  │           │           ┌───────────────────────────────────┐    │   │
//! │  │           └──────────►│ MetricsService / Recommendations  │    │   │
//! │  │                       │ (analytics.rs, read-only)         │    │   │
//! │  │                       └───────────────────────────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   ~/.local/share/stockroom/stockroom.db                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the `Database` handle
//! - [`config`] - File/env configuration resolved into a `DbConfig`
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Database error types and the caller-facing `ErrorKind`
//! - [`repository`] - Entity reads and plain CRUD
//! - [`ledger`] - Sales, purchases and adjustments (all stock writes)
//! - [`analytics`] - Stock metrics and recommendations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, StockroomConfig};
//!
//! let config = StockroomConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let cola = db.products().create(&NewProduct::new("Cola").stock(24, 6)).await?;
//! db.ledger().adjust_stock(cola.id, -2, "dropped crate").await?;
//!
//! for rec in db.recommendations().generate().await? {
//!     println!("{}: order {}", rec.product_name, rec.suggested_order);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use analytics::{MetricsService, RecommendationService};
pub use config::StockroomConfig;
pub use error::{DbError, DbResult, ErrorKind};
pub use ledger::{LedgerDiscrepancy, StockLedger};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
pub use repository::supplier::SupplierRepository;
