//! # stockroom-core: Pure Ledger Logic for Stockroom
//!
//! Everything about stock that can be decided without touching storage:
//! money conversion, domain types, input rules, stock analytics and
//! reorder suggestions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Request layer (UI / IPC, not in this repo)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockroom-db (Storage + Engines)                 │   │
//! │  │   StockLedger ── repositories ── MetricsService ── Recommend.   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │  types  │ │validation│ │ metrics │ │ recomm. │  │   │
//! │  │   │ codec   │ │ Product │ │  rules   │ │ health  │ │  rules  │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal ⇄ minor-unit codec and the `Money` type
//! - [`types`] - Products, movements, sales, purchases
//! - [`validation`] - Input rules checked before any write
//! - [`metrics`] - Turnover, days of supply, stock health, margin
//! - [`recommendation`] - Reorder / de-stock suggestions
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use stockroom_core::metrics::StockHealth;
//! use stockroom_core::money::to_minor_units;
//!
//! assert_eq!(to_minor_units(Decimal::new(1499, 2)).unwrap(), 1499);
//! assert_eq!(StockHealth::classify(5, 5), StockHealth::Critical);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod metrics;
pub mod money;
pub mod recommendation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use metrics::{ProductMetrics, ProfitMargin, StockHealth};
pub use money::Money;
pub use recommendation::{Recommendation, Urgency};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Movements returned by a history read when the caller gives no limit.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Number of most recent movements that make up the turnover window.
pub const TURNOVER_WINDOW: usize = 30;

/// Reorder threshold for products created without one.
pub const DEFAULT_MINIMUM_STOCK_LEVEL: i64 = 5;

pub const DEFAULT_UNIT_OF_MEASUREMENT: &str = "pcs";
