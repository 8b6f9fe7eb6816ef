//! # Metrics Module
//!
//! Per-product stock analytics, computed from a product row and its most
//! recent movements. Pure: the caller supplies `now`.
//!
//! ## Derived Signals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  movements (newest first)                                               │
//! │  ┌────┬────┬────┬─────┬────┬─── ··· ───┬────┐                           │
//! │  │OUT │ IN │ADJ │ OUT │ IN │           │ 30 │  ◄── fixed-count window   │
//! │  └─┬──┴────┴─┬──┴──┬──┴────┴─── ··· ───┴────┘                           │
//! │    │         │     │                                                    │
//! │    └─────────┴─────┴──► monthly_turnover = Σ quantity (OUT, ADJUSTMENT)  │
//! │                                                                         │
//! │  days_of_supply = ⌈current × 30 / max(1, turnover)⌉   (0 if no stock)   │
//! │  stock_health   = critical ≤ min < warning ≤ 1.5·min < healthy         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The turnover window is the last 30 movements, not the last 30 days.
//! A slow seller's window can span months.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, StockMovement};
use crate::TURNOVER_WINDOW;

/// Days in the nominal month used by days-of-supply.
const DAYS_PER_MONTH: i64 = 30;

// =============================================================================
// Stock Health
// =============================================================================

/// Three-tier classification of stock against the reorder threshold.
///
/// Variant order is the sort order: worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockHealth {
    Critical,
    Warning,
    Healthy,
}

impl StockHealth {
    /// Classifies stock. Both thresholds are inclusive.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::metrics::StockHealth;
    ///
    /// assert_eq!(StockHealth::classify(5, 5), StockHealth::Critical);
    /// assert_eq!(StockHealth::classify(6, 4), StockHealth::Warning);  // 6 == 4 × 1.5
    /// assert_eq!(StockHealth::classify(7, 4), StockHealth::Healthy);
    /// ```
    pub fn classify(current_stock: i64, minimum_stock_level: i64) -> Self {
        if current_stock <= minimum_stock_level {
            StockHealth::Critical
        } else if within_warning_band(current_stock, minimum_stock_level) {
            StockHealth::Warning
        } else {
            StockHealth::Healthy
        }
    }
}

impl fmt::Display for StockHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StockHealth::Critical => "critical",
            StockHealth::Warning => "warning",
            StockHealth::Healthy => "healthy",
        };
        f.write_str(label)
    }
}

/// `current <= min × 1.5`, kept in integers as `2·current <= 3·min`.
pub(crate) fn within_warning_band(current_stock: i64, minimum_stock_level: i64) -> bool {
    current_stock.saturating_mul(2) <= minimum_stock_level.saturating_mul(3)
}

// =============================================================================
// Profit Margin
// =============================================================================

/// Gross margin as a percentage with one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfitMargin(Decimal);

impl ProfitMargin {
    /// `(selling - buying) / selling × 100`, rounded half away from zero.
    ///
    /// ## Errors
    /// `DegenerateMargin` when the selling price is zero.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::metrics::ProfitMargin;
    ///
    /// let margin = ProfitMargin::compute(7, 400, 500).unwrap();
    /// assert_eq!(margin.to_string(), "20.0%");
    /// assert!(ProfitMargin::compute(7, 400, 0).is_err());
    /// ```
    pub fn compute(product_id: i64, buying_price: i64, selling_price: i64) -> CoreResult<Self> {
        if selling_price == 0 {
            return Err(CoreError::DegenerateMargin { product_id });
        }

        let gross = Decimal::from(selling_price) - Decimal::from(buying_price);
        let mut percent = (gross * Decimal::ONE_HUNDRED / Decimal::from(selling_price))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        percent.rescale(1);

        Ok(ProfitMargin(percent))
    }

    /// Margin of a stored product.
    pub fn of(product: &Product) -> CoreResult<Self> {
        Self::compute(product.id, product.buying_price, product.selling_price)
    }

    /// Percentage value, e.g. `20.0`.
    pub fn percent(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for ProfitMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// Product Metrics
// =============================================================================

/// Analytics snapshot for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetrics {
    pub product_id: i64,
    pub product_name: String,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub days_of_supply: i64,
    pub monthly_turnover: i64,
    pub days_since_last_movement: i64,
    /// Absent when the selling price is zero.
    pub profit_margin: Option<ProfitMargin>,
    pub stock_health: StockHealth,
}

impl ProductMetrics {
    /// Derives metrics for `product` from its movements, newest first.
    ///
    /// Only the first `TURNOVER_WINDOW` movements are inspected.
    pub fn compute(product: &Product, recent_movements: &[StockMovement], now: DateTime<Utc>) -> Self {
        let monthly_turnover = monthly_turnover(recent_movements);

        ProductMetrics {
            product_id: product.id,
            product_name: product.name.clone(),
            current_stock: product.current_stock,
            minimum_stock: product.minimum_stock_level,
            days_of_supply: days_of_supply(product.current_stock, monthly_turnover),
            monthly_turnover,
            days_since_last_movement: days_since_last_movement(recent_movements, now),
            profit_margin: ProfitMargin::of(product).ok(),
            stock_health: StockHealth::classify(product.current_stock, product.minimum_stock_level),
        }
    }
}

/// Sum of OUT and ADJUSTMENT quantities among the newest 30 movements.
pub fn monthly_turnover(recent_movements: &[StockMovement]) -> i64 {
    recent_movements
        .iter()
        .take(TURNOVER_WINDOW)
        .filter(|m| m.movement_type.is_outflow())
        .map(|m| m.quantity)
        .sum()
}

/// Whole days since the newest movement; 0 without movements.
pub fn days_since_last_movement(recent_movements: &[StockMovement], now: DateTime<Utc>) -> i64 {
    recent_movements
        .first()
        .map(|m| (now - m.created_at).num_days().max(0))
        .unwrap_or(0)
}

/// `⌈current × 30 / max(1, turnover)⌉`, or 0 when out of stock.
///
/// Zero turnover divides by one, so idle stock reports a large but finite
/// supply.
pub fn days_of_supply(current_stock: i64, monthly_turnover: i64) -> i64 {
    if current_stock <= 0 {
        return 0;
    }
    let numerator = current_stock.saturating_mul(DAYS_PER_MONTH);
    let denominator = monthly_turnover.max(1);
    numerator / denominator + i64::from(numerator % denominator != 0)
}

/// Orders metrics worst health first, then soonest stock-out first.
///
/// The sort is stable: ties keep their input order.
pub fn sort_by_urgency(metrics: &mut [ProductMetrics]) {
    metrics.sort_by_key(|m| (m.stock_health, m.days_of_supply));
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::product;
    use crate::types::MovementType;
    use chrono::Duration;

    fn movement(movement_type: MovementType, quantity: i64, created_at: DateTime<Utc>) -> StockMovement {
        StockMovement {
            id: 0,
            product_id: 1,
            movement_type,
            quantity,
            delta: match movement_type {
                MovementType::In => quantity,
                _ => -quantity,
            },
            reference_id: None,
            notes: None,
            created_at,
        }
    }

    #[test]
    fn test_health_boundaries_inclusive() {
        assert_eq!(StockHealth::classify(5, 5), StockHealth::Critical);
        assert_eq!(StockHealth::classify(0, 0), StockHealth::Critical);
        assert_eq!(StockHealth::classify(15, 10), StockHealth::Warning);
        assert_eq!(StockHealth::classify(16, 10), StockHealth::Healthy);
        // 1.5 × 5 = 7.5: 7 is warning, 8 is healthy
        assert_eq!(StockHealth::classify(7, 5), StockHealth::Warning);
        assert_eq!(StockHealth::classify(8, 5), StockHealth::Healthy);
    }

    #[test]
    fn test_turnover_counts_outflows_in_window() {
        let now = Utc::now();
        let mut movements = vec![
            movement(MovementType::Out, 3, now),
            movement(MovementType::In, 50, now),
            movement(MovementType::Adjustment, 2, now),
        ];
        assert_eq!(monthly_turnover(&movements), 5);

        // 30 inbound movements push the outflows out of the window
        let mut padded: Vec<_> = (0..30).map(|_| movement(MovementType::In, 1, now)).collect();
        padded.append(&mut movements);
        assert_eq!(monthly_turnover(&padded), 0);
    }

    #[test]
    fn test_days_since_last_movement() {
        let now = Utc::now();
        assert_eq!(days_since_last_movement(&[], now), 0);

        let movements = vec![
            movement(MovementType::Out, 1, now - Duration::hours(80)),
            movement(MovementType::Out, 1, now - Duration::days(90)),
        ];
        assert_eq!(days_since_last_movement(&movements, now), 3);
    }

    #[test]
    fn test_days_of_supply() {
        assert_eq!(days_of_supply(0, 10), 0);
        assert_eq!(days_of_supply(10, 0), 300);
        assert_eq!(days_of_supply(10, 30), 10);
        assert_eq!(days_of_supply(10, 7), 43); // 300 / 7 = 42.86
    }

    #[test]
    fn test_profit_margin() {
        assert_eq!(ProfitMargin::compute(1, 400, 500).unwrap().to_string(), "20.0%");
        assert_eq!(ProfitMargin::compute(1, 200, 300).unwrap().to_string(), "33.3%");
        // 1/16 = 6.25% → 6.3%
        assert_eq!(ProfitMargin::compute(1, 1500, 1600).unwrap().to_string(), "6.3%");
        assert_eq!(ProfitMargin::compute(1, 600, 500).unwrap().to_string(), "-20.0%");

        let err = ProfitMargin::compute(9, 100, 0).unwrap_err();
        assert!(matches!(err, CoreError::DegenerateMargin { product_id: 9 }));
    }

    #[test]
    fn test_compute_metrics() {
        let now = Utc::now();
        let p = product(5, 5);
        let movements = vec![movement(MovementType::Out, 5, now - Duration::days(2))];

        let m = ProductMetrics::compute(&p, &movements, now);
        assert_eq!(m.stock_health, StockHealth::Critical);
        assert_eq!(m.monthly_turnover, 5);
        assert_eq!(m.days_of_supply, 30);
        assert_eq!(m.days_since_last_movement, 2);
        assert_eq!(m.profit_margin.map(|p| p.to_string()), Some("20.0%".to_string()));
    }

    #[test]
    fn test_zero_selling_price_has_no_margin() {
        let mut p = product(10, 5);
        p.selling_price = 0;
        let m = ProductMetrics::compute(&p, &[], Utc::now());
        assert_eq!(m.profit_margin, None);
    }

    #[test]
    fn test_sort_by_urgency() {
        let now = Utc::now();
        let mut all = vec![
            ProductMetrics::compute(&product(100, 5), &[], now),
            ProductMetrics::compute(&product(7, 5), &[], now),
            ProductMetrics::compute(&product(3, 5), &[], now),
            ProductMetrics::compute(&product(1, 5), &[], now),
        ];
        sort_by_urgency(&mut all);

        let order: Vec<i64> = all.iter().map(|m| m.current_stock).collect();
        assert_eq!(order, vec![1, 3, 7, 100]);
    }
}
