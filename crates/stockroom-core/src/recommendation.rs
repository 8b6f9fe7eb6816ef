//! # Recommendation Module
//!
//! Turns product metrics into at most one reorder or de-stock suggestion
//! per product.
//!
//! ## Rules (first match wins)
//! ```text
//! ┌──────────┬───────────────────────────────────┬────────────────────────────────┐
//! │ Urgency  │ Condition                         │ Suggested order                │
//! ├──────────┼───────────────────────────────────┼────────────────────────────────┤
//! │ critical │ current ≤ min                     │ max(3·min, 10) − current       │
//! │ high     │ current ≤ 1.5·min ∧ turnover > 0  │ ⌈2.5·min − current⌉            │
//! │ medium   │ idle > 60 days ∧ current > 2·min  │ −⌊0.2·current⌋  (de-stock)     │
//! └──────────┴───────────────────────────────────┴────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::metrics::{within_warning_band, ProductMetrics, StockHealth};
use crate::money::Money;
use crate::types::Product;

/// Days without movement before surplus stock is flagged.
pub const IDLE_DAYS_THRESHOLD: i64 = 60;

const CRITICAL_REORDER_FLOOR: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Medium,
}

/// A suggestion for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id: i64,
    pub product_name: String,
    pub current_stock: i64,
    pub minimum_stock: i64,
    /// Units to order; negative means units to clear.
    pub suggested_order: i64,
    pub urgency: Urgency,
    pub reason: String,
    pub profit_impact: String,
}

impl Recommendation {
    /// Evaluates the rules for one product.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let rec = Recommendation::evaluate(&product, &metrics).unwrap();
    /// assert_eq!(rec.urgency, Urgency::Critical);
    /// ```
    pub fn evaluate(product: &Product, metrics: &ProductMetrics) -> Option<Self> {
        let current = metrics.current_stock;
        let min = metrics.minimum_stock;

        let (urgency, suggested_order, reason) = if metrics.stock_health == StockHealth::Critical {
            (
                Urgency::Critical,
                min.saturating_mul(3).max(CRITICAL_REORDER_FLOOR) - current,
                format!("Stock critically low ({current}/{min})"),
            )
        } else if within_warning_band(current, min) && metrics.monthly_turnover > 0 {
            // ⌈(5·min − 2·current) / 2⌉; the numerator is positive in this band
            let twice = min.saturating_mul(5) - current.saturating_mul(2);
            (
                Urgency::High,
                (twice + 1) / 2,
                format!(
                    "High velocity ({} units/month), stock approaching minimum",
                    metrics.monthly_turnover
                ),
            )
        } else if metrics.days_since_last_movement > IDLE_DAYS_THRESHOLD
            && current > min.saturating_mul(2)
        {
            (
                Urgency::Medium,
                -(current / 5),
                format!(
                    "Low velocity (no sales in {} days), consider reducing stock",
                    metrics.days_since_last_movement
                ),
            )
        } else {
            return None;
        };

        let profit_impact = match urgency {
            Urgency::Critical | Urgency::High => match &metrics.profit_margin {
                Some(margin) => format!("Margin: {margin}"),
                None => "Margin: n/a".to_string(),
            },
            Urgency::Medium => {
                let freed = product
                    .buying_price
                    .saturating_mul(suggested_order.saturating_abs());
                format!("Free up capital: {}", Money::from_cents(freed))
            }
        };

        Some(Recommendation {
            product_id: metrics.product_id,
            product_name: metrics.product_name.clone(),
            current_stock: current,
            minimum_stock: min,
            suggested_order,
            urgency,
            reason,
            profit_impact,
        })
    }
}

/// Orders recommendations critical → high → medium, stable within a tier.
pub fn sort_by_urgency(recommendations: &mut [Recommendation]) {
    recommendations.sort_by_key(|r| r.urgency);
}

// =============================================================================
// Unit Tests
// =============================================================================
