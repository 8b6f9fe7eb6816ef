//! # Analytics Services
//!
//! Read-only services that feed stored products and their newest
//! movements into the pure metric and recommendation rules of
//! `stockroom-core`.
//!
//! ```text
//! products ──┐
//!            ├──► ProductMetrics::compute ──► sort_by_urgency ──► Vec<ProductMetrics>
//! movements ─┘            │
//!  (newest 30)            ▼
//!              Recommendation::evaluate ──► sort_by_urgency ──► Vec<Recommendation>
//! ```
//!
//! Every call reads inside one transaction, so a report never mixes
//! stock levels from before and after a concurrent sale. Nothing here
//! writes: calling twice with no mutation in between returns equal results.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::{
    metrics, recommendation, Product, ProductMetrics, ProfitMargin, Recommendation,
    TURNOVER_WINDOW,
};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::movement::recent_movements;
use crate::repository::product::{fetch_product, PRODUCT_COLUMNS};

// =============================================================================
// Metrics
// =============================================================================

/// Per-product stock metrics.
#[derive(Debug, Clone)]
pub struct MetricsService {
    pool: SqlitePool,
}

impl MetricsService {
    pub fn new(pool: SqlitePool) -> Self {
        MetricsService { pool }
    }

    /// Metrics for one product as of now.
    pub async fn product_metrics(&self, product_id: i64) -> DbResult<ProductMetrics> {
        self.product_metrics_at(product_id, Utc::now()).await
    }

    /// Metrics for one product as of `now`.
    pub async fn product_metrics_at(&self, product_id: i64, now: DateTime<Utc>) -> DbResult<ProductMetrics> {
        let mut tx = self.pool.begin().await?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;
        let metrics = compute(&mut tx, &product, now).await?;

        tx.commit().await?;
        Ok(metrics)
    }

    /// Metrics for every product, worst health first.
    ///
    /// ## Ordering
    /// ```text
    /// critical (dos ↑) → warning (dos ↑) → healthy (dos ↑)
    /// ```
    /// Ties keep product-name order.
    pub async fn all_metrics(&self) -> DbResult<Vec<ProductMetrics>> {
        self.all_metrics_at(Utc::now()).await
    }

    pub async fn all_metrics_at(&self, now: DateTime<Utc>) -> DbResult<Vec<ProductMetrics>> {
        let snapshot = self.snapshot(now).await?;

        let mut all: Vec<ProductMetrics> = snapshot.into_iter().map(|(_, m)| m).collect();
        metrics::sort_by_urgency(&mut all);

        debug!(products = all.len(), "Computed stock metrics");
        Ok(all)
    }

    /// Profit margin of one product.
    ///
    /// ## Errors
    /// - `NotFound` - unknown product
    /// - `DegenerateMargin` - selling price is zero
    pub async fn profit_margin(&self, product_id: i64) -> DbResult<ProfitMargin> {
        let mut conn = self.pool.acquire().await?;
        let product = fetch_product(&mut conn, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        Ok(ProfitMargin::of(&product)?)
    }

    /// Every product with its metrics, in product-name order.
    async fn snapshot(&self, now: DateTime<Utc>) -> DbResult<Vec<(Product, ProductMetrics)>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&mut *tx)
            .await?;

        let mut snapshot = Vec::with_capacity(products.len());
        for product in products {
            let metrics = compute(&mut tx, &product, now).await?;
            snapshot.push((product, metrics));
        }

        tx.commit().await?;
        Ok(snapshot)
    }
}

async fn compute(
    conn: &mut SqliteConnection,
    product: &Product,
    now: DateTime<Utc>,
) -> DbResult<ProductMetrics> {
    let window = i64::try_from(TURNOVER_WINDOW).unwrap_or(i64::MAX);
    let movements = recent_movements(conn, product.id, window).await?;
    Ok(ProductMetrics::compute(product, &movements, now))
}

// =============================================================================
// Recommendations
// =============================================================================

/// Reorder and de-stock suggestions.
#[derive(Debug, Clone)]
pub struct RecommendationService {
    metrics: MetricsService,
}

impl RecommendationService {
    pub fn new(metrics: MetricsService) -> Self {
        RecommendationService { metrics }
    }

    /// Recommendations as of now, critical first.
    pub async fn generate(&self) -> DbResult<Vec<Recommendation>> {
        self.generate_at(Utc::now()).await
    }

    pub async fn generate_at(&self, now: DateTime<Utc>) -> DbResult<Vec<Recommendation>> {
        let snapshot = self.metrics.snapshot(now).await?;

        let mut recommendations: Vec<Recommendation> = snapshot
            .iter()
            .filter_map(|(product, metrics)| Recommendation::evaluate(product, metrics))
            .collect();
        recommendation::sort_by_urgency(&mut recommendations);

        debug!(
            products = snapshot.len(),
            recommendations = recommendations.len(),
            "Generated recommendations"
        );
        Ok(recommendations)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
