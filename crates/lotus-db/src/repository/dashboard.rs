//! # Dashboard Repository
//!
//! Read-only aggregates for the dashboard screen. No writes, no
//! transactions: each query observes committed state, which is all the
//! dashboard needs.
//!
//! ## Computed Figures
//! - Monthly stats: revenue and count of completed orders since the first
//!   of the current month (UTC), customer count, and profit estimated as a
//!   fixed 30% of revenue
//! - Recent orders and recent activity entries
//! - Low-stock products
//! - A 7-day trailing sales series, zero-filled so charts always get seven
//!   buckets

use chrono::{Datelike, Duration, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{
    activity::ActivityLogRepository, order::OrderRepository, product::ProductRepository,
};
use lotus_core::{DailySales, DashboardData, DashboardStats, Order, StockPolicy};

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Builds the full dashboard payload.
    pub async fn get_dashboard_data(&self) -> DbResult<DashboardData> {
        debug!("Computing dashboard data");

        let stats = self.monthly_stats().await?;

        // The read-only sub-repositories share our pool; the stock policy
        // is irrelevant for reads.
        let orders = OrderRepository::new(self.pool.clone(), StockPolicy::AllowNegative);
        let products = ProductRepository::new(self.pool.clone());
        let activity = ActivityLogRepository::new(self.pool.clone());

        Ok(DashboardData {
            stats,
            recent_orders: orders.recent(5).await?,
            recent_activities: activity.recent(10).await?,
            low_stock_products: products.low_stock().await?,
            sales_by_day: self.sales_by_day().await?,
        })
    }

    /// Headline stats for the current calendar month (UTC).
    pub async fn monthly_stats(&self) -> DbResult<DashboardStats> {
        let now = Utc::now();
        let month_start = now
            .date_naive()
            .with_day(1)
            .unwrap_or_else(|| now.date_naive())
            .and_time(NaiveTime::MIN)
            .and_utc();

        let (revenue_cents, orders): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(final_amount_cents), 0), COUNT(*) \
             FROM orders WHERE status = 'completed' AND order_date >= ?1",
        )
        .bind(month_start)
        .fetch_one(&self.pool)
        .await?;

        let new_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        // Fixed 30% margin estimate; real per-product margins would need the
        // cost snapshot the order lines do not carry.
        let profit_cents = revenue_cents * 3 / 10;

        Ok(DashboardStats {
            revenue_cents,
            orders,
            new_customers,
            profit_cents,
        })
    }

    /// 7-day trailing sales series, oldest bucket first.
    ///
    /// Buckets are UTC calendar days from six days ago through today. Days
    /// without sales appear with a zero amount. Cancelled orders are
    /// excluded; pending ones count, matching the register's running total.
    pub async fn sales_by_day(&self) -> DbResult<Vec<DailySales>> {
        let today = Utc::now().date_naive();
        let window_start = (today - Duration::days(6)).and_time(NaiveTime::MIN).and_utc();

        let orders: Vec<Order> = sqlx::query_as(
            "SELECT id, order_number, customer_id, user_id, order_date, status, \
             total_amount_cents, discount_cents, final_amount_cents, payment_method, notes \
             FROM orders WHERE order_date >= ?1 AND status != 'cancelled'",
        )
        .bind(window_start)
        .fetch_all(&self.pool)
        .await?;

        // Bucket in Rust so zero days stay present.
        let mut series: Vec<DailySales> = (0..7)
            .map(|offset| DailySales {
                day: (today - Duration::days(6 - offset)).to_string(),
                amount_cents: 0,
            })
            .collect();

        for order in &orders {
            let day = order.order_date.date_naive().to_string();
            if let Some(bucket) = series.iter_mut().find(|b| b.day == day) {
                bucket.amount_cents += order.final_amount_cents;
            }
        }

        Ok(series)
    }
}
