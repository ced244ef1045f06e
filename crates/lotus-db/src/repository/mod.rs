//! # Repository Module
//!
//! Database repository implementations for Lotus POS.
//!
//! The repository pattern keeps SQL in one place per aggregate:
//!
//! - [`product::ProductRepository`] - product CRUD, search, low-stock
//! - [`customer::CustomerRepository`] - customer CRUD, search, loyalty
//! - [`supplier::SupplierRepository`] - supplier CRUD
//! - [`category::CategoryRepository`] - category CRUD
//! - [`user::UserRepository`] - staff account CRUD
//! - [`order::OrderRepository`] - the order transaction manager
//! - [`purchase::PurchaseRepository`] - the purchase transaction manager
//! - [`activity::ActivityLogRepository`] - append-only audit trail
//! - [`backup::BackupLogRepository`] - backup/restore operation records
//! - [`dashboard::DashboardRepository`] - read-only aggregates
//! - [`settings::SettingsRepository`] - store settings singleton
//!
//! The order and purchase repositories are more than CRUD: each multi-step
//! mutation (create, status transition) runs inside a single SQLite
//! transaction so that header, lines, stock movements, loyalty credit and
//! the audit row commit or roll back as one unit.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};

use lotus_core::{CoreError, StockDelta, StockPolicy};

use crate::error::{DbError, DbResult};

pub mod activity;
pub mod backup;
pub mod category;
pub mod customer;
pub mod dashboard;
pub mod order;
pub mod product;
pub mod purchase;
pub mod settings;
pub mod supplier;
pub mod user;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Shared Transaction Helpers
// =============================================================================
// Used by both transaction managers. These take an open transaction, never a
// pool: stock movements, loyalty credits and audit rows must commit with the
// operation that caused them.

/// Applies one stock movement as a relative UPDATE.
///
/// `stock_quantity = stock_quantity + delta` never reads the old value into
/// Rust, so two concurrent operations cannot lose each other's update.
/// Under [`StockPolicy::RejectNegative`] a negative movement is guarded and
/// the whole transaction fails with an insufficient-stock conflict instead
/// of driving stock below zero.
pub(crate) async fn apply_stock_delta(
    tx: &mut Transaction<'_, Sqlite>,
    delta: StockDelta,
    policy: StockPolicy,
) -> DbResult<()> {
    let guarded = policy == StockPolicy::RejectNegative && delta.delta < 0;

    let result = if guarded {
        sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + ?2 \
             WHERE id = ?1 AND stock_quantity + ?2 >= 0",
        )
        .bind(delta.product_id)
        .bind(delta.delta)
        .execute(&mut **tx)
        .await?
    } else {
        sqlx::query("UPDATE products SET stock_quantity = stock_quantity + ?2 WHERE id = ?1")
            .bind(delta.product_id)
            .bind(delta.delta)
            .execute(&mut **tx)
            .await?
    };

    if result.rows_affected() == 0 {
        // Distinguish a missing product from a tripped stock guard.
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                .bind(delta.product_id)
                .fetch_optional(&mut **tx)
                .await?;

        return match stock {
            None => Err(DbError::not_found("Product", delta.product_id)),
            Some(_) => Err(CoreError::InsufficientStock {
                product_id: delta.product_id,
                requested: -delta.delta,
            }
            .into()),
        };
    }

    Ok(())
}

/// Credits loyalty points to a customer as a relative UPDATE.
pub(crate) async fn credit_loyalty(
    tx: &mut Transaction<'_, Sqlite>,
    customer_id: i64,
    points: i64,
) -> DbResult<()> {
    if points == 0 {
        return Ok(());
    }

    let result =
        sqlx::query("UPDATE customers SET loyalty_points = loyalty_points + ?2 WHERE id = ?1")
            .bind(customer_id)
            .bind(points)
            .execute(&mut **tx)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    Ok(())
}

/// Appends an activity-log row inside the caller's transaction, so the
/// audit trail never references a rolled-back operation.
pub(crate) async fn log_activity(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: Option<i64>,
    action: &str,
    details: String,
    timestamp: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO activity_logs (user_id, action, details, timestamp) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(user_id)
    .bind(action)
    .bind(details)
    .bind(timestamp)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
