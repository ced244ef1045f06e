//! # Database Migrations
//!
//! Embedded SQL migrations for Lotus POS.
//!
//! The `sqlx::migrate!()` macro embeds all SQL files from
//! `migrations/sqlite/` into the binary at compile time; applied migrations
//! are tracked in the `_sqlx_migrations` table, so running them is
//! idempotent.
//!
//! ## Adding New Migrations
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. NEVER modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations, in filename order, each in its own
/// transaction. Safe to run multiple times.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns (total_migrations, applied_migrations) for diagnostics.
///
/// A database that has never been migrated has no `_sqlx_migrations` table;
/// that reads as zero applied. Any other query failure propagates.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count,
        Err(sqlx::Error::Database(e)) if e.message().contains("no such table") => 0,
        Err(e) => return Err(e.into()),
    };

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn status_reports_zero_applied_before_first_migration() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert!(total > 0);
        assert_eq!(applied, 0);

        db.run_migrations().await.unwrap();
        let (_, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(applied, total);
    }
}
