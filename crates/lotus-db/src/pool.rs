//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance (readers don't block the writer)
//! - Better crash recovery
//!
//! Writes are serialized by SQLite's single-writer model; combined with the
//! single-transaction rule in the order/purchase repositories this is what
//! makes multi-step mutations atomic and free of lost updates.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use lotus_core::StockPolicy;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::backup::BackupLogRepository;
use crate::repository::category::CategoryRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::dashboard::DashboardRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::supplier::SupplierRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/lotus.db")
///     .max_connections(5)
///     .stock_policy(StockPolicy::RejectNegative);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a single-register POS)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    pub min_connections: u32,

    /// Connection timeout duration.
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    pub run_migrations: bool,

    /// What to do when a sale would drive stock negative.
    /// Default preserves the permissive legacy behavior.
    pub stock_policy: StockPolicy,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            stock_policy: StockPolicy::default(),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Sets the stock policy applied by the order transaction manager.
    pub fn stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// In-memory SQLite requires a single connection: each new connection
    /// would otherwise see a fresh empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
            stock_policy: StockPolicy::default(),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./lotus.db")).await?;
/// let order = db.orders().create_order(&draft, &lines).await?;
/// let dashboard = db.dashboard().get_dashboard_data().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    stock_policy: StockPolicy,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite: WAL mode, NORMAL synchronous, foreign keys ON
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path with mode=rwc creates the file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            // WAL mode: readers don't block the writer
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: safe from corruption, may lose the last
            // transaction on power failure
            .synchronous(SqliteSynchronous::Normal)
            // Foreign keys are OFF by default in SQLite for backwards
            // compatibility; the schema relies on them
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            stock_policy: config.stock_policy,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool, for advanced queries not
    /// covered by repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The stock policy applied by the order transaction manager.
    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    /// Returns the staff user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Returns the category repository.
    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the customer repository.
    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Returns the supplier repository.
    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    /// Returns the order transaction manager.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone(), self.stock_policy)
    }

    /// Returns the purchase transaction manager.
    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone())
    }

    /// Returns the activity log repository.
    pub fn activity(&self) -> ActivityLogRepository {
        ActivityLogRepository::new(self.pool.clone())
    }

    /// Returns the backup log repository.
    pub fn backups(&self) -> BackupLogRepository {
        BackupLogRepository::new(self.pool.clone())
    }

    /// Returns the dashboard aggregator.
    pub fn dashboard(&self) -> DashboardRepository {
        DashboardRepository::new(self.pool.clone())
    }

    /// Returns the store settings repository.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool. Call on shutdown.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
