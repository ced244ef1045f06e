//! # lotus-db: Database Layer for Lotus POS
//!
//! This crate provides database access for the Lotus POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lotus POS Data Flow                              │
//! │                                                                         │
//! │  API handler (create_order)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     lotus-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (order.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ OrderRepo     │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ PurchaseRepo  │    │ ...          │  │   │
//! │  │   │ Management    │    │ ProductRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     ./data/lotus.db                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (order, purchase, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lotus_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/db.sqlite");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let order = db.orders().create_order(draft, &lines).await?;
//! db.orders().update_order_status(order.id, OrderStatus::Completed).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::activity::ActivityLogRepository;
pub use repository::backup::BackupLogRepository;
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::settings::SettingsRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
