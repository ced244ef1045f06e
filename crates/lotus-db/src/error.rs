//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Taxonomy
//! Four classes surface to the HTTP layer:
//! - Validation: [`DbError::Core`] wrapping a `ValidationError` - malformed
//!   input, operation never attempted.
//! - NotFound: [`DbError::NotFound`] - referenced record does not exist,
//!   no partial effects.
//! - Conflict: [`DbError::UniqueViolation`], [`DbError::ForeignKeyViolation`],
//!   and `Core` wrapping an illegal status transition or insufficient stock.
//! - Storage: everything else - the operation aborted and, because every
//!   multi-step mutation runs in one transaction, nothing was applied.

use thiserror::Error;

use lotus_core::{CoreError, ValidationError};

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate SKU, barcode, username,
    /// order/purchase number).
    #[error("duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// Raised when referencing a non-existent row, or when deleting a
    /// product/customer still referenced by historical orders.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Business rule violation from lotus-core (illegal status transition,
    /// insufficient stock, failed validation).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and numeric id.
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for the Conflict class: illegal transitions, uniqueness and
    /// referential-integrity violations, insufficient stock.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::Core(CoreError::IllegalTransition { .. })
                | DbError::Core(CoreError::InsufficientStock { .. })
        )
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// SQLite constraint failures arrive as database errors with recognizable
/// messages:
/// `UNIQUE constraint failed: <table>.<column>` and
/// `FOREIGN KEY constraint failed`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
