//! # Error Types
//!
//! Domain-specific error types for lotus-core.
//!
//! ## Taxonomy
//! - [`ValidationError`] - malformed input; the operation is not attempted.
//! - [`CoreError`] - business rule violations (illegal status transitions,
//!   insufficient stock under the strict policy).
//!
//! Persistence failures (`NotFound`, uniqueness conflicts, storage errors)
//! live in lotus-db's `DbError`, which wraps both of these.
//!
//! ## Design Principles
//! 1. `thiserror` derive macros, not manual impls
//! 2. Context in messages (sku, id, statuses)
//! 3. Errors are enum variants, never strings

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested status change is not in the transition table.
    ///
    /// Completion and cancellation carry side effects (loyalty accrual,
    /// stock restoration), so a repeated or out-of-order transition must be
    /// rejected rather than re-applied.
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Stock would go negative and the strict stock policy is in effect.
    #[error("insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: i64, requested: i64 },

    /// Validation error (wraps [`ValidationError`]).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs; nothing is persisted when one of
/// these surfaces.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be at least one.
    #[error("{field} must be at least 1")]
    QuantityTooSmall { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (characters, shape).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An order or purchase must carry at least one line.
    #[error("at least one line is required")]
    EmptyLines,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
