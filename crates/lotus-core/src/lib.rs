//! # lotus-core: Pure Business Logic for Lotus POS
//!
//! This crate is the heart of Lotus POS. It contains all business logic as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! HTTP layer (out of scope)
//!      │
//!      ▼
//! lotus-db (repositories, transactions)
//!      │
//!      ▼
//! lotus-core (THIS CRATE)
//!   types · money · ledger · numbering · validation
//!   NO I/O · NO DATABASE · PURE FUNCTIONS
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Purchase, etc.) and the
//!   status transition tables
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Stock deltas, totals, loyalty accrual, cost updates
//! - [`numbering`] - Order/purchase document numbers
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output - the clock is an argument
//! 2. **No I/O**: database access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are minor units (i64)
//! 4. **Explicit Errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod numbering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use ledger::{StockDelta, StockPolicy};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default low-stock alert threshold when a product doesn't set one.
/// Used only for display/low-stock flags, never enforced as a hard floor.
pub const DEFAULT_ALERT_THRESHOLD: i64 = 5;

/// Minor units of spend per loyalty point. Completing an order credits
/// `floor(final_amount / LOYALTY_POINT_UNIT_CENTS)` points.
pub const LOYALTY_POINT_UNIT_CENTS: i64 = 10_000;
