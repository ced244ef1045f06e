//! # Stock Ledger Operations
//!
//! Pure functions computing the stock, pricing and loyalty effects of the
//! three stock-moving operations:
//!
//! - order creation: stock decreases by each line's quantity
//! - order cancellation: stock increases by each line's quantity
//! - purchase receipt: stock increases and the product's recorded cost is
//!   overwritten by the invoiced unit cost (last-cost-wins)
//!
//! The transaction managers in lotus-db apply these effects inside a single
//! database transaction; this module only computes them. Everything here is
//! deterministic and covered by unit tests, so the atomicity layer can be
//! tested separately from the arithmetic.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{OrderLine, OrderLineDraft, PurchaseLine, PurchaseLineDraft};
use crate::LOYALTY_POINT_UNIT_CENTS;

// =============================================================================
// Stock Policy
// =============================================================================

/// What to do when a sale would drive stock below zero.
///
/// The default lets stock go negative on order creation with no floor
/// check (trust-based retail flow: the register keeps selling and the
/// count is reconciled later). Strict stores can opt into rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Permit negative stock.
    AllowNegative,
    /// Reject the whole order with an insufficient-stock conflict.
    RejectNegative,
}

impl Default for StockPolicy {
    fn default() -> Self {
        StockPolicy::AllowNegative
    }
}

// =============================================================================
// Stock Deltas
// =============================================================================

/// A signed stock movement for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockDelta {
    pub product_id: i64,
    /// Negative for sales, positive for restocking/restoration.
    pub delta: i64,
}

/// Deltas applied when an order is created: `-quantity` per line.
///
/// Lines referencing the same product are merged (stock deltas commute), in
/// first-occurrence order.
pub fn order_creation_deltas(lines: &[OrderLineDraft]) -> Vec<StockDelta> {
    merge(lines.iter().map(|l| StockDelta {
        product_id: l.product_id,
        delta: -l.quantity,
    }))
}

/// Deltas applied when a pending order is cancelled: `+quantity` per line,
/// the exact inverse of [`order_creation_deltas`].
pub fn order_cancellation_deltas(lines: &[OrderLine]) -> Vec<StockDelta> {
    merge(lines.iter().map(|l| StockDelta {
        product_id: l.product_id,
        delta: l.quantity,
    }))
}

/// Deltas applied when a purchase is received: `+quantity` per line.
pub fn purchase_receipt_deltas(lines: &[PurchaseLine]) -> Vec<StockDelta> {
    merge(lines.iter().map(|l| StockDelta {
        product_id: l.product_id,
        delta: l.quantity,
    }))
}

/// Merges deltas by product, preserving first-occurrence order.
fn merge(deltas: impl Iterator<Item = StockDelta>) -> Vec<StockDelta> {
    let mut out: Vec<StockDelta> = Vec::new();
    for d in deltas {
        match out.iter_mut().find(|e| e.product_id == d.product_id) {
            Some(existing) => existing.delta += d.delta,
            None => out.push(d),
        }
    }
    out
}

// =============================================================================
// Cost Updates (last-cost-wins)
// =============================================================================

/// A cost-price overwrite for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostUpdate {
    pub product_id: i64,
    pub unit_cost: Money,
}

/// Cost updates applied when a purchase is received.
///
/// Last-cost-wins: when multiple lines reference the same product, the
/// latest line in input order decides the recorded cost. No weighted
/// averaging.
pub fn receipt_cost_updates(lines: &[PurchaseLine]) -> Vec<CostUpdate> {
    let mut out: Vec<CostUpdate> = Vec::new();
    for line in lines {
        let update = CostUpdate {
            product_id: line.product_id,
            unit_cost: Money::from_cents(line.unit_cost_cents),
        };
        match out.iter_mut().find(|u| u.product_id == line.product_id) {
            Some(existing) => *existing = update,
            None => out.push(update),
        }
    }
    out
}

// =============================================================================
// Pricing & Totals
// =============================================================================

/// Subtotal for one line: `unit_price * quantity`.
#[inline]
pub fn line_subtotal(unit_price: Money, quantity: i64) -> Money {
    unit_price.multiply_quantity(quantity)
}

/// Denormalized order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    /// Sum of line subtotals.
    pub total: Money,
    /// `total - discount`. Always exactly derivable; kept consistent at
    /// every write.
    pub final_amount: Money,
}

/// Computes order totals from line subtotals and a user-entered discount.
pub fn order_totals(subtotals: impl IntoIterator<Item = Money>, discount: Money) -> OrderTotals {
    let total = subtotals
        .into_iter()
        .fold(Money::zero(), |acc, s| acc + s);
    OrderTotals {
        total,
        final_amount: total - discount,
    }
}

/// Total invoiced amount of a purchase from its line drafts.
pub fn purchase_total(lines: &[PurchaseLineDraft]) -> Money {
    lines
        .iter()
        .fold(Money::zero(), |acc, l| {
            acc + line_subtotal(Money::from_cents(l.unit_cost_cents), l.quantity)
        })
}

// =============================================================================
// Loyalty Accrual
// =============================================================================

/// Loyalty points earned by completing an order:
/// `floor(final_amount / 10_000)` minor units per point, integer floor, no
/// rounding. Must be credited exactly once per order; the transaction
/// managers enforce that through the status transition table.
#[inline]
pub fn loyalty_points(final_amount: Money) -> i64 {
    final_amount.cents() / LOYALTY_POINT_UNIT_CENTS
}

// =============================================================================
// Unit Tests
// =============================================================================
