//! # Document Numbers
//!
//! Deterministic order/purchase number generation from a supplied clock
//! instant. Format: `ORD-YYYYMMDD-NNNNN` where `NNNNN` is the low-order five
//! digits of epoch milliseconds.
//!
//! This is best-effort uniqueness, not guaranteed under high concurrency;
//! the database backs it with a UNIQUE index, so a collision surfaces as a
//! conflict instead of a duplicate.

use chrono::{DateTime, Utc};

/// Generates an order number, e.g. `ORD-20260829-04217`.
pub fn order_number(now: DateTime<Utc>) -> String {
    document_number("ORD", now)
}

/// Generates a purchase number, e.g. `PUR-20260829-04217`.
pub fn purchase_number(now: DateTime<Utc>) -> String {
    document_number("PUR", now)
}

fn document_number(prefix: &str, now: DateTime<Utc>) -> String {
    let date_part = now.format("%Y%m%d");
    let seq = now.timestamp_millis().rem_euclid(100_000);
    format!("{}-{}-{:05}", prefix, date_part, seq)
}
