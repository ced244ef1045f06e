//! # Domain Types
//!
//! Core domain types used throughout Lotus POS.
//!
//! ## Identity
//! Every entity is keyed by a numeric `id` (database rowid). Business
//! identifiers (sku, barcode, username, order_number, purchase_number) carry
//! UNIQUE indexes and are the handles humans use.
//!
//! ## Status Machines
//! [`OrderStatus`] and [`PurchaseStatus`] carry explicit transition tables.
//! Completion and cancellation have stock and loyalty side effects, so an
//! illegal repeat transition must be rejected rather than re-applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Staff
// =============================================================================

/// Access role for a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Manager,
    Staff,
    Cashier,
}

impl Default for StaffRole {
    fn default() -> Self {
        StaffRole::Staff
    }
}

/// A staff account. Authentication itself (tokens, sessions) is handled by
/// the HTTP layer; this is the persistent record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StaffUser {
    pub id: i64,
    /// Login name - unique.
    pub username: String,
    /// Password hash. Never serialized back out to clients by the HTTP layer.
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub role: StaffRole,
    /// Inactive accounts cannot log in but remain referenced by history.
    pub active: bool,
}

// =============================================================================
// Category
// =============================================================================

/// A product category (display grouping only).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Stock Keeping Unit - unique business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.) - unique when present.
    pub barcode: Option<String>,

    pub description: Option<String>,

    /// Optional category for display grouping.
    pub category_id: Option<i64>,

    /// Latest purchase cost in minor units (last-cost-wins).
    pub cost_price_cents: i64,

    /// Selling price in minor units; snapshotted onto order lines.
    pub selling_price_cents: i64,

    /// Current stock level. May go negative under the permissive stock
    /// policy; correct transactions never drive it negative otherwise.
    pub stock_quantity: i64,

    /// Low-stock flag threshold. Display-only, never a hard floor.
    pub alert_threshold: i64,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Low-stock check: at or below the alert threshold (inclusive).
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.alert_threshold
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with an accruing loyalty balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Adjusted only through the loyalty-accrual rule on order completion.
    pub loyalty_points: i64,
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of a sales order.
///
/// Transitions are one-way: `pending -> completed` or `pending -> cancelled`.
/// Both terminal states carry side effects (loyalty accrual, stock
/// restoration), so any other transition is a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order recorded, stock decremented, loyalty not yet accrued.
    Pending,
    /// Paid and finalized; loyalty accrued. Terminal.
    Completed,
    /// Cancelled; stock restored. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Transition table: `{pending: [completed, cancelled]}`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }

    /// Stable string form used in queries and activity details.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Order
// =============================================================================

/// A sales order header.
///
/// `total_amount_cents` and `final_amount_cents` are denormalized from the
/// lines and kept consistent at every write:
/// `total = sum(line.subtotal)`, `final = total - discount`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    /// Generated document number (e.g. `ORD-20260829-04217`) - unique.
    pub order_number: String,
    pub customer_id: Option<i64>,
    /// Staff account that created the order.
    pub user_id: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub discount_cents: i64,
    pub final_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl Order {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn final_amount(&self) -> Money {
        Money::from_cents(self.final_amount_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// One product/quantity/price entry within an order.
///
/// Uses the snapshot pattern: `unit_price_cents` is frozen at order time and
/// must never follow later product price changes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Selling price at order time (frozen).
    pub unit_price_cents: i64,
    /// `unit_price_cents * quantity`.
    pub subtotal_cents: i64,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Purchase Status
// =============================================================================

/// The status of an inbound purchase.
///
/// `received` applies the stock increase and cost update, exactly once.
/// Cancelling a purchase performs no stock reversal (documented asymmetry
/// with orders).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    /// Stock applied, cost prices updated. Terminal.
    Received,
    /// Terminal. No stock reversal.
    Cancelled,
}

impl PurchaseStatus {
    /// Transition table: `{pending: [received, cancelled]}`.
    pub fn can_transition_to(self, next: PurchaseStatus) -> bool {
        matches!(
            (self, next),
            (PurchaseStatus::Pending, PurchaseStatus::Received)
                | (PurchaseStatus::Pending, PurchaseStatus::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for PurchaseStatus {
    fn default() -> Self {
        PurchaseStatus::Pending
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// An inbound stock purchase from a supplier - the supply-side mirror of
/// [`Order`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: i64,
    /// Generated document number (e.g. `PUR-20260829-04217`) - unique.
    pub purchase_number: String,
    pub supplier_id: Option<i64>,
    pub user_id: i64,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    pub status: PurchaseStatus,
    pub total_amount_cents: i64,
}

impl Purchase {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// One line of a purchase. `unit_cost_cents` is the supplier's invoiced
/// cost from the caller's draft - intentionally not derived from the
/// product, unlike order pricing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseLine {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub subtotal_cents: i64,
}

// =============================================================================
// Activity Log
// =============================================================================

/// Append-only audit trail entry. Written inside the same transaction as
/// the mutation it describes; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: Option<i64>,
    /// Short action label, e.g. "Order created".
    pub action: String,
    pub details: Option<String>,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Backup Log
// =============================================================================

/// Direction of a recorded backup operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BackupKind {
    Backup,
    Restore,
}

impl BackupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupKind::Backup => "backup",
            BackupKind::Restore => "restore",
        }
    }
}

/// A recorded backup or restore operation. The file transfer itself is the
/// HTTP layer's job; this is the persistent record of it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BackupLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub filename: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub kind: BackupKind,
    pub success: bool,
    pub notes: Option<String>,
}

// =============================================================================
// Store Settings
// =============================================================================

/// Singleton store configuration row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StoreSettings {
    pub id: i64,
    pub store_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency_symbol: String,
    pub opening_hours: Option<String>,
}

// =============================================================================
// Draft (Insert) Types
// =============================================================================

/// Insert payload for a staff account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStaffUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub role: StaffRole,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Insert payload for a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Insert payload for a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub cost_price_cents: i64,
    #[serde(default)]
    pub selling_price_cents: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: i64,
}

/// Insert payload for a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Insert payload for a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Draft for order creation. The order number, date and totals are assigned
/// by the transaction manager, never by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub customer_id: Option<i64>,
    /// Staff account creating the order (assigned by the HTTP layer from the
    /// authenticated session).
    pub user_id: i64,
    /// `Pending` by default; `Completed` for walk-in sales that accrue
    /// loyalty immediately.
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// One requested order line. The unit price is NOT part of the draft:
/// it is snapshotted from the product at processing time so clients cannot
/// tamper with pricing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineDraft {
    pub product_id: i64,
    pub quantity: i64,
}

/// Draft for purchase creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseDraft {
    pub supplier_id: Option<i64>,
    pub user_id: i64,
    #[serde(default)]
    pub status: PurchaseStatus,
}

/// One requested purchase line. Carries the supplier's invoiced unit cost.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLineDraft {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// Insert payload for a backup log entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBackupLog {
    pub user_id: Option<i64>,
    pub filename: String,
    pub kind: BackupKind,
    pub success: bool,
    pub notes: Option<String>,
}

/// Insert payload for store settings (upsert).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStoreSettings {
    pub store_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    pub opening_hours: Option<String>,
}

// =============================================================================
// Dashboard Views
// =============================================================================

/// Headline stats for the current calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    /// Sum of final amounts of completed orders this month.
    pub revenue_cents: i64,
    /// Completed order count this month.
    pub orders: i64,
    pub new_customers: i64,
    /// Estimated as a fixed 30% of revenue (carried simplification, not
    /// computed from cost data).
    pub profit_cents: i64,
}

/// One bucket of the 7-day trailing sales series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySales {
    /// Calendar day, `YYYY-MM-DD` (UTC).
    pub day: String,
    pub amount_cents: i64,
}

/// Read-only dashboard aggregate. No side effects; may be computed
/// concurrently with transactions and only ever observes committed state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
    pub recent_activities: Vec<ActivityLog>,
    pub low_stock_products: Vec<Product>,
    pub sales_by_day: Vec<DailySales>,
}

// =============================================================================
// Serde Defaults
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_alert_threshold() -> i64 {
    crate::DEFAULT_ALERT_THRESHOLD
}

fn default_currency_symbol() -> String {
    "đ".to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));

        // Terminal states admit nothing.
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_purchase_status_transitions() {
        assert!(PurchaseStatus::Pending.can_transition_to(PurchaseStatus::Received));
        assert!(PurchaseStatus::Pending.can_transition_to(PurchaseStatus::Cancelled));
        assert!(!PurchaseStatus::Received.can_transition_to(PurchaseStatus::Received));
        assert!(!PurchaseStatus::Received.can_transition_to(PurchaseStatus::Cancelled));
        assert!(!PurchaseStatus::Cancelled.can_transition_to(PurchaseStatus::Received));
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        let mut product = Product {
            id: 1,
            name: "Test".into(),
            sku: "T-1".into(),
            barcode: None,
            description: None,
            category_id: None,
            cost_price_cents: 0,
            selling_price_cents: 0,
            stock_quantity: 5,
            alert_threshold: 5,
        };
        assert!(product.is_low_stock());

        product.stock_quantity = 6;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PurchaseStatus::default(), PurchaseStatus::Pending);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }
}
