//! Shared helpers for repository tests.
//!
//! Every test gets its own in-memory SQLite database with migrations
//! applied, so tests are independent and need no cleanup.

use crate::pool::{Database, DbConfig};
use lotus_core::{
    NewCustomer, NewProduct, NewStaffUser, NewSupplier, StaffRole, DEFAULT_ALERT_THRESHOLD,
};

/// Opens a fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database should open")
}

/// A product draft with sensible defaults for tests.
pub(crate) fn sample_product(sku: &str, price_cents: i64, cost_cents: i64, stock: i64) -> NewProduct {
    NewProduct {
        name: format!("Product {sku}"),
        sku: sku.to_string(),
        barcode: None,
        description: None,
        category_id: None,
        cost_price_cents: cost_cents,
        selling_price_cents: price_cents,
        stock_quantity: stock,
        alert_threshold: DEFAULT_ALERT_THRESHOLD,
    }
}

/// Creates a staff user and returns its id.
pub(crate) async fn seed_user(db: &Database) -> i64 {
    db.users()
        .create(NewStaffUser {
            username: "cashier1".to_string(),
            password_hash: "$argon2$test".to_string(),
            full_name: "Test Cashier".to_string(),
            email: "cashier1@example.com".to_string(),
            role: StaffRole::Cashier,
            active: true,
        })
        .await
        .expect("seed user")
        .id
}

/// Creates a customer with zero loyalty points and returns its id.
pub(crate) async fn seed_customer(db: &Database) -> i64 {
    db.customers()
        .create(NewCustomer {
            name: "Test Customer".to_string(),
            phone: Some("0900000001".to_string()),
            email: None,
            address: None,
        })
        .await
        .expect("seed customer")
        .id
}

/// Creates a supplier and returns its id.
pub(crate) async fn seed_supplier(db: &Database) -> i64 {
    db.suppliers()
        .create(NewSupplier {
            name: "Test Supplier".to_string(),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
        })
        .await
        .expect("seed supplier")
        .id
}

/// Creates a product and returns its id.
pub(crate) async fn seed_product(db: &Database, sku: &str, price_cents: i64, stock: i64) -> i64 {
    db.products()
        .create(sample_product(sku, price_cents, price_cents / 2, stock))
        .await
        .expect("seed product")
        .id
}
