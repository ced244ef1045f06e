//! # Seed Data Generator
//!
//! Populates the database with development data: an admin account, a few
//! categories, suppliers, customers and a configurable number of products.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p lotus-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p lotus-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p lotus-db --bin seed -- --db ./data/lotus.db
//! ```

use std::env;

use lotus_core::{
    NewCategory, NewCustomer, NewProduct, NewStaffUser, NewSupplier, StaffRole,
    DEFAULT_ALERT_THRESHOLD,
};
use lotus_db::{Database, DbConfig};

/// Product categories with base names for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Cola", "Lemon Soda", "Orange Soda", "Energy Drink", "Green Tea", "Black Tea",
            "Mineral Water", "Sparkling Water", "Apple Juice", "Orange Juice",
        ],
    ),
    (
        "Snacks",
        &[
            "Potato Chips", "Corn Chips", "Rice Crackers", "Chocolate Bar", "Gummy Candy",
            "Cookies", "Wafers", "Peanuts", "Dried Mango", "Popcorn",
        ],
    ),
    (
        "Dairy",
        &[
            "Fresh Milk", "Condensed Milk", "Yogurt", "Cheese Slices", "Butter",
            "Ice Cream Cup", "Soy Milk", "Whipping Cream", "Milk Tea", "Kefir",
        ],
    ),
    (
        "Household",
        &[
            "Dish Soap", "Laundry Detergent", "Paper Towels", "Trash Bags", "Sponges",
            "Toilet Paper", "Hand Soap", "Bleach", "Air Freshener", "Matches",
        ],
    ),
];

const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 500),
    ("Large", 1_000),
    ("330ml", 0),
    ("500ml", 300),
    ("1L", 800),
    ("6-Pack", 2_500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./lotus_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lotus POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./lotus_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Lotus POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Admin account. Placeholder hash: set a real password through the app.
    db.users()
        .create(NewStaffUser {
            username: "admin".to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            full_name: "Store Admin".to_string(),
            email: "admin@example.com".to_string(),
            role: StaffRole::Admin,
            active: true,
        })
        .await?;
    println!("✓ Created admin account");

    let mut category_ids = Vec::new();
    for (name, _) in CATEGORIES {
        let category = db
            .categories()
            .create(NewCategory {
                name: name.to_string(),
                description: None,
            })
            .await?;
        category_ids.push(category.id);
    }
    println!("✓ Created {} categories", category_ids.len());

    for n in 1..=5 {
        db.suppliers()
            .create(NewSupplier {
                name: format!("Supplier {n}"),
                contact_person: Some(format!("Contact {n}")),
                phone: Some(format!("090000{n:04}")),
                email: None,
                address: None,
            })
            .await?;
        db.customers()
            .create(NewCustomer {
                name: format!("Customer {n}"),
                phone: Some(format!("091000{n:04}")),
                email: None,
                address: None,
            })
            .await?;
    }
    println!("✓ Created 5 suppliers and 5 customers");

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (_, products)) in CATEGORIES.iter().enumerate() {
        for (product_idx, product_name) in products.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + product_idx * 20 + size_idx;
                let draft = generate_product(
                    product_name,
                    size_name,
                    *price_addon,
                    category_ids[category_idx],
                    seed,
                );

                if let Err(e) = db.products().create(draft).await {
                    eprintln!("Failed to insert product {seed}: {e}");
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let low = db.products().low_stock().await?;
    println!("  Low-stock products: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product draft with deterministic pseudo-random data.
fn generate_product(
    name: &str,
    size: &str,
    price_addon: i64,
    category_id: i64,
    seed: usize,
) -> NewProduct {
    let sku = format!(
        "{}-{:04}",
        &name.replace(' ', "")[..3.min(name.len())].to_uppercase(),
        seed
    );
    let barcode = Some(format!("893{:010}", seed));

    // base 1,990 - 9,990 minor units + size addon
    let base_price = 1_990 + ((seed * 17) % 8_000) as i64;
    let selling_price_cents = base_price + price_addon;

    // cost 60-80% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_price_cents = selling_price_cents * cost_pct / 100;

    NewProduct {
        name: format!("{} {}", name, size),
        sku,
        barcode,
        description: None,
        category_id: Some(category_id),
        cost_price_cents,
        selling_price_cents,
        stock_quantity: (seed % 101) as i64,
        alert_threshold: DEFAULT_ALERT_THRESHOLD,
    }
}
