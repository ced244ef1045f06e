//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Search across name, SKU, barcode and description
//! - Low-stock listing (`stock_quantity <= alert_threshold`)
//!
//! Stock levels are never written here directly by business operations;
//! orders and purchases move stock inside their own transactions. The
//! `update` method does accept a stock quantity so that manual corrections
//! from the admin screens remain possible.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lotus_core::{validation, NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, sku, barcode, description, category_id, \
     cost_price_cents, selling_price_cents, stock_quantity, alert_threshold";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Search products
/// let results = repo.search("coke", 20).await?;
///
/// // Get by ID
/// let product = repo.get_by_id(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product after validating the draft.
    pub async fn create(&self, draft: NewProduct) -> DbResult<Product> {
        validation::validate_new_product(&draft).map_err(lotus_core::CoreError::from)?;

        debug!(sku = %draft.sku, name = %draft.name, "Creating product");

        let result = sqlx::query(
            "INSERT INTO products \
             (name, sku, barcode, description, category_id, cost_price_cents, \
              selling_price_cents, stock_quantity, alert_threshold) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&draft.name)
        .bind(&draft.sku)
        .bind(&draft.barcode)
        .bind(&draft.description)
        .bind(draft.category_id)
        .bind(draft.cost_price_cents)
        .bind(draft.selling_price_cents)
        .bind(draft.stock_quantity)
        .bind(draft.alert_threshold)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();

        Ok(Product {
            id,
            name: draft.name,
            sku: draft.sku,
            barcode: draft.barcode,
            description: draft.description,
            category_id: draft.category_id,
            cost_price_cents: draft.cost_price_cents,
            selling_price_cents: draft.selling_price_cents,
            stock_quantity: draft.stock_quantity,
            alert_threshold: draft.alert_threshold,
        })
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");

        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");

        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Lists all products ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");

        Ok(sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Searches products by name, SKU, barcode or description.
    ///
    /// Case-insensitive substring match. An empty query returns all
    /// products up to the limit.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1");
            return Ok(sqlx::query_as::<_, Product>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?);
        }

        let pattern = format!("%{}%", query.to_lowercase());

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE lower(name) LIKE ?1 \
                OR lower(sku) LIKE ?1 \
                OR lower(coalesce(barcode, '')) LIKE ?1 \
                OR lower(coalesce(description, '')) LIKE ?1 \
             ORDER BY name LIMIT ?2"
        );

        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lists products at or below their alert threshold.
    ///
    /// The comparison is inclusive: a product sitting exactly on its
    /// threshold is already low.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock_quantity <= alert_threshold \
             ORDER BY stock_quantity ASC"
        );

        Ok(sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Adjusts stock by a relative delta (manual correction, stocktake).
    ///
    /// Orders and purchases move stock through their own transactions; this
    /// is the standalone path for adjustments made outside either flow.
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> DbResult<()> {
        debug!(product_id = id, delta = delta, "Adjusting stock");

        let result =
            sqlx::query("UPDATE products SET stock_quantity = stock_quantity + ?2 WHERE id = ?1")
                .bind(id)
                .bind(delta)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Updates all mutable fields of a product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET \
             name = ?2, sku = ?3, barcode = ?4, description = ?5, category_id = ?6, \
             cost_price_cents = ?7, selling_price_cents = ?8, stock_quantity = ?9, \
             alert_threshold = ?10 \
             WHERE id = ?1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.stock_quantity)
        .bind(product.alert_threshold)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Fails with a foreign-key violation if order or purchase lines
    /// still reference it, which is intentional: sold products carry
    /// history that must not be orphaned.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?)
    }
}
