//! # Customer Repository
//!
//! Customer CRUD and search. Loyalty points are credited by the order
//! transaction manager inside its own transaction; the `adjust_loyalty`
//! method here exists for manual corrections only.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lotus_core::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, loyalty_points";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer with a zero loyalty balance.
    pub async fn create(&self, draft: NewCustomer) -> DbResult<Customer> {
        debug!(name = %draft.name, "Creating customer");

        let result = sqlx::query(
            "INSERT INTO customers (name, phone, email, address, loyalty_points) \
             VALUES (?1, ?2, ?3, ?4, 0)",
        )
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.address)
        .execute(&self.pool)
        .await?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            name: draft.name,
            phone: draft.phone,
            email: draft.email,
            address: draft.address,
            loyalty_points: 0,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Customer> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name");

        Ok(sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Case-insensitive substring search over name, phone and email.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim().to_lowercase());

        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE lower(name) LIKE ?1 \
                OR lower(coalesce(phone, '')) LIKE ?1 \
                OR lower(coalesce(email, '')) LIKE ?1 \
             ORDER BY name LIMIT ?2"
        );

        Ok(sqlx::query_as::<_, Customer>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Updates contact fields. The loyalty balance is not written here.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET name = ?2, phone = ?3, email = ?4, address = ?5 WHERE id = ?1",
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer.id));
        }

        Ok(())
    }

    /// Manual loyalty correction by a relative delta.
    pub async fn adjust_loyalty(&self, id: i64, delta: i64) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE customers SET loyalty_points = loyalty_points + ?2 WHERE id = ?1")
                .bind(id)
                .bind(delta)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_customer, test_db};

    #[tokio::test]
    async fn new_customer_starts_with_zero_points() {
        let db = test_db().await;
        let id = seed_customer(&db).await;

        let customer = db.customers().get_by_id(id).await.unwrap();
        assert_eq!(customer.loyalty_points, 0);
    }

    #[tokio::test]
    async fn adjust_loyalty_applies_relative_delta() {
        let db = test_db().await;
        let id = seed_customer(&db).await;
        let repo = db.customers();

        repo.adjust_loyalty(id, 10).await.unwrap();
        repo.adjust_loyalty(id, -3).await.unwrap();

        assert_eq!(repo.get_by_id(id).await.unwrap().loyalty_points, 7);
    }

    #[tokio::test]
    async fn search_finds_by_phone() {
        let db = test_db().await;
        let id = seed_customer(&db).await;

        let hits = db.customers().search("0900000001", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
    }
}
