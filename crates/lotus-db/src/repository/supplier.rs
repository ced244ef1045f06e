//! Supplier repository. Plain CRUD.

use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use lotus_core::{NewSupplier, Supplier};

const SUPPLIER_COLUMNS: &str = "id, name, contact_person, phone, email, address";

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn create(&self, draft: NewSupplier) -> DbResult<Supplier> {
        let result = sqlx::query(
            "INSERT INTO suppliers (name, contact_person, phone, email, address) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&draft.name)
        .bind(&draft.contact_person)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.address)
        .execute(&self.pool)
        .await?;

        Ok(Supplier {
            id: result.last_insert_rowid(),
            name: draft.name,
            contact_person: draft.contact_person,
            phone: draft.phone,
            email: draft.email,
            address: draft.address,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Supplier> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");

        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn list_all(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name");

        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update(&self, supplier: &Supplier) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE suppliers SET name = ?2, contact_person = ?3, phone = ?4, \
             email = ?5, address = ?6 WHERE id = ?1",
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", supplier.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_supplier, test_db};

    #[tokio::test]
    async fn supplier_round_trip() {
        let db = test_db().await;
        let id = seed_supplier(&db).await;

        let mut supplier = db.suppliers().get_by_id(id).await.unwrap();
        supplier.phone = Some("0351234567".to_string());
        db.suppliers().update(&supplier).await.unwrap();

        let after = db.suppliers().get_by_id(id).await.unwrap();
        assert_eq!(after.phone.as_deref(), Some("0351234567"));
    }
}
