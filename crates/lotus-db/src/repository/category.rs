//! Category repository. Plain CRUD; categories are a display grouping only.

use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use lotus_core::{Category, NewCategory};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn create(&self, draft: NewCategory) -> DbResult<Category> {
        let result = sqlx::query("INSERT INTO categories (name, description) VALUES (?1, ?2)")
            .bind(&draft.name)
            .bind(&draft.description)
            .execute(&self.pool)
            .await?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name: draft.name,
            description: draft.description,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    pub async fn list_all(&self) -> DbResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn update(&self, category: &Category) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE categories SET name = ?2, description = ?3 WHERE id = ?1")
                .bind(category.id)
                .bind(&category.name)
                .bind(&category.description)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", category.id));
        }

        Ok(())
    }

    /// Deletes a category. Products referencing it keep their rows; the
    /// foreign key is declared `ON DELETE SET NULL`.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::test_db;

    #[tokio::test]
    async fn category_crud_round_trip() {
        let db = test_db().await;
        let repo = db.categories();

        let mut cat = repo
            .create(NewCategory {
                name: "Beverages".to_string(),
                description: None,
            })
            .await
            .unwrap();

        cat.description = Some("Drinks".to_string());
        repo.update(&cat).await.unwrap();

        let fetched = repo.get_by_id(cat.id).await.unwrap();
        assert_eq!(fetched.description.as_deref(), Some("Drinks"));

        repo.delete(cat.id).await.unwrap();
        assert!(repo.get_by_id(cat.id).await.is_err());
    }
}
