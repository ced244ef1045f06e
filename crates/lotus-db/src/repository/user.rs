//! # User Repository
//!
//! Database operations for staff accounts. Password hashing and session
//! handling live in the HTTP layer; this stores and retrieves the records.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lotus_core::{NewStaffUser, StaffUser};

const USER_COLUMNS: &str = "id, username, password_hash, full_name, email, role, active";

/// Repository for staff account database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new staff account.
    pub async fn create(&self, draft: NewStaffUser) -> DbResult<StaffUser> {
        debug!(username = %draft.username, "Creating staff user");

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, full_name, email, role, active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&draft.username)
        .bind(&draft.password_hash)
        .bind(&draft.full_name)
        .bind(&draft.email)
        .bind(draft.role)
        .bind(draft.active)
        .execute(&self.pool)
        .await?;

        Ok(StaffUser {
            id: result.last_insert_rowid(),
            username: draft.username,
            password_hash: draft.password_hash,
            full_name: draft.full_name,
            email: draft.email,
            role: draft.role,
            active: draft.active,
        })
    }

    /// Gets a staff account by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<StaffUser> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");

        sqlx::query_as::<_, StaffUser>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Gets a staff account by username (login lookup).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<StaffUser>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");

        Ok(sqlx::query_as::<_, StaffUser>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Lists all staff accounts ordered by username.
    pub async fn list_all(&self) -> DbResult<Vec<StaffUser>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");

        Ok(sqlx::query_as::<_, StaffUser>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Updates all mutable fields of a staff account.
    pub async fn update(&self, user: &StaffUser) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE users SET username = ?2, password_hash = ?3, full_name = ?4, \
             email = ?5, role = ?6, active = ?7 WHERE id = ?1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user.id));
        }

        Ok(())
    }

    /// Deactivates an account instead of deleting it. Order history keeps
    /// referencing the user.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::test_db;
    use lotus_core::StaffRole;

    fn draft(username: &str) -> NewStaffUser {
        NewStaffUser {
            username: username.to_string(),
            password_hash: "$argon2$test".to_string(),
            full_name: "Some Person".to_string(),
            email: format!("{username}@example.com"),
            role: StaffRole::Staff,
            active: true,
        }
    }

    #[tokio::test]
    async fn create_and_lookup_by_username() {
        let db = test_db().await;
        let repo = db.users();

        let created = repo.create(draft("alice")).await.unwrap();
        let found = repo.get_by_username("alice").await.unwrap().unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.role, StaffRole::Staff);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let db = test_db().await;
        let repo = db.users();

        repo.create(draft("bob")).await.unwrap();
        let err = repo.create(draft("bob")).await.unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn deactivate_keeps_the_record() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.create(draft("carol")).await.unwrap();
        repo.deactivate(user.id).await.unwrap();

        let after = repo.get_by_id(user.id).await.unwrap();
        assert!(!after.active);
    }
}
