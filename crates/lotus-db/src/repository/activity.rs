//! # Activity Log Repository
//!
//! Read side of the append-only audit trail. Transactional writers append
//! their own rows via the shared `log_activity` helper; this repository
//! provides standalone appends (for non-transactional events like logins)
//! and the recent-activity feed.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use lotus_core::ActivityLog;

const ACTIVITY_COLUMNS: &str = "id, user_id, action, details, timestamp";

#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogRepository { pool }
    }

    /// Appends a standalone activity row outside any transaction.
    pub async fn log(
        &self,
        user_id: Option<i64>,
        action: &str,
        details: Option<String>,
    ) -> DbResult<ActivityLog> {
        let timestamp = Utc::now();

        let result = sqlx::query(
            "INSERT INTO activity_logs (user_id, action, details, timestamp) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(action)
        .bind(&details)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(ActivityLog {
            id: result.last_insert_rowid(),
            user_id,
            action: action.to_string(),
            details,
            timestamp,
        })
    }

    /// Returns the most recent entries, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<ActivityLog>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs \
             ORDER BY timestamp DESC, id DESC LIMIT ?1"
        );

        Ok(sqlx::query_as::<_, ActivityLog>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_user, test_db};

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let db = test_db().await;
        let user_id = seed_user(&db).await;
        let repo = db.activity();

        repo.log(Some(user_id), "Login", None).await.unwrap();
        repo.log(Some(user_id), "Logout", None).await.unwrap();

        let entries = repo.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "Logout");
        assert_eq!(entries[1].action, "Login");
    }
}
