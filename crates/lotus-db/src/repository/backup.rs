//! # Backup Log Repository
//!
//! Records of backup and restore operations. The file transfer itself
//! happens in the HTTP layer; this keeps the audit record. Each entry is
//! appended together with a matching activity-log row in one transaction,
//! so the two trails cannot disagree.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::repository::log_activity;
use lotus_core::{BackupKind, BackupLog, NewBackupLog};

const BACKUP_COLUMNS: &str = "id, user_id, filename, timestamp, kind, success, notes";

#[derive(Debug, Clone)]
pub struct BackupLogRepository {
    pool: SqlitePool,
}

impl BackupLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BackupLogRepository { pool }
    }

    /// Appends a backup/restore record plus its activity-log row.
    pub async fn log(&self, draft: NewBackupLog) -> DbResult<BackupLog> {
        let timestamp = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO backup_logs (user_id, filename, timestamp, kind, success, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(draft.user_id)
        .bind(&draft.filename)
        .bind(timestamp)
        .bind(draft.kind)
        .bind(draft.success)
        .bind(&draft.notes)
        .execute(&mut *tx)
        .await?;

        let action = match draft.kind {
            BackupKind::Backup => "Backup created",
            BackupKind::Restore => "Backup restored",
        };
        log_activity(
            &mut tx,
            draft.user_id,
            action,
            format!("{} operation: {}", draft.kind.as_str(), draft.filename),
            timestamp,
        )
        .await?;

        tx.commit().await?;

        info!(filename = %draft.filename, kind = draft.kind.as_str(), "Backup operation recorded");

        Ok(BackupLog {
            id: result.last_insert_rowid(),
            user_id: draft.user_id,
            filename: draft.filename,
            timestamp,
            kind: draft.kind,
            success: draft.success,
            notes: draft.notes,
        })
    }

    /// Returns all backup records, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<BackupLog>> {
        let sql = format!(
            "SELECT {BACKUP_COLUMNS} FROM backup_logs ORDER BY timestamp DESC, id DESC"
        );

        Ok(sqlx::query_as::<_, BackupLog>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_user, test_db};

    fn draft(filename: &str, kind: BackupKind) -> NewBackupLog {
        NewBackupLog {
            user_id: None,
            filename: filename.to_string(),
            kind,
            success: true,
            notes: None,
        }
    }

    #[tokio::test]
    async fn logging_writes_backup_and_activity_rows_together() {
        let db = test_db().await;
        let user = seed_user(&db).await;

        let mut d = draft("lotus-2026-08-29.db", BackupKind::Backup);
        d.user_id = Some(user);
        let entry = db.backups().log(d).await.unwrap();

        assert!(entry.id > 0);
        assert!(entry.success);

        let activities = db.activity().recent(10).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].action, "Backup created");
        assert!(activities[0]
            .details
            .as_deref()
            .unwrap()
            .contains("lotus-2026-08-29.db"));
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let db = test_db().await;
        let repo = db.backups();

        repo.log(draft("first.db", BackupKind::Backup)).await.unwrap();
        repo.log(draft("second.db", BackupKind::Restore)).await.unwrap();

        let entries = repo.list_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "second.db");
        assert_eq!(entries[0].kind, BackupKind::Restore);
        assert_eq!(entries[1].filename, "first.db");
    }
}
