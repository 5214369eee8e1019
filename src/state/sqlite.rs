use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::traits::{LocalReminder, NewReminder, StateStore};

/// SQLite-backed implementation of [`StateStore`].
///
/// Four tables: `sync_state`, `session_state`, `notification_log` and
/// `local_reminders`. The schema is created idempotently on every
/// startup. WAL journal mode; every statement auto-commits, so each
/// write is durable before the call returns.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

/// Set restrictive file permissions (0600) on the database and WAL files.
fn set_db_file_permissions(db_path: &str) {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::Permissions::from_mode(0o600);
    if let Err(e) = std::fs::set_permissions(db_path, mode.clone()) {
        tracing::warn!("Failed to set permissions on {}: {}", db_path, e);
    }
    for suffix in &["-wal", "-shm"] {
        let path = format!("{}{}", db_path, suffix);
        if std::path::Path::new(&path).exists() {
            if let Err(e) = std::fs::set_permissions(&path, mode.clone()) {
                tracing::warn!("Failed to set permissions on {}: {}", path, e);
            }
        }
    }
}

impl SqliteStateStore {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        set_db_file_permissions(db_path);

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sync_state (
                key TEXT PRIMARY KEY,
                value TEXT,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session_state (
                key TEXT PRIMARY KEY,
                value TEXT,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notification_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                notification_id TEXT UNIQUE,
                notification_type TEXT,
                title TEXT,
                message TEXT,
                delivered_at TEXT NOT NULL,
                spoken INTEGER DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS local_reminders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                server_id TEXT UNIQUE,
                title TEXT NOT NULL,
                description TEXT,
                due_at TEXT NOT NULL,
                priority TEXT DEFAULT 'medium',
                is_completed INTEGER DEFAULT 0,
                notification_sent INTEGER DEFAULT 0,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reminders_due
             ON local_reminders(due_at) WHERE is_completed = 0",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notifications_delivered
             ON notification_log(delivered_at)",
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("State store schema ready");
        Ok(())
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_reminder(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<LocalReminder> {
    let due_at: String = row.get("due_at");
    let created_at: String = row.get("created_at");
    let priority: String = row.get("priority");
    Ok(LocalReminder {
        id: row.get("id"),
        server_id: row.get("server_id"),
        title: row.get("title"),
        description: row.get::<Option<String>, _>("description").unwrap_or_default(),
        due_at: DateTime::parse_from_rfc3339(&due_at)?.with_timezone(&Utc),
        priority: priority.parse().unwrap_or_default(),
        is_completed: row.get::<i64, _>("is_completed") != 0,
        notification_sent: row.get::<i64, _>("notification_sent") != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
    })
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get_sync_state(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM sync_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| r.get("value")))
    }

    async fn set_sync_state(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sync_state (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_last_sync(&self, monitor: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
        let value = self
            .get_sync_state(&format!("last_sync_{}", monitor))
            .await?;
        Ok(value
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    async fn set_last_sync(&self, monitor: &str) -> anyhow::Result<()> {
        self.set_sync_state(
            &format!("last_sync_{}", monitor),
            &Utc::now().to_rfc3339(),
        )
        .await
    }

    async fn get_session_value(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM session_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row.and_then(|r| r.get::<Option<String>, _>("value")) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_session_value(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO session_state (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn log_notification(
        &self,
        notification_id: &str,
        notification_type: &str,
        title: &str,
        message: &str,
        spoken: bool,
    ) -> anyhow::Result<()> {
        // OR IGNORE: a duplicate notification_id means we already
        // delivered this one — treated as success.
        sqlx::query(
            "INSERT OR IGNORE INTO notification_log
               (notification_id, notification_type, title, message, delivered_at, spoken)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(notification_id)
        .bind(notification_type)
        .bind(title)
        .bind(message)
        .bind(Utc::now().to_rfc3339())
        .bind(spoken as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn was_notification_delivered(&self, notification_id: &str) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM notification_log WHERE notification_id = ?")
            .bind(notification_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn add_local_reminder(&self, reminder: &NewReminder) -> anyhow::Result<i64> {
        let result = sqlx::query(
            "INSERT INTO local_reminders
               (server_id, title, description, due_at, priority, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&reminder.server_id)
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(reminder.due_at.to_rfc3339())
        .bind(reminder.priority.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get_due_reminders(&self) -> anyhow::Result<Vec<LocalReminder>> {
        let rows = sqlx::query(
            "SELECT id, server_id, title, description, due_at, priority,
                    is_completed, notification_sent, created_at
             FROM local_reminders
             WHERE is_completed = 0
               AND notification_sent = 0
               AND due_at <= ?
             ORDER BY due_at",
        )
        .bind(Utc::now().to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reminder).collect()
    }

    async fn mark_reminder_notified(&self, reminder_id: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE local_reminders SET notification_sent = 1 WHERE id = ?")
            .bind(reminder_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_reminder_complete(&self, reminder_id: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE local_reminders SET is_completed = 1 WHERE id = ?")
            .bind(reminder_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
