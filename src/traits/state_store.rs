use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::Priority;

/// A reminder created locally (or mirrored from the server), stored in
/// the local database. Lifecycle: pending -> notified -> completed.
/// Rows are never physically deleted.
#[derive(Debug, Clone)]
pub struct LocalReminder {
    pub id: i64,
    pub server_id: Option<String>,
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub priority: Priority,
    pub is_completed: bool,
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new local reminder.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub priority: Priority,
    pub server_id: Option<String>,
}

impl NewReminder {
    pub fn new(title: &str, due_at: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            due_at,
            priority: Priority::Medium,
            server_id: None,
        }
    }
}

/// Durable local state shared by all monitors.
///
/// Every write is committed before the call returns, so a caller's
/// next read observes it — the voice monitor's check-then-log sequence
/// depends on this to stay at-most-once across restarts.
///
/// Monitors touch disjoint key namespaces (`"<domain>_<field>"`), so no
/// cross-monitor transactions are needed.
#[async_trait]
pub trait StateStore: Send + Sync {
    // Sync state: one `last_sync_<monitor>` row per monitor.
    async fn get_sync_state(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set_sync_state(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn get_last_sync(&self, monitor: &str) -> anyhow::Result<Option<DateTime<Utc>>>;
    async fn set_last_sync(&self, monitor: &str) -> anyhow::Result<()>;

    // Session state: per-monitor diff snapshots, JSON values, full
    // replacement on every write (last-write-wins, no merge).
    async fn get_session_value(&self, key: &str) -> anyhow::Result<Option<Value>>;
    async fn set_session_value(&self, key: &str, value: &Value) -> anyhow::Result<()>;

    /// Record a delivered notification. Inserting a duplicate
    /// `notification_id` is a no-op success, which makes delivery
    /// marking idempotent.
    async fn log_notification(
        &self,
        notification_id: &str,
        notification_type: &str,
        title: &str,
        message: &str,
        spoken: bool,
    ) -> anyhow::Result<()>;

    async fn was_notification_delivered(&self, notification_id: &str) -> anyhow::Result<bool>;

    // Local reminders.
    async fn add_local_reminder(&self, reminder: &NewReminder) -> anyhow::Result<i64>;

    /// Reminders with `due_at <= now`, not completed and not yet
    /// notified, ordered by `due_at` ascending.
    async fn get_due_reminders(&self) -> anyhow::Result<Vec<LocalReminder>>;

    async fn mark_reminder_notified(&self, reminder_id: i64) -> anyhow::Result<()>;
    async fn mark_reminder_complete(&self, reminder_id: i64) -> anyhow::Result<()>;

    /// Cheap connectivity probe for the health endpoint.
    async fn health_check(&self) -> anyhow::Result<()>;

    /// Close the underlying pool. Further calls will fail.
    async fn close(&self);
}
