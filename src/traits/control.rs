use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Priority;

/// Unified status payload from the control API. Only the calendar
/// section is consumed by the daemon; the rest of the payload is
/// ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub calendar: CalendarStatus,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CalendarStatus {
    #[serde(default)]
    pub events_today: i64,
    #[serde(default)]
    pub next_event: Option<NextEvent>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NextEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UnreadEmails {
    #[serde(default)]
    pub emails: Vec<Email>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Email {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
    /// Priority assigned by the server-side classifier, if any.
    #[serde(default)]
    pub priority_level: Option<Priority>,
}

impl Email {
    /// Display name for the sender, falling back through the address.
    pub fn sender(&self) -> &str {
        self.from_name
            .as_deref()
            .or(self.from_email.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpcomingTasks {
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DueReminders {
    #[serde(default)]
    pub reminders: Vec<ServerReminder>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerReminder {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PendingVoice {
    #[serde(default)]
    pub notifications: Vec<VoiceNotification>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceNotification {
    pub id: String,
    #[serde(default)]
    pub notification_type: String,
    #[serde(default)]
    pub title: String,
    /// Short text meant for TTS playback.
    #[serde(default)]
    pub spoken_message: String,
    /// Full text, used when no spoken variant was produced.
    #[serde(default)]
    pub full_message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderCreated {
    pub id: String,
}

/// Generic success/error envelope returned by the send endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SendOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// The remote productivity API consumed by the monitors.
///
/// Pure data access — no diffing or notification logic lives behind
/// this trait. The HTTP implementation is [`crate::client::ControlClient`];
/// tests substitute an in-memory stub.
#[async_trait]
pub trait ControlApi: Send + Sync {
    async fn get_status(&self) -> anyhow::Result<StatusPayload>;

    async fn get_unread_emails(
        &self,
        limit: u32,
        priority: Option<Priority>,
    ) -> anyhow::Result<UnreadEmails>;

    async fn get_upcoming_tasks(
        &self,
        limit: u32,
        days: u32,
        my_tasks_only: bool,
    ) -> anyhow::Result<UpcomingTasks>;

    async fn get_due_reminders(&self) -> anyhow::Result<DueReminders>;

    async fn get_upcoming_reminders(&self, hours: u32) -> anyhow::Result<DueReminders>;

    async fn create_reminder(
        &self,
        title: &str,
        description: &str,
        due_at: DateTime<Utc>,
        priority: Priority,
    ) -> anyhow::Result<ReminderCreated>;

    async fn complete_reminder(&self, reminder_id: &str) -> anyhow::Result<()>;

    async fn snooze_reminder(&self, reminder_id: &str, minutes: u32) -> anyhow::Result<()>;

    async fn get_pending_voice_notifications(&self, limit: u32) -> anyhow::Result<PendingVoice>;

    async fn mark_voice_notification_delivered(&self, notification_id: &str)
        -> anyhow::Result<()>;

    async fn send_notification(
        &self,
        channel: &str,
        title: &str,
        message: &str,
        priority: Priority,
        action_url: &str,
    ) -> anyhow::Result<SendOutcome>;

    /// Send a direct chat message to the user through the control API.
    async fn send_chat_dm(&self, message: &str) -> anyhow::Result<SendOutcome>;
}
