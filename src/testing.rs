//! In-memory test doubles shared across unit tests.
//!
//! `StubControlApi` serves canned payloads per endpoint; an endpoint
//! left unset returns an error, which doubles as failure injection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::state::SqliteStateStore;
use crate::traits::{
    ControlApi, DueReminders, Notifier, PendingVoice, ReminderCreated, SendOutcome, SpeechBackend,
    StatusPayload, UnreadEmails, UpcomingTasks,
};
use crate::types::Priority;

/// Fresh on-disk store backed by a temp file. Keep the file handle
/// alive for the duration of the test.
pub async fn temp_store() -> (SqliteStateStore, tempfile::NamedTempFile) {
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let store = SqliteStateStore::new(db_file.path().to_str().unwrap())
        .await
        .unwrap();
    (store, db_file)
}

#[derive(Default)]
pub struct StubControlApi {
    status: Mutex<Option<StatusPayload>>,
    emails: Mutex<Option<UnreadEmails>>,
    tasks: Mutex<Option<UpcomingTasks>>,
    due_reminders: Mutex<Option<DueReminders>>,
    pending_voice: Mutex<Option<PendingVoice>>,
    delivered_voice: Mutex<Vec<String>>,
    fail_voice_mark: AtomicBool,
    dms: Mutex<Vec<String>>,
    dm_rejection: Mutex<Option<String>>,
}

impl StubControlApi {
    pub fn set_status(&self, payload: StatusPayload) {
        *self.status.lock().unwrap() = Some(payload);
    }

    pub fn set_emails(&self, payload: UnreadEmails) {
        *self.emails.lock().unwrap() = Some(payload);
    }

    pub fn set_tasks(&self, payload: UpcomingTasks) {
        *self.tasks.lock().unwrap() = Some(payload);
    }

    pub fn set_due_reminders(&self, payload: DueReminders) {
        *self.due_reminders.lock().unwrap() = Some(payload);
    }

    pub fn set_pending_voice(&self, payload: PendingVoice) {
        *self.pending_voice.lock().unwrap() = Some(payload);
    }

    /// Voice notification ids the monitor marked delivered server-side.
    pub fn delivered_voice_ids(&self) -> Vec<String> {
        self.delivered_voice.lock().unwrap().clone()
    }

    /// Make the server-side delivered mark fail.
    pub fn fail_voice_mark(&self) {
        self.fail_voice_mark.store(true, Ordering::SeqCst);
    }

    pub fn sent_dms(&self) -> Vec<String> {
        self.dms.lock().unwrap().clone()
    }

    /// Make chat DMs come back as rejected with the given error.
    pub fn reject_dms(&self, error: &str) {
        *self.dm_rejection.lock().unwrap() = Some(error.to_string());
    }
}

fn take_or_fail<T: Clone>(slot: &Mutex<Option<T>>, endpoint: &str) -> anyhow::Result<T> {
    slot.lock()
        .unwrap()
        .clone()
        .ok_or_else(|| anyhow::anyhow!("stubbed endpoint {} unavailable", endpoint))
}

#[async_trait]
impl ControlApi for StubControlApi {
    async fn get_status(&self) -> anyhow::Result<StatusPayload> {
        take_or_fail(&self.status, "status")
    }

    async fn get_unread_emails(
        &self,
        _limit: u32,
        _priority: Option<Priority>,
    ) -> anyhow::Result<UnreadEmails> {
        take_or_fail(&self.emails, "emails/unread")
    }

    async fn get_upcoming_tasks(
        &self,
        _limit: u32,
        _days: u32,
        _my_tasks_only: bool,
    ) -> anyhow::Result<UpcomingTasks> {
        take_or_fail(&self.tasks, "tasks/upcoming")
    }

    async fn get_due_reminders(&self) -> anyhow::Result<DueReminders> {
        take_or_fail(&self.due_reminders, "reminders/due")
    }

    async fn get_upcoming_reminders(&self, _hours: u32) -> anyhow::Result<DueReminders> {
        Ok(DueReminders::default())
    }

    async fn create_reminder(
        &self,
        _title: &str,
        _description: &str,
        _due_at: DateTime<Utc>,
        _priority: Priority,
    ) -> anyhow::Result<ReminderCreated> {
        Ok(ReminderCreated { id: "stub-reminder".to_string() })
    }

    async fn complete_reminder(&self, _reminder_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn snooze_reminder(&self, _reminder_id: &str, _minutes: u32) -> anyhow::Result<()> {
        Ok(())
    }

    async fn get_pending_voice_notifications(&self, _limit: u32) -> anyhow::Result<PendingVoice> {
        take_or_fail(&self.pending_voice, "voice/pending")
    }

    async fn mark_voice_notification_delivered(
        &self,
        notification_id: &str,
    ) -> anyhow::Result<()> {
        if self.fail_voice_mark.load(Ordering::SeqCst) {
            anyhow::bail!("stubbed mark-delivered failure");
        }
        self.delivered_voice.lock().unwrap().push(notification_id.to_string());
        Ok(())
    }

    async fn send_notification(
        &self,
        _channel: &str,
        _title: &str,
        _message: &str,
        _priority: Priority,
        _action_url: &str,
    ) -> anyhow::Result<SendOutcome> {
        Ok(SendOutcome { success: true, error: None })
    }

    async fn send_chat_dm(&self, message: &str) -> anyhow::Result<SendOutcome> {
        if let Some(error) = self.dm_rejection.lock().unwrap().clone() {
            return Ok(SendOutcome { success: false, error: Some(error) });
        }
        self.dms.lock().unwrap().push(message.to_string());
        Ok(SendOutcome { success: true, error: None })
    }
}

/// Notifier that records every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, Priority)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, Priority)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, title: &str, message: &str, priority: Priority) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string(), priority));
        Ok(())
    }
}

/// Notifier that always fails.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn notify(&self, _title: &str, _message: &str, _priority: Priority) -> anyhow::Result<()> {
        anyhow::bail!("sink is broken")
    }
}

/// Speech backend that records utterances, with one-shot failure
/// injection.
#[derive(Default)]
pub struct StubSpeech {
    spoken: Mutex<Vec<String>>,
    fail_next: AtomicBool,
}

impl StubSpeech {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpeechBackend for StubSpeech {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn speak(&self, text: &str) -> anyhow::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("speaker unplugged");
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
