use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::notifiers::NotificationRouter;
use crate::traits::{ControlApi, Monitor, StateStore};
use crate::types::Priority;

/// Watches both reminder sources: the server's due list, deduplicated
/// through the `reminder_notified_ids` snapshot (which only ever
/// grows), and the local store's due scan, where `notification_sent`
/// on the row itself is the guard.
pub struct ReminderMonitor {
    client: Arc<dyn ControlApi>,
    store: Arc<dyn StateStore>,
    router: Arc<NotificationRouter>,
}

impl ReminderMonitor {
    pub fn new(
        client: Arc<dyn ControlApi>,
        store: Arc<dyn StateStore>,
        router: Arc<NotificationRouter>,
    ) -> Self {
        Self { client, store, router }
    }
}

#[async_trait]
impl Monitor for ReminderMonitor {
    fn name(&self) -> &'static str {
        "reminders"
    }

    async fn check(&self) -> anyhow::Result<Value> {
        let response = self.client.get_due_reminders().await?;

        let mut notified_ids: HashSet<String> = self
            .store
            .get_session_value("reminder_notified_ids")
            .await?
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        let new_due: Vec<_> = response
            .reminders
            .iter()
            .filter(|r| notified_ids.insert(r.id.clone()))
            .collect();

        self.store
            .set_session_value(
                "reminder_notified_ids",
                &json!(notified_ids.iter().collect::<Vec<_>>()),
            )
            .await?;

        for reminder in &new_due {
            let message = if reminder.title.is_empty() {
                "You have a reminder"
            } else {
                reminder.title.as_str()
            };
            self.router
                .dispatch(
                    "Reminder",
                    message,
                    reminder.priority.unwrap_or(Priority::Medium),
                )
                .await;
        }

        let local_due = self.store.get_due_reminders().await?;
        for local in &local_due {
            self.router
                .dispatch("Reminder", &local.title, local.priority)
                .await;
            self.store.mark_reminder_notified(local.id).await?;
        }

        Ok(json!({
            "server_due": response.reminders.len(),
            "new_notifications": new_due.len(),
            "local_due": local_due.len(),
        }))
    }
}
