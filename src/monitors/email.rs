use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::notifiers::NotificationRouter;
use crate::traits::{ControlApi, Monitor, StateStore};
use crate::types::Priority;
use crate::utils::truncate_str;

const FETCH_LIMIT: u32 = 50;
/// Cap per cycle so a flood of new mail doesn't bury the desktop.
const NOTIFY_CAP: usize = 3;
const SUBJECT_MAX_CHARS: usize = 100;

/// Watches the high-priority unread inbox and announces ids it has not
/// seen before. Snapshot keys: `email_unread_count`,
/// `email_high_priority`.
pub struct EmailMonitor {
    client: Arc<dyn ControlApi>,
    store: Arc<dyn StateStore>,
    router: Arc<NotificationRouter>,
}

impl EmailMonitor {
    pub fn new(
        client: Arc<dyn ControlApi>,
        store: Arc<dyn StateStore>,
        router: Arc<NotificationRouter>,
    ) -> Self {
        Self { client, store, router }
    }
}

#[async_trait]
impl Monitor for EmailMonitor {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn check(&self) -> anyhow::Result<Value> {
        let response = self
            .client
            .get_unread_emails(FETCH_LIMIT, Some(Priority::High))
            .await?;

        let prev_ids: HashSet<String> = self
            .store
            .get_session_value("email_high_priority")
            .await?
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        let current_ids: HashSet<String> =
            response.emails.iter().map(|e| e.id.clone()).collect();
        let new_ids: HashSet<&String> = current_ids.difference(&prev_ids).collect();

        // Persist the snapshot before any notification goes out.
        self.store
            .set_session_value("email_unread_count", &json!(response.total_count))
            .await?;
        self.store
            .set_session_value(
                "email_high_priority",
                &json!(current_ids.iter().collect::<Vec<_>>()),
            )
            .await?;

        let new_emails = response
            .emails
            .iter()
            .filter(|e| new_ids.contains(&e.id))
            .take(NOTIFY_CAP);
        for email in new_emails {
            self.router
                .dispatch(
                    &format!("New email from {}", email.sender()),
                    &truncate_str(&email.subject, SUBJECT_MAX_CHARS),
                    email.priority_level.unwrap_or(Priority::Medium),
                )
                .await;
        }

        Ok(json!({
            "unread_count": response.total_count,
            "high_priority_count": response.emails.len(),
            "new_high_priority": new_ids.len(),
        }))
    }
}
