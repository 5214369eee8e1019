use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::notifiers::NotificationRouter;
use crate::traits::{ControlApi, Monitor, StateStore};
use crate::types::Priority;

/// Warn this far ahead of the next meeting.
const WARN_WINDOW_SECS: i64 = 15 * 60;

/// Watches the next calendar event and fires a single warning once it
/// enters the 15-minute window. Snapshot key: `calendar_last_notified`
/// holds the event id that was last warned about, so repeated cycles
/// inside the window stay silent until the next event takes over.
pub struct CalendarMonitor {
    client: Arc<dyn ControlApi>,
    store: Arc<dyn StateStore>,
    router: Arc<NotificationRouter>,
}

impl CalendarMonitor {
    pub fn new(
        client: Arc<dyn ControlApi>,
        store: Arc<dyn StateStore>,
        router: Arc<NotificationRouter>,
    ) -> Self {
        Self { client, store, router }
    }
}

#[async_trait]
impl Monitor for CalendarMonitor {
    fn name(&self) -> &'static str {
        "calendar"
    }

    async fn check(&self) -> anyhow::Result<Value> {
        let status = self.client.get_status().await?;
        let calendar = status.calendar;

        if let Some(event) = &calendar.next_event {
            if let Some(start_time) = event.start_time {
                let secs_until = (start_time - Utc::now()).num_seconds();

                let last_notified: Option<String> = self
                    .store
                    .get_session_value("calendar_last_notified")
                    .await?
                    .map(serde_json::from_value)
                    .transpose()?;

                // Events already started (secs <= 0) get no warning.
                if secs_until > 0
                    && secs_until <= WARN_WINDOW_SECS
                    && last_notified.as_deref() != Some(event.id.as_str())
                {
                    self.store
                        .set_session_value("calendar_last_notified", &json!(event.id))
                        .await?;

                    let title = if event.title.is_empty() {
                        "Upcoming meeting"
                    } else {
                        event.title.as_str()
                    };
                    self.router
                        .dispatch(
                            &format!("Meeting in {} minutes", secs_until / 60),
                            title,
                            Priority::High,
                        )
                        .await;
                }
            }
        }

        Ok(json!({
            "events_today": calendar.events_today,
            "next_event": calendar.next_event.as_ref().map(|e| e.title.clone()),
        }))
    }
}
