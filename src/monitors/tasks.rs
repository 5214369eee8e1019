use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::notifiers::NotificationRouter;
use crate::traits::{ControlApi, Monitor, StateStore};
use crate::types::Priority;

const FETCH_LIMIT: u32 = 50;
const FETCH_DAYS: u32 = 1;
const NOTIFY_CAP: usize = 3;

/// Watches the user's upcoming tasks and announces the ones that have
/// newly become overdue. Snapshot key: `task_overdue_ids`.
///
/// A task that drops out of the overdue set (completed or rescheduled)
/// leaves the snapshot too, so it fires again if it ever re-enters.
pub struct TaskMonitor {
    client: Arc<dyn ControlApi>,
    store: Arc<dyn StateStore>,
    router: Arc<NotificationRouter>,
}

impl TaskMonitor {
    pub fn new(
        client: Arc<dyn ControlApi>,
        store: Arc<dyn StateStore>,
        router: Arc<NotificationRouter>,
    ) -> Self {
        Self { client, store, router }
    }
}

#[async_trait]
impl Monitor for TaskMonitor {
    fn name(&self) -> &'static str {
        "tasks"
    }

    async fn check(&self) -> anyhow::Result<Value> {
        let response = self
            .client
            .get_upcoming_tasks(FETCH_LIMIT, FETCH_DAYS, true)
            .await?;

        let prev_overdue: HashSet<String> = self
            .store
            .get_session_value("task_overdue_ids")
            .await?
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        let (overdue, due_today): (Vec<_>, Vec<_>) =
            response.tasks.iter().partition(|t| t.is_overdue);

        let current_overdue: HashSet<String> =
            overdue.iter().map(|t| t.id.clone()).collect();
        let new_overdue: HashSet<&String> =
            current_overdue.difference(&prev_overdue).collect();

        self.store
            .set_session_value(
                "task_overdue_ids",
                &json!(current_overdue.iter().collect::<Vec<_>>()),
            )
            .await?;

        let newly_overdue = overdue
            .iter()
            .filter(|t| new_overdue.contains(&t.id))
            .take(NOTIFY_CAP);
        for task in newly_overdue {
            self.router
                .dispatch(
                    "Task overdue",
                    &task.title,
                    task.priority.unwrap_or(Priority::High),
                )
                .await;
        }

        Ok(json!({
            "total_upcoming": response.total_count,
            "overdue_count": overdue.len(),
            "due_today_count": due_today.len(),
            "new_overdue": new_overdue.len(),
        }))
    }
}
