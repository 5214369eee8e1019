mod chat;
mod desktop;

pub use chat::ChatNotifier;
pub use desktop::DesktopNotifier;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::traits::Notifier;
use crate::types::Priority;

/// Fans a notification out to every enabled sink.
///
/// One sink's failure is logged and never blocks the others, and never
/// fails the calling monitor cycle.
pub struct NotificationRouter {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl NotificationRouter {
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub async fn dispatch(&self, title: &str, message: &str, priority: Priority) {
        if self.sinks.is_empty() {
            debug!(title, message, "No sinks enabled, dropping notification");
            return;
        }
        for sink in &self.sinks {
            match sink.notify(title, message, priority).await {
                Ok(()) => debug!(sink = sink.name(), title, "Notification delivered"),
                Err(e) => warn!(sink = sink.name(), title, "Notification failed: {}", e),
            }
        }
    }
}
