use async_trait::async_trait;

use crate::types::Priority;

/// A delivery channel for surfacing information to the user (desktop
/// popup, chat DM, ...).
///
/// Delivery failure is never fatal to a monitor cycle: the router logs
/// the error and moves on to the next sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sink name for logs (e.g. "desktop", "chat").
    fn name(&self) -> &'static str;

    /// Whether this sink found a working backend at construction time.
    fn is_available(&self) -> bool {
        true
    }

    async fn notify(&self, title: &str, message: &str, priority: Priority) -> anyhow::Result<()>;
}
