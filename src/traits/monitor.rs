use async_trait::async_trait;
use serde_json::Value;

/// A polling unit responsible for one productivity domain.
///
/// `check()` runs a single fetch-diff-persist-notify cycle and returns
/// a small JSON summary of counts for observability. Errors propagate
/// to the scheduler, which logs them; one failing monitor never blocks
/// the others. A failed check must leave the domain's session snapshot
/// untouched.
#[async_trait]
pub trait Monitor: Send + Sync {
    /// Stable monitor name, used for the `last_sync_<name>` row and in logs.
    fn name(&self) -> &'static str;

    /// Run one check cycle.
    async fn check(&self) -> anyhow::Result<Value>;
}
