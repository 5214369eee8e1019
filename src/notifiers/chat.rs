use std::sync::Arc;

use async_trait::async_trait;

use crate::traits::{ControlApi, Notifier};
use crate::types::Priority;

/// Chat DM sink. Delivery goes through the control API, which relays
/// the message to the user's chat workspace.
pub struct ChatNotifier {
    client: Arc<dyn ControlApi>,
}

impl ChatNotifier {
    pub fn new(client: Arc<dyn ControlApi>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    fn name(&self) -> &'static str {
        "chat"
    }

    async fn notify(&self, title: &str, message: &str, _priority: Priority) -> anyhow::Result<()> {
        let formatted = format!("*{}*\n{}", title, message);
        let outcome = self.client.send_chat_dm(&formatted).await?;
        if !outcome.success {
            anyhow::bail!(
                "chat DM rejected: {}",
                outcome.error.unwrap_or_else(|| "unknown".to_string())
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubControlApi;

    #[tokio::test]
    async fn test_formats_title_and_message() {
        let api = Arc::new(StubControlApi::default());
        let notifier = ChatNotifier::new(api.clone());

        notifier
            .notify("Reminder", "Stretch your legs", Priority::Medium)
            .await
            .unwrap();

        assert_eq!(api.sent_dms(), vec!["*Reminder*\nStretch your legs"]);
    }

    #[tokio::test]
    async fn test_api_rejection_is_an_error() {
        let api = Arc::new(StubControlApi::default());
        api.reject_dms("user opted out");
        let notifier = ChatNotifier::new(api);

        let err = notifier
            .notify("t", "m", Priority::Low)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("user opted out"));
    }
}
