use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::traits::{ControlApi, Monitor, StateStore};
use crate::voice::SpeechEngine;

const FETCH_LIMIT: u32 = 5;

/// Plays server-queued voice notifications through local TTS.
///
/// The local notification log is the delivery guard: an id found there
/// is skipped forever, so a restart never replays. The server-side
/// delivered mark is best effort; if it fails, the next fetch returns
/// the id again and the local log filters it out.
///
/// The utterance happens before the log write, so a crash between the
/// two can replay once. The opposite order would silently drop the
/// message instead, which is worse for a spoken channel.
pub struct VoiceMonitor {
    client: Arc<dyn ControlApi>,
    store: Arc<dyn StateStore>,
    speech: Arc<SpeechEngine>,
}

impl VoiceMonitor {
    pub fn new(
        client: Arc<dyn ControlApi>,
        store: Arc<dyn StateStore>,
        speech: Arc<SpeechEngine>,
    ) -> Self {
        Self { client, store, speech }
    }
}

#[async_trait]
impl Monitor for VoiceMonitor {
    fn name(&self) -> &'static str {
        "voice"
    }

    async fn check(&self) -> anyhow::Result<Value> {
        let response = self
            .client
            .get_pending_voice_notifications(FETCH_LIMIT)
            .await?;

        let mut played_count = 0usize;
        for notification in &response.notifications {
            if self
                .store
                .was_notification_delivered(&notification.id)
                .await?
            {
                continue;
            }

            let spoken_message = if notification.spoken_message.is_empty() {
                notification.full_message.as_str()
            } else {
                notification.spoken_message.as_str()
            };
            if spoken_message.is_empty() {
                continue;
            }

            self.speech.speak(spoken_message).await;
            played_count += 1;

            self.store
                .log_notification(
                    &notification.id,
                    &notification.notification_type,
                    &notification.title,
                    spoken_message,
                    true,
                )
                .await?;

            if let Err(e) = self
                .client
                .mark_voice_notification_delivered(&notification.id)
                .await
            {
                warn!(id = %notification.id, "Failed to mark voice notification delivered: {}", e);
            }
        }

        Ok(json!({
            "pending_count": response.notifications.len(),
            "played_count": played_count,
        }))
    }
}
