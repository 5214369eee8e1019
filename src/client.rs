use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::warn;

use crate::traits::{
    ControlApi, DueReminders, PendingVoice, ReminderCreated, SendOutcome, StatusPayload,
    UnreadEmails, UpcomingTasks,
};
use crate::types::Priority;

/// Classified control API error — tells the monitor *why* a fetch
/// failed so the log line is actionable.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection refused, DNS failure, timeout, reset.
    Transport,
    /// Non-2xx HTTP status from the API.
    Http(u16),
    /// 2xx response with a body we could not decode.
    Decode,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ApiErrorKind::Transport => write!(f, "control API unreachable: {}", self.message),
            ApiErrorKind::Http(status) => {
                write!(f, "control API returned HTTP {}: {}", status, self.message)
            }
            ApiErrorKind::Decode => write!(f, "control API response malformed: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            ApiError {
                kind: ApiErrorKind::Http(status.as_u16()),
                message: e.to_string(),
            }
        } else if e.is_decode() {
            ApiError {
                kind: ApiErrorKind::Decode,
                message: e.to_string(),
            }
        } else {
            ApiError {
                kind: ApiErrorKind::Transport,
                message: e.to_string(),
            }
        }
    }
}

/// Validate the base URL. HTTPS is required for remote hosts so the
/// API key is never sent in cleartext; plain HTTP is allowed only for
/// localhost.
fn validate_base_url(base_url: &str) -> anyhow::Result<()> {
    let parsed = reqwest::Url::parse(base_url)
        .map_err(|e| anyhow::anyhow!("Invalid base_url '{}': {}", base_url, e))?;

    let host = parsed.host_str().unwrap_or("");
    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            let is_localhost =
                host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";
            if is_localhost {
                warn!(
                    "Using unencrypted HTTP for local control API at '{}'",
                    base_url
                );
                Ok(())
            } else {
                anyhow::bail!(
                    "HTTP is not allowed for remote URLs (base_url: '{}'). \
                     Use HTTPS to protect your API key in transit.",
                    base_url
                )
            }
        }
        other => anyhow::bail!(
            "Unsupported URL scheme '{}' in base_url '{}'",
            other,
            base_url
        ),
    }
}

/// HTTP implementation of [`ControlApi`] against the control API.
///
/// Pure data access: requests go out with an `Api-Key` header and a
/// fixed timeout, payloads come back typed. No business logic here.
pub struct ControlClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ControlClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        validate_base_url(base_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ControlApi for ControlClient {
    async fn get_status(&self) -> anyhow::Result<StatusPayload> {
        Ok(self.get("/api/assistant/status/", &[]).await?)
    }

    async fn get_unread_emails(
        &self,
        limit: u32,
        priority: Option<Priority>,
    ) -> anyhow::Result<UnreadEmails> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(priority) = priority {
            query.push(("priority", priority.to_string()));
        }
        Ok(self.get("/api/assistant/emails/unread/", &query).await?)
    }

    async fn get_upcoming_tasks(
        &self,
        limit: u32,
        days: u32,
        my_tasks_only: bool,
    ) -> anyhow::Result<UpcomingTasks> {
        let mut query = vec![("limit", limit.to_string()), ("days", days.to_string())];
        if my_tasks_only {
            query.push(("my_tasks", "true".to_string()));
        }
        Ok(self.get("/api/assistant/tasks/upcoming/", &query).await?)
    }

    async fn get_due_reminders(&self) -> anyhow::Result<DueReminders> {
        Ok(self.get("/api/assistant/reminders/due/", &[]).await?)
    }

    async fn get_upcoming_reminders(&self, hours: u32) -> anyhow::Result<DueReminders> {
        Ok(self
            .get(
                "/api/assistant/reminders/upcoming/",
                &[("hours", hours.to_string())],
            )
            .await?)
    }

    async fn create_reminder(
        &self,
        title: &str,
        description: &str,
        due_at: DateTime<Utc>,
        priority: Priority,
    ) -> anyhow::Result<ReminderCreated> {
        let body = json!({
            "title": title,
            "description": description,
            "due_at": due_at.to_rfc3339(),
            "priority": priority,
            "source": "daemon",
        });
        Ok(self.post("/api/assistant/reminders/", &body).await?)
    }

    async fn complete_reminder(&self, reminder_id: &str) -> anyhow::Result<()> {
        let _: Value = self
            .post(
                &format!("/api/assistant/reminders/{}/complete/", reminder_id),
                &json!({}),
            )
            .await?;
        Ok(())
    }

    async fn snooze_reminder(&self, reminder_id: &str, minutes: u32) -> anyhow::Result<()> {
        let _: Value = self
            .post(
                &format!("/api/assistant/reminders/{}/snooze/", reminder_id),
                &json!({ "minutes": minutes }),
            )
            .await?;
        Ok(())
    }

    async fn get_pending_voice_notifications(&self, limit: u32) -> anyhow::Result<PendingVoice> {
        Ok(self
            .get(
                "/api/assistant/voice/pending/",
                &[("limit", limit.to_string())],
            )
            .await?)
    }

    async fn mark_voice_notification_delivered(
        &self,
        notification_id: &str,
    ) -> anyhow::Result<()> {
        let _: Value = self
            .post(
                &format!("/api/assistant/voice/{}/delivered/", notification_id),
                &json!({}),
            )
            .await?;
        Ok(())
    }

    async fn send_notification(
        &self,
        channel: &str,
        title: &str,
        message: &str,
        priority: Priority,
        action_url: &str,
    ) -> anyhow::Result<SendOutcome> {
        let body = json!({
            "channel": channel,
            "title": title,
            "message": message,
            "priority": priority,
            "action_url": action_url,
        });
        Ok(self.post("/api/assistant/notifications/send/", &body).await?)
    }

    async fn send_chat_dm(&self, message: &str) -> anyhow::Result<SendOutcome> {
        Ok(self
            .post("/api/assistant/chat/dm/", &json!({ "message": message }))
            .await?)
    }
}
