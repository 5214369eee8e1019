use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::traits::Notifier;
use crate::types::Priority;
use crate::utils::command_exists;

/// Candidate desktop-notification commands, probed in order at
/// construction; the first one present on PATH wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DesktopBackend {
    /// `notify-send` (Linux, libnotify).
    NotifySend,
    /// `osascript` (macOS).
    Osascript,
    /// `terminal-notifier` (macOS, Homebrew).
    TerminalNotifier,
}

impl DesktopBackend {
    const CANDIDATES: [(&'static str, DesktopBackend); 3] = [
        ("notify-send", DesktopBackend::NotifySend),
        ("osascript", DesktopBackend::Osascript),
        ("terminal-notifier", DesktopBackend::TerminalNotifier),
    ];

    fn detect() -> Option<Self> {
        Self::CANDIDATES
            .iter()
            .find(|(program, _)| command_exists(program))
            .map(|(_, backend)| *backend)
    }
}

/// Desktop popup sink. If no backend is available the sink stays
/// registered but drops notifications with a debug log, matching the
/// "deliver may fail, never fatal" contract.
pub struct DesktopNotifier {
    backend: Option<DesktopBackend>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        let backend = DesktopBackend::detect();
        match backend {
            Some(b) => info!(backend = ?b, "Desktop notifications enabled"),
            None => warn!("No desktop notification backend found on PATH"),
        }
        Self { backend }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn urgency(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "normal",
        Priority::High | Priority::Urgent => "critical",
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    async fn notify(&self, title: &str, message: &str, priority: Priority) -> anyhow::Result<()> {
        let Some(backend) = self.backend else {
            debug!(title, "Desktop notification dropped (no backend)");
            return Ok(());
        };

        let status = match backend {
            DesktopBackend::NotifySend => {
                tokio::process::Command::new("notify-send")
                    .arg("--urgency")
                    .arg(urgency(priority))
                    .arg("--app-name")
                    .arg("minderd")
                    .arg(title)
                    .arg(message)
                    .status()
                    .await?
            }
            DesktopBackend::Osascript => {
                let script = format!(
                    "display notification {} with title {}",
                    applescript_quote(message),
                    applescript_quote(title),
                );
                tokio::process::Command::new("osascript")
                    .arg("-e")
                    .arg(script)
                    .status()
                    .await?
            }
            DesktopBackend::TerminalNotifier => {
                tokio::process::Command::new("terminal-notifier")
                    .arg("-title")
                    .arg(title)
                    .arg("-message")
                    .arg(message)
                    .status()
                    .await?
            }
        };

        if !status.success() {
            anyhow::bail!("desktop notifier exited with {}", status);
        }
        Ok(())
    }
}

/// Quote a string for embedding in an osascript expression.
fn applescript_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
