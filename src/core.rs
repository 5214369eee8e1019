use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::ControlClient;
use crate::config::AppConfig;
use crate::daemon::start_health_server;
use crate::monitors::{CalendarMonitor, EmailMonitor, ReminderMonitor, TaskMonitor, VoiceMonitor};
use crate::notifiers::{ChatNotifier, DesktopNotifier, NotificationRouter};
use crate::scheduler::{MonitorTelemetry, Scheduler};
use crate::state::SqliteStateStore;
use crate::traits::{ControlApi, Monitor, Notifier, SpeechBackend, StateStore};
use crate::voice::{SpeechEngine, TtsEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Stopped,
    Initializing,
    Running,
    Stopping,
}

/// Owns the wired-up runtime: store, client, sinks, monitors,
/// scheduler. Start is idempotent; stop tears the pieces down
/// independently so one failure never strands the rest.
pub struct Daemon {
    config: AppConfig,
    telemetry: Arc<MonitorTelemetry>,
    state: DaemonState,
    store: Option<Arc<dyn StateStore>>,
    scheduler: Option<Scheduler>,
}

impl Daemon {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            telemetry: Arc::new(MonitorTelemetry::new()),
            state: DaemonState::Stopped,
            store: None,
            scheduler: None,
        }
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }

    pub fn telemetry(&self) -> Arc<MonitorTelemetry> {
        self.telemetry.clone()
    }

    /// Initialize everything, run every monitor once, then start the
    /// interval loops. Calling start on a running daemon is a no-op.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.state == DaemonState::Running {
            warn!("Daemon already running, ignoring start");
            return Ok(());
        }
        self.state = DaemonState::Initializing;
        info!("Starting daemon");

        let store: Arc<dyn StateStore> =
            Arc::new(SqliteStateStore::new(&self.config.state.db_path).await?);

        let client: Arc<dyn ControlApi> = Arc::new(ControlClient::new(
            &self.config.api.base_url,
            &self.config.api.api_key,
            self.config.api.timeout_secs,
        )?);

        let mut sinks: Vec<Arc<dyn Notifier>> = Vec::new();
        if self.config.notifications.desktop {
            sinks.push(Arc::new(DesktopNotifier::new()));
        }
        if self.config.notifications.chat {
            sinks.push(Arc::new(ChatNotifier::new(client.clone())));
        }
        let router = Arc::new(NotificationRouter::new(sinks));

        let speech = if self.config.voice.enabled {
            let backend = TtsEngine::resolve(
                &self.config.voice.backend,
                self.config.voice.rate_wpm,
                self.config.voice.volume,
            );
            if backend.is_none() {
                warn!(
                    backend = %self.config.voice.backend,
                    "No usable TTS backend, voice notifications will be silent"
                );
            }
            Arc::new(SpeechEngine::new(
                backend.map(|b| Arc::new(b) as Arc<dyn SpeechBackend>),
            ))
        } else {
            Arc::new(SpeechEngine::disabled())
        };

        let mut scheduler = Scheduler::new(store.clone(), self.telemetry.clone());
        let mins = &self.config.monitors;
        let jobs: [(Arc<dyn Monitor>, u64); 5] = [
            (
                Arc::new(EmailMonitor::new(client.clone(), store.clone(), router.clone())),
                mins.email_interval_mins,
            ),
            (
                Arc::new(TaskMonitor::new(client.clone(), store.clone(), router.clone())),
                mins.task_interval_mins,
            ),
            (
                Arc::new(CalendarMonitor::new(client.clone(), store.clone(), router.clone())),
                mins.calendar_interval_mins,
            ),
            (
                Arc::new(ReminderMonitor::new(client.clone(), store.clone(), router.clone())),
                mins.reminder_interval_mins,
            ),
            (
                Arc::new(VoiceMonitor::new(client.clone(), store.clone(), speech)),
                mins.voice_interval_mins,
            ),
        ];
        for (monitor, interval_mins) in jobs {
            scheduler.register(monitor, Duration::from_secs(interval_mins * 60));
        }

        // First cycle up front so a fresh start reports immediately.
        scheduler.run_all_once().await;
        scheduler.start();

        self.store = Some(store);
        self.scheduler = Some(scheduler);
        self.state = DaemonState::Running;
        info!("Daemon running");
        Ok(())
    }

    /// Stop the loops, drain in-flight cycles, close the store.
    pub async fn stop(&mut self) {
        if self.state != DaemonState::Running {
            return;
        }
        self.state = DaemonState::Stopping;
        info!("Stopping daemon");

        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop().await;
        }
        if let Some(store) = self.store.take() {
            store.close().await;
        }

        self.state = DaemonState::Stopped;
        info!("Daemon stopped");
    }
}

/// Run the daemon until SIGINT or SIGTERM, then shut down cleanly.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let mut daemon = Daemon::new(config.clone());

    let telemetry = daemon.telemetry();
    let bind = config.daemon.health_bind.clone();
    let port = config.daemon.health_port;
    tokio::spawn(async move {
        if let Err(e) = start_health_server(&bind, port, telemetry).await {
            error!("Health server failed: {}", e);
        }
    });

    daemon.start().await?;

    wait_for_shutdown_signal().await;
    info!("Shutdown signal received");

    daemon.stop().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
