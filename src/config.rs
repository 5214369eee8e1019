use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub monitors: MonitorsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "minderd.db".to_string()
}

/// Per-monitor poll intervals, all in minutes. Every monitor runs once
/// a minute unless overridden.
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorsConfig {
    #[serde(default = "default_interval_mins")]
    pub email_interval_mins: u64,
    #[serde(default = "default_interval_mins")]
    pub task_interval_mins: u64,
    #[serde(default = "default_interval_mins")]
    pub calendar_interval_mins: u64,
    #[serde(default = "default_interval_mins")]
    pub reminder_interval_mins: u64,
    #[serde(default = "default_interval_mins")]
    pub voice_interval_mins: u64,
}

impl Default for MonitorsConfig {
    fn default() -> Self {
        Self {
            email_interval_mins: default_interval_mins(),
            task_interval_mins: default_interval_mins(),
            calendar_interval_mins: default_interval_mins(),
            reminder_interval_mins: default_interval_mins(),
            voice_interval_mins: default_interval_mins(),
        }
    }
}

fn default_interval_mins() -> u64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub desktop: bool,
    #[serde(default = "default_true")]
    pub chat: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            chat: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VoiceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Preferred TTS backend: "auto", "say", "espeak" or "spd-say".
    #[serde(default = "default_tts_backend")]
    pub backend: String,
    /// Speech rate in words per minute.
    #[serde(default = "default_rate_wpm")]
    pub rate_wpm: u32,
    /// Volume from 0.0 to 1.0. Only applied where the backend supports it.
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: default_tts_backend(),
            rate_wpm: default_rate_wpm(),
            volume: default_volume(),
        }
    }
}

fn default_tts_backend() -> String {
    "auto".to_string()
}
fn default_rate_wpm() -> u32 {
    150
}
fn default_volume() -> f32 {
    0.8
}

#[derive(Debug, Deserialize, Clone)]
pub struct DaemonConfig {
    #[serde(default = "default_health_port")]
    pub health_port: u16,
    /// IP address to bind the health server to. Set to "0.0.0.0" to
    /// listen on all interfaces.
    #[serde(default = "default_health_bind")]
    pub health_bind: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            health_port: default_health_port(),
            health_bind: default_health_bind(),
        }
    }
}

fn default_health_port() -> u16 {
    8484
}

fn default_health_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Commented starter config written by `minderd init`.
pub const DEFAULT_CONFIG: &str = r#"# minderd configuration
# All monitors poll every 1 minute by default.

[api]
base_url = "https://control.example.com"
api_key = "your-api-key-here"
timeout_secs = 30

[state]
db_path = "minderd.db"

[monitors]
email_interval_mins = 1
task_interval_mins = 1
calendar_interval_mins = 1
reminder_interval_mins = 1
voice_interval_mins = 1

[notifications]
desktop = true
chat = true

[voice]
enabled = true
backend = "auto"   # or "say", "espeak", "spd-say"
rate_wpm = 150
volume = 0.8

[daemon]
health_port = 8484
health_bind = "127.0.0.1"
"#;

/// Write the starter config if none exists. Returns true if written.
pub fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(true)
}
