//! Configuration types for channel-clone

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Where per-user state and scratch media live
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-user files (default: "user_data")
    ///
    /// Holds `config_<user>.json`, `status_<user>.json`, `sent_<user>.json`,
    /// `error_<user>.json`, the `stop_`/`start_` markers and session files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory media files are downloaded into before re-upload (default: "user_data/media")
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

/// Collection and replication tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloneConfig {
    /// Messages requested per history page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Fixed delay after every replicated message, in milliseconds (default: 500)
    ///
    /// Applied regardless of the item's outcome to stay under platform rate limits.
    #[serde(default = "default_send_delay", with = "millis_serde")]
    pub send_delay: Duration,

    /// Number of progress notifications spread over a job (default: 10)
    ///
    /// A notification fires every `max(1, total / progress_steps)` items and
    /// always after the final item.
    #[serde(default = "default_progress_steps")]
    pub progress_steps: u64,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            send_delay: default_send_delay(),
            progress_steps: default_progress_steps(),
        }
    }
}

/// Telegram Bot API notification settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Bot token used for status notifications (None = notifications disabled)
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_notify_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_api_base_url(),
            timeout: default_notify_timeout(),
        }
    }
}

/// REST control API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind the API server to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Main configuration for ChannelCloner
///
/// Fields are organized into sub-configs:
/// - [`storage`](StorageConfig) - per-user state and scratch directories
/// - [`cloning`](CloneConfig) - page size, send delay, progress cadence
/// - [`notifications`](NotificationConfig) - Bot API status notifications
/// - [`api`](ApiConfig) - REST control surface
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-user state and scratch directories
    #[serde(default)]
    pub storage: StorageConfig,

    /// Collection and replication tuning
    #[serde(default)]
    pub cloning: CloneConfig,

    /// Status notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// REST control API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cloning.page_size == 0 {
            return Err(Error::Config {
                message: "page_size must be at least 1".to_string(),
                key: Some("page_size".to_string()),
            });
        }
        if self.cloning.progress_steps == 0 {
            return Err(Error::Config {
                message: "progress_steps must be at least 1".to_string(),
                key: Some("progress_steps".to_string()),
            });
        }
        Ok(())
    }
}

/// A channel id as stored by the front-end: a JSON number or a numeric string
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelRef {
    /// Numeric id (possibly already `-100`-prefixed)
    Id(i64),
    /// Textual id as typed by the user
    Text(String),
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "{id}"),
            ChannelRef::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Per-user settings persisted by the front-end in `config_<user>.json`
///
/// Read-only from the cloner's perspective. Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Platform API id
    #[serde(default)]
    pub api_id: Option<i64>,

    /// Platform API hash
    #[serde(default)]
    pub api_hash: Option<String>,

    /// Phone number of the account the session belongs to
    #[serde(default)]
    pub phone: Option<String>,

    /// Channel to read history from
    #[serde(default)]
    pub source_channel_id: Option<ChannelRef>,

    /// Channel to replicate into
    #[serde(default)]
    pub target_channel_id: Option<ChannelRef>,
}

impl UserConfig {
    /// Whether all credentials needed to open a session are present
    pub fn has_credentials(&self) -> bool {
        self.api_id.is_some() && self.api_hash.is_some() && self.phone.is_some()
    }

    /// Source and target channel, when both are configured
    pub fn channels(&self) -> Option<(&ChannelRef, &ChannelRef)> {
        match (&self.source_channel_id, &self.target_channel_id) {
            (Some(source), Some(target)) => Some((source, target)),
            _ => None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("user_data")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("user_data/media")
}

fn default_page_size() -> usize {
    100
}

fn default_send_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_progress_steps() -> u64 {
    10
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_notify_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Millisecond Duration serialization helper
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
