use crate::humanize::HumanDuration;
use crate::upscale::HttpConfig;
use crate::worker::WorkerSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Upscale service endpoint (required)
    #[serde(default)]
    pub upscale_url: String,
    /// Access token sent with every upscale request (required, may come from `UPSCALE_API_KEY`)
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Idle wait when the queue is empty
    #[serde(default = "default_no_message_delay")]
    pub no_message_delay: HumanDuration,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upscale_url: String::new(),
            api_key: String::new(),
            no_message_delay: default_no_message_delay(),
            http: HttpSettings::default(),
            queue: QueueConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Settings for the processing loop
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            no_message_delay: self.no_message_delay.as_duration(),
            http: self.http.to_http_config(),
        }
    }
}

fn default_no_message_delay() -> HumanDuration {
    HumanDuration::from_secs(5)
}

/// HTTP session settings for the upscale client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpSettings {
    pub fn to_http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: self.connect_timeout.as_duration(),
            request_timeout: self.request_timeout.as_duration(),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_user_agent() -> String {
    format!("upscaler/{}", env!("CARGO_PKG_VERSION"))
}

/// Queue provider type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueProvider {
    #[default]
    Memory,
    Spool,
}

/// Queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub provider: QueueProvider,
    /// Spool directory (spool provider only)
    #[serde(default = "default_queue_root")]
    pub root: PathBuf,
    #[serde(default = "default_queue_prefix")]
    pub prefix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            provider: QueueProvider::Memory,
            root: default_queue_root(),
            prefix: default_queue_prefix(),
        }
    }
}

fn default_queue_root() -> PathBuf {
    PathBuf::from("data/queue")
}

fn default_queue_prefix() -> String {
    "inbox".to_string()
}

/// Storage provider type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    Memory,
    Local,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProvider,
    /// Output directory (local provider only)
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Memory,
            root: default_storage_root(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/images")
}

fn default_key_prefix() -> String {
    "upscaled".to_string()
}
