//! Catalog configuration.
//!
//! Embedders build a [`CatalogConfig`] directly or from JSON; the binary
//! goes through [`Cli`], where every flag can also come from a
//! `BIKE_CATALOG_*` environment variable.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::backoff::RetryPolicy;
use crate::logging::LogFormat;

pub const DEFAULT_APP_ID: &str = "default-app-id";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Settings for the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Sent as the `key` query parameter. Empty is allowed; the endpoint decides.
    pub api_key: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GenerationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.initial_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `{api_base}/models/{model}:generateContent?key={api_key}`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

/// Top-level configuration of a catalog client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Namespaces every stored path.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Custom auth token; anonymous sign-in when absent.
    pub initial_auth_token: Option<String>,
    pub generation: GenerationConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            initial_auth_token: None,
            generation: GenerationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl CatalogConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Bike catalog server.
#[derive(Debug, Parser)]
#[command(name = "bike-catalog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Application id used to namespace stored data.
    #[arg(long, env = "BIKE_CATALOG_APP_ID", default_value = DEFAULT_APP_ID)]
    pub app_id: String,

    /// Custom auth token; anonymous sign-in when absent.
    #[arg(long, env = "BIKE_CATALOG_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Base URL of the text-generation API.
    #[arg(long, env = "BIKE_CATALOG_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Generation model name.
    #[arg(long, env = "BIKE_CATALOG_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Generation API key.
    #[arg(long, env = "BIKE_CATALOG_API_KEY", default_value = "")]
    pub api_key: String,

    /// Retries after the first generation attempt.
    #[arg(long, env = "BIKE_CATALOG_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// First backoff wait in milliseconds.
    #[arg(long, env = "BIKE_CATALOG_INITIAL_DELAY_MS", default_value_t = DEFAULT_INITIAL_DELAY_MS)]
    pub initial_delay_ms: u64,

    /// Per-attempt timeout in seconds.
    #[arg(
        long,
        env = "BIKE_CATALOG_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    pub request_timeout_secs: u64,

    /// Address the HTTP surface listens on.
    #[arg(long, env = "BIKE_CATALOG_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// Log output format.
    #[arg(long, env = "BIKE_CATALOG_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Cli {
    /// The catalog configuration these flags describe.
    pub fn config(&self) -> CatalogConfig {
        CatalogConfig {
            app_id: self.app_id.clone(),
            initial_auth_token: self.auth_token.clone().filter(|t| !t.trim().is_empty()),
            generation: GenerationConfig {
                api_base: self.api_base.clone(),
                model: self.model.clone(),
                api_key: self.api_key.clone(),
                max_retries: self.max_retries,
                initial_delay_ms: self.initial_delay_ms,
                request_timeout_secs: self.request_timeout_secs,
            },
        }
    }
}
