//! Configuration file handling
//!
//! Precedence, lowest to highest: built-in defaults, `config.toml`,
//! environment (including a `.env` file), command-line flags.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Environment variable holding the store connection string
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable overriding the backend HTTP base URL
pub const BACKEND_URL_ENV: &str = "MEETCHECK_BACKEND_URL";
/// Environment variable overriding the WebSocket audio URL
pub const WS_URL_ENV: &str = "MEETCHECK_WS_URL";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Backend endpoints
    #[serde(default)]
    pub backend: BackendConfig,

    /// Persistent store settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Audio streaming cadence
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// User fixture inserted by the user-creation scenario
    #[serde(default)]
    pub fixture: FixtureConfig,
}

/// Backend endpoints
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL for HTTP endpoints (`/api/health`, `/api/audio/websocket`)
    #[serde(default = "default_http_url")]
    pub http_url: String,

    /// WebSocket audio endpoint
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            http_url: default_http_url(),
            ws_url: default_ws_url(),
        }
    }
}

fn default_http_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:5000/audio".to_string()
}

/// Persistent store settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string; database scenarios fail when unset
    pub url: Option<String>,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Connection probes (HTTP requests, WebSocket handshake, store connect)
    #[serde(default = "default_probe")]
    pub probe_secs: u64,

    /// Optional replies during connectivity checks
    #[serde(default = "default_connect_response")]
    pub connect_response_secs: u64,

    /// `meeting_created` reply to `recording_started`
    #[serde(default = "default_meeting_response")]
    pub meeting_response_secs: u64,

    /// Replies during a simulated recording session
    #[serde(default = "default_session_response")]
    pub session_response_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe_secs: default_probe(),
            connect_response_secs: default_connect_response(),
            meeting_response_secs: default_meeting_response(),
            session_response_secs: default_session_response(),
        }
    }
}

impl Timeouts {
    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }
}

fn default_probe() -> u64 {
    5
}
fn default_connect_response() -> u64 {
    5
}
fn default_meeting_response() -> u64 {
    10
}
fn default_session_response() -> u64 {
    10
}

/// Audio streaming cadence
#[derive(Debug, Deserialize, Clone)]
pub struct StreamingConfig {
    /// Chunks sent by the audio-streaming scenario
    #[serde(default = "default_chunk_count")]
    pub chunk_count: usize,

    /// Delay between chunks in milliseconds
    #[serde(default = "default_chunk_interval")]
    pub chunk_interval_ms: u64,

    /// Chunks sent by the extension simulation
    #[serde(default = "default_simulation_chunks")]
    pub simulation_chunks: usize,

    /// Delay between simulation chunks in milliseconds
    #[serde(default = "default_simulation_interval")]
    pub simulation_interval_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_count: default_chunk_count(),
            chunk_interval_ms: default_chunk_interval(),
            simulation_chunks: default_simulation_chunks(),
            simulation_interval_ms: default_simulation_interval(),
        }
    }
}

fn default_chunk_count() -> usize {
    3
}
fn default_chunk_interval() -> u64 {
    100
}
fn default_simulation_chunks() -> usize {
    10
}
fn default_simulation_interval() -> u64 {
    1000
}

/// User fixture settings
#[derive(Debug, Deserialize, Clone)]
pub struct FixtureConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_user_name")]
    pub name: String,
    #[serde(default = "default_user_email")]
    pub email: String,
    #[serde(default = "default_user_role")]
    pub role: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            name: default_user_name(),
            email: default_user_email(),
            role: default_user_role(),
        }
    }
}

fn default_user_id() -> String {
    "complete-workflow-test-user".to_string()
}
fn default_user_name() -> String {
    "Test User".to_string()
}
fn default_user_email() -> String {
    "test@example.com".to_string()
}
fn default_user_role() -> String {
    "user".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply overrides from the process environment
    ///
    /// A `.env` file in the working directory is loaded first, without
    /// replacing variables that are already set.
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.is_empty()) {
            self.backend.http_url = url;
        }
        if let Some(url) = lookup(WS_URL_ENV).filter(|v| !v.is_empty()) {
            self.backend.ws_url = url;
        }
    }

    /// Full URL of the health endpoint
    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.backend.http_url.trim_end_matches('/'))
    }

    /// Full URL of the audio endpoint reachability probe
    pub fn audio_endpoint_url(&self) -> String {
        format!(
            "{}/api/audio/websocket",
            self.backend.http_url.trim_end_matches('/')
        )
    }
}
