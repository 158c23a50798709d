//! # Configuration
//!
//! Manages the loading and parsing of the bot's configuration file (`config.yaml`).
//! Every section has defaults, so an empty file yields a working local setup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::domain::reply::KeyboardLimits;
use crate::domain::types::PayloadBudget;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub messengers: Vec<MessengerConfig>,
    #[serde(default)]
    pub payloads: PayloadsConfig,
    #[serde(default)]
    pub keyboard: KeyboardLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_start_stage")]
    pub start_stage: String,
    #[serde(default)]
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            messengers: Vec::new(),
            payloads: PayloadsConfig::default(),
            keyboard: KeyboardLimits::default(),
            logging: LoggingConfig::default(),
            start_stage: default_start_stage(),
            debug: false,
        }
    }
}

/// Address the core server listens on.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest inbound message body accepted, in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One platform the bot replies on.
#[derive(Debug, Clone, Deserialize)]
pub struct MessengerConfig {
    pub name: String,
    #[serde(default = "default_rate")]
    pub messages_per_second: u32,
    #[serde(default)]
    pub payload_budget: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadsConfig {
    #[serde(default = "default_true")]
    pub shorten: bool,
    /// Messenger whose callback-data limit bounds every payload.
    #[serde(default = "default_target")]
    pub target: String,
}

impl Default for PayloadsConfig {
    fn default() -> Self {
        Self {
            shorten: true,
            target: default_target(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file: default_log_file(),
            filter: default_filter(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8888
}
fn default_max_message_bytes() -> usize {
    1024 * 1024
}
fn default_rate() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_target() -> String {
    "tg".to_string()
}
fn default_log_dir() -> String {
    "data".to_string()
}
fn default_log_file() -> String {
    "session.log".to_string()
}
fn default_filter() -> String {
    "info".to_string()
}
fn default_start_stage() -> String {
    "start".to_string()
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse config.yaml")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Byte budget of the payload target, honoring per-messenger overrides.
    pub fn payload_budget(&self) -> PayloadBudget {
        self.messengers
            .iter()
            .find(|m| m.name == self.payloads.target)
            .and_then(|m| m.payload_budget)
            .map(PayloadBudget::new)
            .unwrap_or_else(|| PayloadBudget::for_messenger(&self.payloads.target))
    }
}
