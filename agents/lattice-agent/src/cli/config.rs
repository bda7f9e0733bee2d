//! Configuration module
//!
//! Handles loading and validating agent configuration from TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Main configuration structure for the Lattice Agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Unique identifier for this agent
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Controller connection settings
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Status reporting settings
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// WebSocket URL for the controller connection
    #[serde(default = "default_controller_url")]
    pub url: String,

    /// Reconnect interval in milliseconds
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_ms: u64,
}

/// Status reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Interval between host status report cycles in seconds
    #[serde(default = "default_host_status_interval")]
    pub host_status_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.controller.url.starts_with("ws://") && !self.controller.url.starts_with("wss://")
        {
            anyhow::bail!(
                "Controller URL must start with ws:// or wss://, got: {}",
                self.controller.url
            );
        }
        if self.reporting.host_status_interval_secs == 0 {
            anyhow::bail!("Host status report interval must be greater than zero");
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            url: default_controller_url(),
            reconnect_interval_ms: default_reconnect_interval(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            host_status_interval_secs: default_host_status_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_agent_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_controller_url() -> String {
    "ws://localhost:8080/ws/agent".to_string()
}

fn default_reconnect_interval() -> u64 {
    5000
}

fn default_host_status_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}
