//! Application configuration structures.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::monitor::{
    DEFAULT_DNS_REFRESH, DEFAULT_HISTORY_SIZE, DEFAULT_INTERVAL, DEFAULT_PAYLOAD_SIZE,
    DEFAULT_TIMEOUT, MonitorSettings,
};

use super::validation::{ConfigError, expand_env_vars, normalize_metrics_path};

// =============================================================================
// Constants
// =============================================================================

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9427;

/// Default path of the metrics endpoint.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Path of the liveness endpoint, reserved by the web server.
pub const HEALTH_PATH: &str = "/healthz";

/// Largest accepted echo payload in bytes.
pub const MAX_PAYLOAD_SIZE: u32 = 65500;

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

fn default_payload_size() -> u32 {
    u32::from(DEFAULT_PAYLOAD_SIZE)
}

fn default_dns_refresh() -> Duration {
    DEFAULT_DNS_REFRESH
}

// =============================================================================
// Ping Configuration
// =============================================================================

/// Probe settings shared by all targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PingConfig {
    /// Interval between echo requests (default: 1s).
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Timeout for a single echo request (default: 2s).
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Number of results remembered per address (default: 10).
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Echo payload size in bytes, 0 to 65500 (default: 64).
    #[serde(default = "default_payload_size")]
    pub payload_size: u32,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            history_size: DEFAULT_HISTORY_SIZE,
            payload_size: u32::from(DEFAULT_PAYLOAD_SIZE),
        }
    }
}

// =============================================================================
// DNS / Options Configuration
// =============================================================================

/// DNS re-resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Re-resolution cadence; `0s` resolves once at startup (default: 1m).
    #[serde(default = "default_dns_refresh", with = "humantime_serde")]
    pub refresh: Duration,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            refresh: DEFAULT_DNS_REFRESH,
        }
    }
}

/// Miscellaneous monitoring options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionsConfig {
    /// Ignore IPv6 addresses when resolving targets.
    #[serde(default)]
    pub disable_ipv6: bool,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9427).
    pub port: u16,

    /// Path of the metrics endpoint (default: "/metrics").
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hosts or addresses to ping, in stagger order.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Probe settings.
    #[serde(default)]
    pub ping: PingConfig,

    /// DNS settings.
    #[serde(default)]
    pub dns: DnsConfig,

    /// Monitoring options.
    #[serde(default)]
    pub options: OptionsConfig,

    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    /// The result is not validated yet, since command-line overrides may
    /// still fill in missing values; call [`validate`](Self::validate) after.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Normalize the metrics path: empty becomes `/metrics`, a missing
    /// leading slash is added.
    pub fn normalize(&mut self) {
        if self.server.metrics_path.is_empty() {
            tracing::warn!("metrics path is empty, correcting to `{}`", DEFAULT_METRICS_PATH);
        }
        self.server.metrics_path = normalize_metrics_path(&self.server.metrics_path);
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::ValidationError(
                "no targets specified".to_string(),
            ));
        }

        if let Some(index) = self.targets.iter().position(|t| t.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "target #{} is empty",
                index + 1
            )));
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.targets.iter().find(|t| !seen.insert(t.trim())) {
            return Err(ConfigError::ValidationError(format!(
                "target '{}' is listed more than once",
                dup.trim()
            )));
        }

        if self.ping.history_size < 1 {
            return Err(ConfigError::ValidationError(
                "ping history-size must be greater than 0".to_string(),
            ));
        }

        if self.ping.payload_size > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "ping payload-size must be between 0 and {}",
                MAX_PAYLOAD_SIZE
            )));
        }

        if self.ping.interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "ping interval must be non-zero".to_string(),
            ));
        }

        if self.ping.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "ping timeout must be non-zero".to_string(),
            ));
        }

        if self.server.metrics_path == HEALTH_PATH {
            return Err(ConfigError::ValidationError(format!(
                "metrics path must not be {HEALTH_PATH}"
            )));
        }

        self.listen_addr()?;

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address the web server binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Monitor settings derived from this configuration.
    ///
    /// Assumes [`validate`](Self::validate) passed; the payload size is
    /// clamped to the accepted range regardless.
    pub fn monitor_settings(&self) -> MonitorSettings {
        let payload_size = self.ping.payload_size.min(MAX_PAYLOAD_SIZE) as u16;
        MonitorSettings::default()
            .with_interval(self.ping.interval)
            .with_timeout(self.ping.timeout)
            .with_history_size(self.ping.history_size)
            .with_payload_size(payload_size)
            .with_dns_refresh(self.dns.refresh)
            .with_disable_ipv6(self.options.disable_ipv6)
    }
}
