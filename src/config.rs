//! Configuration module for ping-exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Targets to monitor (ordered; order sets the probe stagger)
//! - Probe settings (interval, timeout, payload size, history size)
//! - DNS re-resolution cadence and address family options
//! - Server settings (bind address, port, metrics path)

mod app;
mod validation;

pub use app::{AppConfig, DnsConfig, OptionsConfig, PingConfig, ServerConfig};
pub use validation::{
    ConfigError, expand_env_vars, normalize_metrics_path, parse_duration, parse_listen_address,
};

// Re-export constants
pub use app::{DEFAULT_METRICS_PATH, DEFAULT_PORT, HEALTH_PATH, MAX_PAYLOAD_SIZE};
