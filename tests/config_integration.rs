//! Loading configuration files from disk.

use std::io::Write;
use std::time::Duration;

use ping_exporter::{AppConfig, ConfigError};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
targets:
  - example.com
  - "192.0.2.1"
ping:
  interval: 5s
  timeout: 3s
  history-size: 20
  payload-size: 120
dns:
  refresh: 2m
options:
  disable-ipv6: true
server:
  bind: 127.0.0.1
  port: 9500
  metrics-path: probe
"#,
    );

    let mut config = AppConfig::load(file.path()).unwrap();
    config.normalize();
    config.validate().unwrap();

    assert_eq!(config.targets, vec!["example.com", "192.0.2.1"]);
    assert_eq!(config.server.metrics_path, "/probe");
    assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:9500");

    let settings = config.monitor_settings();
    assert_eq!(settings.probe.interval, Duration::from_secs(5));
    assert_eq!(settings.probe.timeout, Duration::from_secs(3));
    assert_eq!(settings.probe.history_size, 20);
    assert_eq!(settings.probe.payload_size, 120);
    assert_eq!(settings.dns_refresh, Duration::from_secs(120));
    assert!(settings.disable_ipv6);
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let file = write_config("targets: [example.com]\n");

    let config = AppConfig::load(file.path()).unwrap();
    config.validate().unwrap();

    let settings = config.monitor_settings();
    assert_eq!(settings.probe.interval, Duration::from_secs(1));
    assert_eq!(settings.probe.timeout, Duration::from_secs(2));
    assert_eq!(settings.probe.history_size, 10);
    assert_eq!(settings.probe.payload_size, 64);
    assert_eq!(config.listen_addr().unwrap().port(), 9427);
}

#[test]
fn test_load_rejects_invalid_values() {
    let file = write_config("targets: [example.com]\nping:\n  history-size: 0\n");
    let config = AppConfig::load(file.path()).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

    let file = write_config("targets: [example.com]\nping:\n  payload-size: 70000\n");
    let config = AppConfig::load(file.path()).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_load_errors() {
    assert!(matches!(
        AppConfig::load("/nonexistent/ping-exporter.yaml"),
        Err(ConfigError::IoError(_))
    ));

    let file = write_config("targets: [unterminated\n");
    assert!(matches!(
        AppConfig::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}
