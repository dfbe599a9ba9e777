//! ping-exporter - ICMP latency and loss exporter
//!
//! Continuously pings a configured set of targets and exposes round-trip
//! statistics (best, worst, median, mean, standard deviation) and packet
//! loss in the Prometheus text format.
//!
//! # Architecture
//!
//! - **Monitor**: target resolution, per-address probe loops and on-demand
//!   aggregation behind a single lock
//! - **Probe**: concrete ICMP prober and system DNS resolver
//! - **Collector**: turns monitor snapshots into labeled gauges on a sink
//! - **Server**: Axum HTTP endpoint serving the metrics
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ping_exporter::{IcmpProber, Monitor, MonitorSettings, PingCollector, SystemResolver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let monitor = Arc::new(Monitor::new(
//!     MonitorSettings::default(),
//!     ["1.1.1.1"],
//!     Arc::new(IcmpProber::new()?),
//!     Arc::new(SystemResolver),
//! ));
//! monitor.start().await;
//! let collector = PingCollector::new(monitor, env!("CARGO_PKG_VERSION"));
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod monitor;
pub mod probe;
pub mod server;
pub mod sink;

pub use collector::{Gauge, MetricsSink, PingCollector};
pub use config::{AppConfig, ConfigError};
pub use monitor::{Metrics, Monitor, MonitorSettings, Snapshot, TargetKey};
pub use probe::{IcmpProber, SystemResolver};
pub use sink::PrometheusSink;
