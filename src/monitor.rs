//! Monitor Layer
//!
//! Keeps every configured target resolved, runs one probe loop per resolved
//! address and aggregates the results on demand.
//!
//! # Architecture
//!
//! - [`Target`]: a configured host and its current address set
//! - [`ProbeSchedule`]: periodic probe loop feeding a bounded [`History`]
//! - [`Metrics`]: best/worst/median/mean/stddev and loss over a history
//! - [`Monitor`]: owns all of the above and exports [`Snapshot`]s
//!
//! Network access goes through the [`Prober`] and [`Resolver`] traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ping_exporter::monitor::{Monitor, MonitorSettings};
//! use ping_exporter::probe::{IcmpProber, SystemResolver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let prober = IcmpProber::new()?;
//! let monitor = Arc::new(Monitor::new(
//!     MonitorSettings::default(),
//!     ["8.8.8.8", "example.com"],
//!     Arc::new(prober),
//!     Arc::new(SystemResolver),
//! ));
//! monitor.start().await;
//! let snapshot = monitor.export();
//! # Ok(())
//! # }
//! ```

mod history;
mod orchestrator;
mod registry;
mod schedule;
mod snapshot;
mod stats;
mod target;
mod traits;

pub use history::{History, Outcome};
pub use orchestrator::{
    DEFAULT_DNS_REFRESH, DEFAULT_HISTORY_SIZE, DEFAULT_INTERVAL, DEFAULT_PAYLOAD_SIZE,
    DEFAULT_TIMEOUT, Monitor, MonitorSettings,
};
pub use schedule::{ProbeSchedule, ProbeSettings};
pub use snapshot::Snapshot;
pub use stats::Metrics;
pub use target::{AddressDiff, IpVersion, STAGGER_UNIT, Target, TargetKey};
pub use traits::{ProbeError, Prober, ResolveError, Resolver};
