//! Scrape-time collector.
//!
//! Translates a monitor [`Snapshot`] into labeled gauge observations on a
//! [`MetricsSink`]. Each scrape asks the monitor for a fresh snapshot; when
//! that comes back empty, a recent non-empty one is replayed instead so a
//! scrape racing the first probe cycle does not report an outage.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::monitor::{Metrics, Monitor, Snapshot, TargetKey};

/// Label names attached to every per-target gauge.
pub const LABEL_NAMES: [&str; 3] = ["target", "ip", "ip_version"];

/// Per-target gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    RttBest,
    RttWorst,
    RttMedian,
    RttMean,
    RttStdDev,
    PacketLoss,
    PacketSent,
}

impl Gauge {
    pub const ALL: [Gauge; 7] = [
        Gauge::PacketSent,
        Gauge::PacketLoss,
        Gauge::RttBest,
        Gauge::RttWorst,
        Gauge::RttMedian,
        Gauge::RttMean,
        Gauge::RttStdDev,
    ];

    /// Fully qualified metric name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RttBest => "ping_rtt_best_ms",
            Self::RttWorst => "ping_rtt_worst_ms",
            Self::RttMedian => "ping_rtt_median_ms",
            Self::RttMean => "ping_rtt_mean_ms",
            Self::RttStdDev => "ping_rtt_std_deviation_ms",
            Self::PacketLoss => "ping_packet_loss",
            Self::PacketSent => "ping_packet_sent",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Self::RttBest => "Best round trip time in millis",
            Self::RttWorst => "Worst round trip time in millis",
            Self::RttMedian => "Median round trip time in millis",
            Self::RttMean => "Mean round trip time in millis",
            Self::RttStdDev => "Standard deviation in millis",
            Self::PacketLoss => "Number of Packet loss",
            Self::PacketSent => "Number of Packet sent",
        }
    }

    /// Value of this gauge in `metrics`.
    pub fn value(&self, metrics: &Metrics) -> f64 {
        match self {
            Self::RttBest => metrics.best,
            Self::RttWorst => metrics.worst,
            Self::RttMedian => metrics.median,
            Self::RttMean => metrics.mean,
            Self::RttStdDev => metrics.stddev,
            Self::PacketLoss => metrics.lost as f64,
            Self::PacketSent => metrics.sent as f64,
        }
    }
}

/// Destination for scraped values.
pub trait MetricsSink {
    /// Report the exporter as up, labeled with its version.
    fn up(&mut self, version: &str);

    /// Record one gauge value for `key`.
    fn gauge(&mut self, gauge: Gauge, key: &TargetKey, value: f64);
}

struct CachedSnapshot {
    snapshot: Snapshot,
    captured_at: Instant,
}

/// Adapter between the monitor and a metrics sink.
pub struct PingCollector {
    monitor: Arc<Monitor>,
    version: String,
    max_staleness: Duration,
    last_good: Mutex<Option<CachedSnapshot>>,
}

impl PingCollector {
    /// Create a collector. Cached snapshots expire after one history window.
    pub fn new(monitor: Arc<Monitor>, version: impl Into<String>) -> Self {
        let max_staleness = monitor.settings().history_window();
        Self {
            monitor,
            version: version.into(),
            max_staleness,
            last_good: Mutex::new(None),
        }
    }

    /// Override how long an empty scrape may fall back to the cache.
    pub fn with_max_staleness(mut self, max_staleness: Duration) -> Self {
        self.max_staleness = max_staleness;
        self
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Snapshot to report for this scrape.
    ///
    /// A non-empty export replaces the cache. An empty export replays the
    /// cache while it is younger than the staleness bound, otherwise the
    /// cache is dropped and the empty snapshot is returned.
    pub fn snapshot(&self) -> Snapshot {
        let fresh = self.monitor.export();
        let mut last_good = self.last_good.lock();

        if !fresh.is_empty() {
            *last_good = Some(CachedSnapshot {
                snapshot: fresh.clone(),
                captured_at: Instant::now(),
            });
            return fresh;
        }

        let replay = last_good
            .as_ref()
            .filter(|cached| cached.captured_at.elapsed() <= self.max_staleness)
            .map(|cached| cached.snapshot.clone());

        match replay {
            Some(snapshot) => {
                tracing::debug!(
                    entries = snapshot.len(),
                    "Monitor snapshot empty, replaying last good snapshot"
                );
                snapshot
            }
            None => {
                if last_good.take().is_some() {
                    tracing::debug!("Cached snapshot expired, dropping it");
                }
                fresh
            }
        }
    }

    /// Push the current snapshot and the up indicator into `sink`.
    pub fn collect(&self, sink: &mut dyn MetricsSink) {
        sink.up(&self.version);

        let snapshot = self.snapshot();
        for (key, metrics) in snapshot.iter() {
            for gauge in Gauge::ALL {
                sink.gauge(gauge, key, gauge.value(metrics));
            }
        }
    }
}

impl std::fmt::Debug for PingCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PingCollector")
            .field("version", &self.version)
            .field("max_staleness", &self.max_staleness)
            .finish_non_exhaustive()
    }
}
