//! Target monitoring orchestration.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::history::History;
use super::registry::{Registry, SharedRegistry};
use super::schedule::{ProbeSchedule, ProbeSettings};
use super::snapshot::Snapshot;
use super::target::{AddressDiff, Target, TargetKey};
use super::traits::{Prober, ResolveError, Resolver};

/// Default probe interval (1 second).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default probe timeout (2 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default echo payload size in bytes.
pub const DEFAULT_PAYLOAD_SIZE: u16 = 64;

/// Default number of outcomes kept per address.
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Default DNS re-resolution cadence (1 minute).
pub const DEFAULT_DNS_REFRESH: Duration = Duration::from_secs(60);

/// Runtime settings for a [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub probe: ProbeSettings,
    /// Re-resolution cadence. Zero resolves each target only once.
    pub dns_refresh: Duration,
    /// Drop IPv6 addresses from every resolution.
    pub disable_ipv6: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            probe: ProbeSettings {
                interval: DEFAULT_INTERVAL,
                timeout: DEFAULT_TIMEOUT,
                payload_size: DEFAULT_PAYLOAD_SIZE,
                history_size: DEFAULT_HISTORY_SIZE,
            },
            dns_refresh: DEFAULT_DNS_REFRESH,
            disable_ipv6: false,
        }
    }
}

impl MonitorSettings {
    /// Set the probe interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.probe.interval = interval;
        self
    }

    /// Set the probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.probe.timeout = timeout;
        self
    }

    /// Set the echo payload size.
    pub fn with_payload_size(mut self, size: u16) -> Self {
        self.probe.payload_size = size;
        self
    }

    /// Set the per-address history size.
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.probe.history_size = size;
        self
    }

    /// Set the DNS re-resolution cadence.
    pub fn with_dns_refresh(mut self, refresh: Duration) -> Self {
        self.dns_refresh = refresh;
        self
    }

    /// Enable or disable IPv6 addresses.
    pub fn with_disable_ipv6(mut self, disable: bool) -> Self {
        self.disable_ipv6 = disable;
        self
    }

    /// Time span covered by a full history.
    pub fn history_window(&self) -> Duration {
        let samples = u32::try_from(self.probe.history_size).unwrap_or(u32::MAX);
        let window = self.probe.interval.checked_mul(samples).unwrap_or(Duration::MAX);
        window.max(self.probe.timeout)
    }
}

/// Owns every target and probe schedule and produces snapshots on demand.
///
/// Resolution and probing run as background tasks; [`export`](Self::export)
/// may be called from any number of scrape handlers concurrently. All mutable
/// state sits behind one lock that is never held across network I/O.
pub struct Monitor {
    settings: MonitorSettings,
    hosts: Vec<String>,
    prober: Arc<dyn Prober>,
    resolver: Arc<dyn Resolver>,
    registry: SharedRegistry,
    next_schedule_id: AtomicU64,
    refreshers: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Create a monitor for `hosts`. List order sets each target's stagger.
    ///
    /// Repeated hosts are monitored once, at the stagger of their first
    /// position. Nothing runs until [`start`](Self::start) is called.
    pub fn new<I, S>(
        settings: MonitorSettings,
        hosts: I,
        prober: Arc<dyn Prober>,
        resolver: Arc<dyn Resolver>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for (position, host) in hosts.into_iter().map(Into::into).enumerate() {
            if seen.insert(host.clone()) {
                targets.push(Target::new(host, position));
            } else {
                tracing::warn!(host = %host, "Duplicate target ignored");
            }
        }
        let hosts: Vec<String> = targets.iter().map(|t| t.host().to_string()).collect();

        Self {
            settings,
            hosts,
            prober,
            resolver,
            registry: Arc::new(Mutex::new(Registry::new(targets))),
            next_schedule_id: AtomicU64::new(0),
            refreshers: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Configured hosts in list order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Number of running probe schedules.
    pub fn schedule_count(&self) -> usize {
        self.registry.lock().schedule_count()
    }

    /// Addresses currently tracked for the target at `index`.
    pub fn addresses(&self, index: usize) -> Vec<IpAddr> {
        self.registry
            .lock()
            .target(index)
            .map(|t| t.addresses().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Copy of the history currently held for `key`.
    pub fn history(&self, key: &TargetKey) -> Option<History> {
        self.registry
            .lock()
            .schedule(key)
            .map(|s| s.history().clone())
    }

    /// Resolve every target once, then start the periodic re-resolution
    /// tasks.
    ///
    /// Resolution failures are logged; a target that fails here is retried
    /// by its refresh task.
    pub async fn start(self: &Arc<Self>) {
        for index in 0..self.hosts.len() {
            self.refresh_logged(index).await;
        }

        let refresh = self.settings.dns_refresh;
        if refresh.is_zero() {
            tracing::info!("DNS refresh disabled, targets resolved once");
            return;
        }

        let mut refreshers = self.refreshers.lock();
        for index in 0..self.hosts.len() {
            refreshers.push(tokio::spawn(refresh_loop(Arc::downgrade(self), index, refresh)));
        }
        tracing::info!(
            targets = self.hosts.len(),
            refresh = %humantime::format_duration(refresh),
            "Monitor started"
        );
    }

    /// Re-resolve the target at `index` and reconcile its schedules.
    ///
    /// New addresses get a fresh schedule with an empty history, vanished
    /// addresses have theirs stopped and discarded, unchanged ones are left
    /// alone. On error nothing changes.
    pub async fn refresh(&self, index: usize) -> Result<AddressDiff, ResolveError> {
        let Some(host) = self.hosts.get(index) else {
            return Ok(AddressDiff::default());
        };

        let resolved = self.resolve(host).await?;

        let mut registry = self.registry.lock();
        let Some(target) = registry.target_mut(index) else {
            return Ok(AddressDiff::default());
        };
        let start_delay = target.start_delay();
        let diff = target.apply_resolution(resolved);

        for addr in &diff.removed {
            let key = TargetKey::new(host.clone(), *addr);
            if registry.remove(&key) {
                tracing::info!(host = %host, ip = %addr, "Address gone, probe schedule stopped");
            }
        }

        for addr in &diff.added {
            let key = TargetKey::new(host.clone(), *addr);
            let id = self.next_schedule_id.fetch_add(1, Ordering::Relaxed);
            let schedule = ProbeSchedule::spawn(
                id,
                key.clone(),
                start_delay,
                self.settings.probe,
                Arc::clone(&self.prober),
                Arc::clone(&self.registry),
            );
            registry.insert(key, schedule);
            tracing::info!(
                host = %host,
                ip = %addr,
                start_delay_ms = start_delay.as_millis(),
                "Probe schedule started"
            );
        }

        if diff.is_empty() {
            tracing::debug!(host = %host, "Resolution unchanged");
        }
        Ok(diff)
    }

    /// Aggregate every history into a snapshot.
    ///
    /// Never fails and never waits on the network; addresses without a
    /// successful probe are left out.
    pub fn export(&self) -> Snapshot {
        self.registry.lock().snapshot()
    }

    /// Cancel every refresh and probe task. Idempotent.
    pub fn shutdown(&self) {
        let refreshers: Vec<_> = self.refreshers.lock().drain(..).collect();
        for handle in &refreshers {
            handle.abort();
        }
        let stopped = self.registry.lock().clear();
        if stopped > 0 || !refreshers.is_empty() {
            tracing::info!(schedules = stopped, "Monitor stopped");
        }
    }

    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let mut addrs = self.resolver.resolve(host).await?;
        if self.settings.disable_ipv6 {
            addrs.retain(IpAddr::is_ipv4);
        }
        if addrs.is_empty() {
            return Err(ResolveError::NoAddresses(host.to_string()));
        }
        Ok(addrs)
    }

    async fn refresh_logged(&self, index: usize) {
        if let Err(e) = self.refresh(index).await {
            let (host, running) = self
                .registry
                .lock()
                .target(index)
                .map(|t| (t.host().to_string(), t.addresses().len()))
                .unwrap_or_default();
            tracing::warn!(
                host = %host,
                error = %e,
                running,
                "Failed to resolve target, keeping existing schedules"
            );
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("settings", &self.settings)
            .field("hosts", &self.hosts)
            .field("schedule_count", &self.schedule_count())
            .finish_non_exhaustive()
    }
}

async fn refresh_loop(monitor: Weak<Monitor>, index: usize, refresh: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + refresh, refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(monitor) = monitor.upgrade() else {
            break;
        };
        monitor.refresh_logged(index).await;
    }
}
