//! Per-address probe loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};

use super::history::{History, Outcome};
use super::registry::SharedRegistry;
use super::target::TargetKey;
use super::traits::{ProbeError, Prober};

/// Timing and payload shared by every schedule of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Time between probe starts.
    pub interval: Duration,
    /// Maximum wait for a reply.
    pub timeout: Duration,
    /// Echo payload bytes.
    pub payload_size: u16,
    /// Outcomes kept per address.
    pub history_size: usize,
}

/// A running probe loop and the history it feeds.
///
/// The history lives here, inside the registry, so the scrape path reads it
/// under the same lock the probe task appends under.
#[derive(Debug)]
pub struct ProbeSchedule {
    id: u64,
    history: History,
    handle: JoinHandle<()>,
}

impl ProbeSchedule {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.history.push(outcome);
    }

    /// Cancel the probe task.
    ///
    /// The caller must have removed the schedule from the registry first;
    /// that removal is what stops further history writes.
    pub(crate) fn stop(self) {
        self.handle.abort();
    }

    /// Start a probe loop for `key` and return its schedule.
    ///
    /// The first probe fires after `start_delay`, then every
    /// `settings.interval`. The task only appends while the registry still
    /// holds a schedule for `key` with this `id`; it exits otherwise.
    pub(crate) fn spawn(
        id: u64,
        key: TargetKey,
        start_delay: Duration,
        settings: ProbeSettings,
        prober: Arc<dyn Prober>,
        registry: SharedRegistry,
    ) -> Self {
        let history = History::new(settings.history_size);
        let handle = tokio::spawn(run(id, key, start_delay, settings, prober, registry));
        Self {
            id,
            history,
            handle,
        }
    }
}

async fn run(
    id: u64,
    key: TargetKey,
    start_delay: Duration,
    settings: ProbeSettings,
    prober: Arc<dyn Prober>,
    registry: SharedRegistry,
) {
    if !start_delay.is_zero() {
        tokio::time::sleep(start_delay).await;
    }

    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let outcome = probe_once(prober.as_ref(), &key, &settings).await;
        if !registry.lock().record(&key, id, outcome) {
            tracing::debug!(host = %key.host, ip = %key.addr, "Schedule no longer registered, exiting");
            break;
        }
    }
}

/// Issue one probe, bounding it by the configured timeout.
async fn probe_once(prober: &dyn Prober, key: &TargetKey, settings: &ProbeSettings) -> Outcome {
    let result = timeout(
        settings.timeout,
        prober.probe(key.addr, settings.timeout, settings.payload_size),
    )
    .await
    .unwrap_or(Err(ProbeError::Timeout));

    match result {
        Ok(rtt) => {
            tracing::debug!(
                host = %key.host,
                ip = %key.addr,
                latency_ms = rtt.as_secs_f64() * 1000.0,
                "Ping probe successful"
            );
            Outcome::Success(rtt)
        }
        Err(e) => {
            tracing::debug!(host = %key.host, ip = %key.addr, error = %e, "Ping probe failed");
            Outcome::Failure
        }
    }
}
