//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use ping_exporter::collector::{Gauge, MetricsSink};
use ping_exporter::monitor::{
    Monitor, MonitorSettings, ProbeError, Prober, ResolveError, Resolver, TargetKey,
};
use tokio::time::Instant;

pub fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

/// One request seen by [`ScriptedProber`].
#[derive(Debug, Clone, Copy)]
pub struct Call {
    pub addr: IpAddr,
    pub at: Instant,
    pub timeout: Duration,
    pub payload_size: u16,
}

/// Prober answering from a per-address script, then a fallback.
///
/// Script entries are `Some(ms)` for a reply and `None` for a timeout. A
/// hanging prober never answers at all.
#[derive(Default)]
pub struct ScriptedProber {
    scripts: Mutex<HashMap<IpAddr, VecDeque<Option<u64>>>>,
    fallback: Mutex<Option<u64>>,
    hang: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProber {
    pub fn replying(ms: u64) -> Self {
        let prober = Self::default();
        *prober.fallback.lock() = Some(ms);
        prober
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn script(&self, addr: IpAddr, outcomes: impl IntoIterator<Item = Option<u64>>) {
        self.scripts
            .lock()
            .entry(addr)
            .or_default()
            .extend(outcomes);
    }

    pub fn set_fallback(&self, ms: Option<u64>) {
        *self.fallback.lock() = ms;
    }

    /// Time of the first probe sent to `addr`.
    pub fn first_call(&self, addr: IpAddr) -> Option<Instant> {
        self.calls
            .lock()
            .iter()
            .find(|c| c.addr == addr)
            .map(|c| c.at)
    }

    pub fn call_count(&self, addr: IpAddr) -> usize {
        self.calls.lock().iter().filter(|c| c.addr == addr).count()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl Prober for ScriptedProber {
    async fn probe(
        &self,
        addr: IpAddr,
        timeout: Duration,
        payload_size: u16,
    ) -> Result<Duration, ProbeError> {
        self.calls.lock().push(Call {
            addr,
            at: Instant::now(),
            timeout,
            payload_size,
        });
        if self.hang {
            std::future::pending::<()>().await;
        }
        let next = self
            .scripts
            .lock()
            .get_mut(&addr)
            .and_then(VecDeque::pop_front);
        let outcome = match next {
            Some(outcome) => outcome,
            None => *self.fallback.lock(),
        };
        outcome
            .map(Duration::from_millis)
            .ok_or(ProbeError::Timeout)
    }
}

/// Resolver whose answers can be changed between refreshes.
///
/// Hosts without an answer fail to resolve.
#[derive(Default)]
pub struct StaticResolver {
    answers: Mutex<HashMap<String, Vec<IpAddr>>>,
}

impl StaticResolver {
    pub fn set(&self, host: &str, addrs: impl IntoIterator<Item = IpAddr>) {
        self.answers
            .lock()
            .insert(host.to_string(), addrs.into_iter().collect());
    }

    pub fn fail(&self, host: &str) {
        self.answers.lock().remove(host);
    }
}

#[async_trait::async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.answers
            .lock()
            .get(host)
            .cloned()
            .ok_or_else(|| ResolveError::NoAddresses(host.to_string()))
    }
}

/// Sink that keeps every observation.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub ups: Vec<String>,
    pub gauges: Vec<(Gauge, TargetKey, f64)>,
}

impl RecordingSink {
    pub fn value(&self, gauge: Gauge, key: &TargetKey) -> Option<f64> {
        self.gauges
            .iter()
            .find(|(g, k, _)| *g == gauge && k == key)
            .map(|(_, _, v)| *v)
    }
}

impl MetricsSink for RecordingSink {
    fn up(&mut self, version: &str) {
        self.ups.push(version.to_string());
    }

    fn gauge(&mut self, gauge: Gauge, key: &TargetKey, value: f64) {
        self.gauges.push((gauge, key.clone(), value));
    }
}

pub fn settings(interval_ms: u64, history_size: usize) -> MonitorSettings {
    MonitorSettings::default()
        .with_interval(Duration::from_millis(interval_ms))
        .with_timeout(Duration::from_millis(interval_ms.max(2) / 2))
        .with_history_size(history_size)
        .with_dns_refresh(Duration::ZERO)
}

pub fn monitor(
    settings: MonitorSettings,
    hosts: &[&str],
    prober: &Arc<ScriptedProber>,
    resolver: &Arc<StaticResolver>,
) -> Arc<Monitor> {
    Arc::new(Monitor::new(
        settings,
        hosts.iter().copied(),
        Arc::clone(prober) as Arc<dyn Prober>,
        Arc::clone(resolver) as Arc<dyn Resolver>,
    ))
}
