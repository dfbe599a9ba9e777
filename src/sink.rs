//! Prometheus text exposition for scraped values.

use std::collections::HashMap;

use prometheus::{GaugeVec, Opts, Registry, TextEncoder};

use crate::collector::{Gauge, LABEL_NAMES, MetricsSink};
use crate::monitor::TargetKey;

/// Content type of [`PrometheusSink::encode`] output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// [`MetricsSink`] that fills a private Prometheus registry.
///
/// Built fresh for every scrape, so series of vanished targets never linger.
pub struct PrometheusSink {
    registry: Registry,
    gauges: HashMap<Gauge, GaugeVec>,
}

impl PrometheusSink {
    /// Create a sink with every per-target gauge registered.
    ///
    /// # Errors
    /// Returns an error if a metric descriptor is invalid.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let mut gauges = HashMap::with_capacity(Gauge::ALL.len());
        for gauge in Gauge::ALL {
            let vec = GaugeVec::new(Opts::new(gauge.name(), gauge.help()), &LABEL_NAMES)?;
            registry.register(Box::new(vec.clone()))?;
            gauges.insert(gauge, vec);
        }
        Ok(Self { registry, gauges })
    }

    /// Render everything recorded so far in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = String::new();
        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

impl MetricsSink for PrometheusSink {
    fn up(&mut self, version: &str) {
        let opts = Opts::new("ping_up", "ping_exporter version").const_label("version", version);
        let registered = prometheus::Gauge::with_opts(opts).and_then(|up| {
            self.registry.register(Box::new(up.clone()))?;
            up.set(1.0);
            Ok(())
        });
        if let Err(e) = registered {
            tracing::warn!(error = %e, "Failed to register up gauge");
        }
    }

    fn gauge(&mut self, gauge: Gauge, key: &TargetKey, value: f64) {
        let Some(vec) = self.gauges.get(&gauge) else {
            return;
        };
        let labels = key.label_values();
        let labels = [labels[0].as_str(), labels[1].as_str(), labels[2].as_str()];
        vec.with_label_values(&labels).set(value);
    }
}

impl std::fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_sink_renders_labeled_gauges() {
        let mut sink = PrometheusSink::new().unwrap();
        let key = TargetKey::new("example.com", IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));

        sink.up("1.2.3");
        sink.gauge(Gauge::RttMean, &key, 11.75);
        sink.gauge(Gauge::PacketSent, &key, 10.0);

        let body = sink.encode().unwrap();
        assert!(body.contains(r#"ping_up{version="1.2.3"} 1"#));
        assert!(body.contains(
            r#"ping_rtt_mean_ms{ip="192.0.2.1",ip_version="4",target="example.com"} 11.75"#
        ));
        assert!(body.contains(
            r#"ping_packet_sent{ip="192.0.2.1",ip_version="4",target="example.com"} 10"#
        ));
    }

    #[test]
    fn test_sink_without_targets_only_reports_up() {
        let mut sink = PrometheusSink::new().unwrap();
        sink.up("0.1.0");

        let body = sink.encode().unwrap();
        assert!(body.contains("ping_up"));
        assert!(!body.contains("ping_rtt_best_ms{"));
    }

    #[test]
    fn test_sink_double_up_is_tolerated() {
        let mut sink = PrometheusSink::new().unwrap();
        sink.up("0.1.0");
        sink.up("0.1.0");
        assert!(sink.encode().unwrap().contains("ping_up"));
    }
}
