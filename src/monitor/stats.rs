//! Aggregate statistics over a probe history.

use super::history::{History, Outcome};

/// Statistics for one address over its current history window.
///
/// Latency fields are in milliseconds and only cover successful probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub sent: usize,
    pub lost: usize,
    pub best: f64,
    pub worst: f64,
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
}

impl Metrics {
    /// Aggregate a history. Returns `None` when it holds no successful probe.
    pub fn from_history(history: &History) -> Option<Self> {
        Self::compute(history.iter())
    }

    /// Aggregate a sequence of outcomes.
    ///
    /// Returns `None` when there is no successful outcome, since latency
    /// figures would be undefined.
    pub fn compute<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Option<Self> {
        let mut sent = 0;
        let mut rtts = Vec::new();
        for outcome in outcomes {
            sent += 1;
            if let Some(rtt) = outcome.rtt_ms() {
                rtts.push(rtt);
            }
        }
        if rtts.is_empty() {
            return None;
        }

        rtts.sort_by(f64::total_cmp);
        let count = rtts.len() as f64;
        let mean = rtts.iter().sum::<f64>() / count;
        let variance = rtts.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

        Some(Self {
            sent,
            lost: sent - rtts.len(),
            best: rtts[0],
            worst: rtts[rtts.len() - 1],
            median: median(&rtts),
            mean,
            stddev: variance.sqrt(),
        })
    }
}

/// Median of an ascending, non-empty slice. Even lengths average the two
/// middle values.
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
