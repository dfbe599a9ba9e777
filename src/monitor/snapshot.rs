//! Point-in-time view of every reportable address.

use std::collections::BTreeMap;

use super::stats::Metrics;
use super::target::TargetKey;

/// Aggregates keyed by target identity, captured under one lock acquisition.
///
/// Only addresses with at least one successful probe in their history are
/// present, so every entry has `lost < sent` and defined latency figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<TargetKey, Metrics>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &TargetKey) -> Option<&Metrics> {
        self.entries.get(key)
    }

    /// Entries ordered by host, then address.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetKey, &Metrics)> {
        self.entries.iter()
    }
}

impl FromIterator<(TargetKey, Metrics)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (TargetKey, Metrics)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
