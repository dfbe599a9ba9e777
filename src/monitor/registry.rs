//! Shared state guarded by the monitor's single lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::history::Outcome;
use super::schedule::ProbeSchedule;
use super::snapshot::Snapshot;
use super::stats::Metrics;
use super::target::{Target, TargetKey};

/// Registry handle shared by the monitor and every probe task.
pub(crate) type SharedRegistry = Arc<Mutex<Registry>>;

/// Targets, their resolved addresses and the running schedules.
///
/// Never held across an `.await`: probe tasks take it only to append, the
/// scrape path only to aggregate.
#[derive(Debug)]
pub(crate) struct Registry {
    targets: Vec<Target>,
    schedules: HashMap<TargetKey, ProbeSchedule>,
}

impl Registry {
    pub(crate) fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            schedules: HashMap::new(),
        }
    }

    pub(crate) fn target(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    pub(crate) fn target_mut(&mut self, index: usize) -> Option<&mut Target> {
        self.targets.get_mut(index)
    }

    pub(crate) fn schedule(&self, key: &TargetKey) -> Option<&ProbeSchedule> {
        self.schedules.get(key)
    }

    pub(crate) fn schedule_count(&self) -> usize {
        self.schedules.len()
    }

    /// Register a schedule, stopping any previous one under the same key.
    pub(crate) fn insert(&mut self, key: TargetKey, schedule: ProbeSchedule) {
        if let Some(previous) = self.schedules.insert(key, schedule) {
            previous.stop();
        }
    }

    /// Unregister and stop the schedule for `key`.
    ///
    /// Once this returns, the stopped task can no longer append: its next
    /// [`record`](Self::record) finds no matching schedule.
    pub(crate) fn remove(&mut self, key: &TargetKey) -> bool {
        match self.schedules.remove(key) {
            Some(schedule) => {
                schedule.stop();
                true
            }
            None => false,
        }
    }

    /// Append an outcome for the schedule `id` registered under `key`.
    ///
    /// Returns `false` when that schedule is gone or was replaced, which
    /// tells the calling task to exit.
    pub(crate) fn record(&mut self, key: &TargetKey, id: u64, outcome: Outcome) -> bool {
        match self.schedules.get_mut(key) {
            Some(schedule) if schedule.id() == id => {
                schedule.record(outcome);
                true
            }
            _ => false,
        }
    }

    /// Aggregate every history into a snapshot, skipping addresses with no
    /// successful probe.
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.schedules
            .iter()
            .filter_map(|(key, schedule)| {
                Metrics::from_history(schedule.history()).map(|m| (key.clone(), m))
            })
            .collect()
    }

    /// Stop and drop every schedule.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.schedules.len();
        for (_, schedule) in self.schedules.drain() {
            schedule.stop();
        }
        count
    }
}
