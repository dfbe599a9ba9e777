//! Bounded record of recent probe outcomes for one address.

use std::collections::VecDeque;
use std::time::Duration;

/// Result of a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Reply received after the given round trip.
    Success(Duration),
    /// Timed out or unreachable.
    Failure,
}

impl Outcome {
    /// Round trip in milliseconds, if the probe succeeded.
    pub fn rtt_ms(&self) -> Option<f64> {
        match self {
            Self::Success(rtt) => Some(rtt.as_nanos() as f64 / 1_000_000.0),
            Self::Failure => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// FIFO ring of the most recent outcomes.
///
/// Holds at most `capacity` entries; pushing onto a full history evicts the
/// oldest outcome first.
#[derive(Debug, Clone)]
pub struct History {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
}

impl History {
    /// Create an empty history. A capacity of 0 is treated as 1.
    ///
    /// Storage grows with the outcomes pushed, not with `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append an outcome, evicting the oldest when full.
    pub fn push(&mut self, outcome: Outcome) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Outcomes from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }
}
