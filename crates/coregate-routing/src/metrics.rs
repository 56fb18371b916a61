//! Bounded retention and summarization of request outcomes.

use coregate_core::RequestOutcome;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// Fixed-capacity ring buffer of [`RequestOutcome`]s.
///
/// Appends and trims happen under one short-lived lock so readers
/// never observe a partially written record; a reader's snapshot may
/// be stale by at most the next write. Memory stays bounded regardless
/// of uptime.
pub struct MetricsStore {
    capacity: usize,
    outcomes: Mutex<VecDeque<RequestOutcome>>,
}

impl MetricsStore {
    /// Create a store retaining at most `capacity` outcomes. A zero
    /// capacity is clamped to one so the buffer stays bounded.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            outcomes: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an outcome, evicting the oldest when over capacity.
    pub fn record(&self, outcome: RequestOutcome) {
        let mut outcomes = self.outcomes.lock();
        while outcomes.len() >= self.capacity {
            outcomes.pop_front();
        }
        outcomes.push_back(outcome);
    }

    /// Aggregate statistics over the full retained window.
    #[must_use]
    pub fn summarize(&self) -> MetricsSummary {
        let outcomes = self.outcomes.lock();

        let count = outcomes.len();
        let avg_elapsed_ms = if count == 0 {
            0.0
        } else {
            outcomes.iter().map(|o| o.elapsed_ms as f64).sum::<f64>() / count as f64
        };

        let mut status_counts: HashMap<u16, u64> = HashMap::new();
        let mut backend_counts: HashMap<String, u64> = HashMap::new();
        for outcome in outcomes.iter() {
            *status_counts.entry(outcome.status).or_insert(0) += 1;
            *backend_counts.entry(outcome.backend.clone()).or_insert(0) += 1;
        }

        MetricsSummary {
            count,
            avg_elapsed_ms,
            status_counts,
            backend_counts,
        }
    }

    /// Last `n` outcomes in arrival order.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<RequestOutcome> {
        let outcomes = self.outcomes.lock();
        let skip = outcomes.len().saturating_sub(n);
        outcomes.iter().skip(skip).cloned().collect()
    }
}

/// Aggregate view returned by [`MetricsStore::summarize`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    /// Retained outcome count
    pub count: usize,
    /// Arithmetic mean of elapsed time in milliseconds, 0 when empty
    pub avg_elapsed_ms: f64,
    /// Occurrences per response status code
    pub status_counts: HashMap<u16, u64>,
    /// Requests per backend name
    pub backend_counts: HashMap<String, u64>,
}
