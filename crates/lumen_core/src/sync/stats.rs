//! Exchange counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated by both sides without taking the exchange lock.
#[derive(Debug, Default)]
pub struct ExchangeStats {
    frame_publishes: AtomicU64,
    cloud_publishes: AtomicU64,
    reallocations: AtomicU64,
    timeouts: AtomicU64,
    retrievals: AtomicU64,
    empty_retrievals: AtomicU64,
}

/// Point-in-time copy of [`ExchangeStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Producer cycles that published frame references.
    pub frame_publishes: u64,
    /// Point clouds swapped into the published slot.
    pub cloud_publishes: u64,
    /// Working buffer reallocations.
    pub reallocations: u64,
    /// Receive calls that timed out.
    pub timeouts: u64,
    /// Successful begin calls.
    pub retrievals: u64,
    /// Begin calls answered with no new data.
    pub empty_retrievals: u64,
}

impl ExchangeStats {
    pub(crate) fn record_publish(&self, with_cloud: bool) {
        self.frame_publishes.fetch_add(1, Ordering::Relaxed);
        if with_cloud {
            self.cloud_publishes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_reallocation(&self) {
        self.reallocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retrieval(&self, found: bool) {
        if found {
            self.retrievals.fetch_add(1, Ordering::Relaxed);
        } else {
            self.empty_retrievals.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frame_publishes: self.frame_publishes.load(Ordering::Relaxed),
            cloud_publishes: self.cloud_publishes.load(Ordering::Relaxed),
            reallocations: self.reallocations.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            retrievals: self.retrievals.load(Ordering::Relaxed),
            empty_retrievals: self.empty_retrievals.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = ExchangeStats::default();
        stats.record_publish(true);
        stats.record_publish(false);
        stats.record_reallocation();
        stats.record_timeout();
        stats.record_retrieval(true);
        stats.record_retrieval(false);
        stats.record_retrieval(false);

        let snap = stats.snapshot();
        assert_eq!(snap.frame_publishes, 2);
        assert_eq!(snap.cloud_publishes, 1);
        assert_eq!(snap.reallocations, 1);
        assert_eq!(snap.timeouts, 1);
        assert_eq!(snap.retrievals, 1);
        assert_eq!(snap.empty_retrievals, 2);
    }
}
