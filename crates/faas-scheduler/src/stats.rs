//! Monotonic dispatch counters, global and per-function.
//!
//! Each counter is an independent `AtomicU64`; there is no single lock
//! guarding all of them. The spec allows this: counters are independent
//! monotonic integers, so a torn read only misorders near-simultaneous
//! events by at most one — acceptable for a stats snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

/// A single function's monotonic dispatch counters.
#[derive(Debug, Default)]
pub struct FunctionCounters {
    pub(crate) cold_starts: AtomicU64,
    pub(crate) warm_starts: AtomicU64,
    pub(crate) requests_queued: AtomicU64,
    pub(crate) requests_failed: AtomicU64,
}

impl FunctionCounters {
    fn snapshot(&self) -> FunctionCountersSnapshot {
        FunctionCountersSnapshot {
            cold_starts: self.cold_starts.load(Ordering::Relaxed),
            warm_starts: self.warm_starts.load(Ordering::Relaxed),
            requests_queued: self.requests_queued.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.cold_starts.store(0, Ordering::Relaxed);
        self.warm_starts.store(0, Ordering::Relaxed);
        self.requests_queued.store(0, Ordering::Relaxed);
        self.requests_failed.store(0, Ordering::Relaxed);
    }
}

/// Plain-data snapshot of a function's counters, ready to serialize.
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct FunctionCountersSnapshot {
    pub cold_starts: u64,
    pub warm_starts: u64,
    pub requests_queued: u64,
    pub requests_failed: u64,
}

/// Global counters plus a per-function breakdown, keyed by `function_id`.
#[derive(Debug, Default)]
pub struct Stats {
    cold_starts: AtomicU64,
    warm_starts: AtomicU64,
    requests_queued: AtomicU64,
    requests_failed: AtomicU64,
    per_function: DashMap<String, FunctionCounters>,
}

impl Stats {
    /// Build an empty counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, function_id: &str) -> dashmap::mapref::one::Ref<'_, String, FunctionCounters> {
        if !self.per_function.contains_key(function_id) {
            self.per_function
                .entry(function_id.to_string())
                .or_default();
        }
        self.per_function.get(function_id).expect("just inserted")
    }

    /// Record a cold start for `function_id`.
    pub fn record_cold_start(&self, function_id: &str) {
        self.cold_starts.fetch_add(1, Ordering::Relaxed);
        self.entry(function_id)
            .cold_starts
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a warm start for `function_id`.
    pub fn record_warm_start(&self, function_id: &str) {
        self.warm_starts.fetch_add(1, Ordering::Relaxed);
        self.entry(function_id)
            .warm_starts
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a request was enqueued (at the moment `acquire` returns
    /// `Queued`, before waiting on the handoff).
    pub fn record_queued(&self, function_id: &str) {
        self.requests_queued.fetch_add(1, Ordering::Relaxed);
        self.entry(function_id)
            .requests_queued
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that ultimately failed.
    pub fn record_failed(&self, function_id: &str) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.entry(function_id)
            .requests_failed
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Global counters only, ignoring the per-function breakdown.
    #[must_use]
    pub fn global_snapshot(&self) -> FunctionCountersSnapshot {
        FunctionCountersSnapshot {
            cold_starts: self.cold_starts.load(Ordering::Relaxed),
            warm_starts: self.warm_starts.load(Ordering::Relaxed),
            requests_queued: self.requests_queued.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }

    /// Snapshot a single function's counters, or zeros if it has never
    /// recorded an event (e.g. a pool that exists only via preconfiguration).
    #[must_use]
    pub fn function_snapshot(&self, function_id: &str) -> FunctionCountersSnapshot {
        self.per_function
            .get(function_id)
            .map(|c| c.snapshot())
            .unwrap_or_default()
    }

    /// Zero every counter, global and per-function, with respect to past
    /// increments. Increments racing this call may land on either epoch —
    /// the spec explicitly allows that.
    pub fn reset(&self) {
        self.cold_starts.store(0, Ordering::Relaxed);
        self.warm_starts.store(0, Ordering::Relaxed);
        self.requests_queued.store(0, Ordering::Relaxed);
        self.requests_failed.store(0, Ordering::Relaxed);
        for entry in &self.per_function {
            entry.value().reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn records_roll_up_into_global_and_per_function() {
        let stats = Stats::new();
        stats.record_cold_start("a");
        stats.record_cold_start("a");
        stats.record_warm_start("a");
        stats.record_cold_start("b");

        let global = stats.global_snapshot();
        assert_eq!(global.cold_starts, 3);
        assert_eq!(global.warm_starts, 1);

        let a = stats.function_snapshot("a");
        assert_eq!(a.cold_starts, 2);
        assert_eq!(a.warm_starts, 1);

        let b = stats.function_snapshot("b");
        assert_eq!(b.cold_starts, 1);
        assert_eq!(b.warm_starts, 0);
    }

    #[test]
    fn unseen_function_snapshots_as_zero() {
        let stats = Stats::new();
        let snap = stats.function_snapshot("never-touched");
        assert_eq!(snap.cold_starts, 0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let stats = Stats::new();
        stats.record_cold_start("a");
        stats.record_failed("a");
        stats.reset();

        assert_eq!(stats.global_snapshot().cold_starts, 0);
        assert_eq!(stats.function_snapshot("a").requests_failed, 0);
    }
}
