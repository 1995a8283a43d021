//! Global atomic counters for harness observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a batch).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Relaxed atomic counters.
pub struct Metrics {
    patterns_processed: AtomicU64,
    generation_timeouts: AtomicU64,
    validation_timeouts: AtomicU64,
    workers_lost: AtomicU64,
    matcher_refusals: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            patterns_processed: AtomicU64::new(0),
            generation_timeouts: AtomicU64::new(0),
            validation_timeouts: AtomicU64::new(0),
            workers_lost: AtomicU64::new(0),
            matcher_refusals: AtomicU64::new(0),
        }
    }

    pub fn inc_patterns_processed(&self) {
        self.patterns_processed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "patterns_processed", "counter incremented");
    }

    pub fn inc_generation_timeouts(&self) {
        self.generation_timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "generation_timeouts", "counter incremented");
    }

    pub fn inc_validation_timeouts(&self) {
        self.validation_timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "validation_timeouts", "counter incremented");
    }

    /// A bounded worker panicked or vanished without a result.
    pub fn inc_workers_lost(&self) {
        self.workers_lost.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "workers_lost", "counter incremented");
    }

    /// The local engine gave up on a candidate (backtrack limit).
    pub fn inc_matcher_refusals(&self) {
        self.matcher_refusals.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "matcher_refusals", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            patterns_processed = self.patterns_processed(),
            generation_timeouts = self.generation_timeouts(),
            validation_timeouts = self.validation_timeouts(),
            workers_lost = self.workers_lost(),
            matcher_refusals = self.matcher_refusals(),
        );
    }

    pub fn patterns_processed(&self) -> u64 {
        self.patterns_processed.load(Ordering::Relaxed)
    }

    pub fn generation_timeouts(&self) -> u64 {
        self.generation_timeouts.load(Ordering::Relaxed)
    }

    pub fn validation_timeouts(&self) -> u64 {
        self.validation_timeouts.load(Ordering::Relaxed)
    }

    pub fn workers_lost(&self) -> u64 {
        self.workers_lost.load(Ordering::Relaxed)
    }

    pub fn matcher_refusals(&self) -> u64 {
        self.matcher_refusals.load(Ordering::Relaxed)
    }
}
