//! Structured observability hooks for the batch lifecycle.
//!
//! - `batch_span` tagging every event of a batch with its run id
//! - emission functions for batch start, per-pattern completion, rejection,
//!   progress and batch finish
//!
//! All events carry an `event` field so they can be filtered in JSON logs.

use tracing::{debug, info, warn};

use crate::record::PatternRecord;

/// The batch span itself, for `Instrument`ing async work.
pub fn batch_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("egret.batch", run_id = %run_id)
}

pub fn emit_batch_started(run_id: &str, total_entries: usize, jobs: usize) {
    info!(
        event = "batch.started",
        run_id = %run_id,
        total_entries = total_entries,
        jobs = jobs,
    );
}

/// A pattern finished its pipeline (any status).
pub fn emit_pattern_finished(index: usize, record: &PatternRecord, duration_ms: u64) {
    if record.is_ok() {
        debug!(
            event = "pattern.finished",
            index = index,
            status = %record.status,
            matches = record.matches.len(),
            non_matches = record.non_matches.len(),
            truncated = record.truncated,
            duration_ms = duration_ms,
        );
    } else {
        let message = record
            .exception_stack_trace
            .as_ref()
            .map(|t| t.message.as_str())
            .unwrap_or_default();
        warn!(
            event = "pattern.failed",
            index = index,
            status = %record.status,
            pattern = %record.pattern,
            error = %message,
            duration_ms = duration_ms,
        );
    }
}

/// An input entry never entered the pipeline.
pub fn emit_entry_rejected(index: usize, reason: &dyn std::fmt::Display) {
    debug!(event = "entry.rejected", index = index, reason = %reason);
}

pub fn emit_progress(completed: usize, total: usize) {
    let percent = if total == 0 {
        100.0
    } else {
        100.0 * completed as f64 / total as f64
    };
    info!(
        event = "batch.progress",
        completed = completed,
        total = total,
        percent = %format!("{percent:.1}"),
    );
}

pub fn emit_batch_finished(run_id: &str, records: usize, failed: usize, duration_ms: u64) {
    info!(
        event = "batch.finished",
        run_id = %run_id,
        records = records,
        failed = failed,
        duration_ms = duration_ms,
    );
}
