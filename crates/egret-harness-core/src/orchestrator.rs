//! Batch orchestrator: drives every admitted pattern through
//! invoke → classify → validate and accumulates one record per pattern.
//!
//! No failure of a single pattern escapes [`BatchOrchestrator::process_pattern`]:
//! engine errors, compile errors, timeouts, lost workers and panics all end up
//! as a [`PatternRecord`]. Records keep input order even when `jobs > 1`,
//! because completions are re-sequenced by `buffered`, and every in-flight
//! pattern owns its own deadlines.

use std::sync::Arc;
use std::time::Instant;

use futures::{stream, FutureExt, StreamExt};
use tracing::Instrument;
use uuid::Uuid;

use crate::classify::{classify, Classification};
use crate::config::HarnessConfig;
use crate::engine::GenerationEngine;
use crate::error::Result;
use crate::input::PatternEntry;
use crate::invoker::{GenerationInvoker, InvocationOutcome};
use crate::matcher::PatternMatcher;
use crate::metrics::METRICS;
use crate::obs;
use crate::record::{PatternRecord, RecordStatus, ThrownBy};
use crate::summary::BatchSummary;
use crate::timeout::{panic_message, Deadline};
use crate::validate::ValidationPass;

/// Coarse batch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Receives progress after every input entry, admitted or not.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Reports progress as `batch.progress` tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, progress: Progress) {
        obs::emit_progress(progress.completed, progress.total);
    }
}

/// Records and summary of one batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub records: Vec<PatternRecord>,
    pub summary: BatchSummary,
}

pub struct BatchOrchestrator {
    invoker: GenerationInvoker,
    validation: ValidationPass,
    max_pattern_len: usize,
    jobs: usize,
    reporter: Arc<dyn ProgressReporter>,
}

impl BatchOrchestrator {
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        matcher: Arc<dyn PatternMatcher>,
        config: &HarnessConfig,
    ) -> Result<Self> {
        config.validate()?;
        let invoker = GenerationInvoker::new(
            engine,
            matcher,
            Deadline::new(config.generation_timeout()),
            config.base_substring.as_str(),
        )
        .with_flags(config.engine_flags);
        let validation =
            ValidationPass::new(Deadline::new(config.validation_timeout())).with_groups(config.groups);

        Ok(Self {
            invoker,
            validation,
            max_pattern_len: config.max_pattern_len,
            jobs: config.jobs,
            reporter: Arc::new(LogProgress),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Process every entry in order and summarise the batch.
    pub async fn run(&self, entries: Vec<PatternEntry>) -> BatchReport {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::batch_span(&run_id);
        self.run_batch(run_id, entries).instrument(span).await
    }

    async fn run_batch(&self, run_id: String, entries: Vec<PatternEntry>) -> BatchReport {
        let started = Instant::now();
        let total = entries.len();
        obs::emit_batch_started(&run_id, total, self.jobs);

        let mut summary = BatchSummary::new(run_id, total);
        let mut records = Vec::with_capacity(total);

        let mut outcomes = stream::iter(entries.into_iter().enumerate())
            .map(|(index, entry)| self.process_entry(index, entry))
            .buffered(self.jobs);

        let mut completed = 0;
        while let Some(outcome) = outcomes.next().await {
            completed += 1;
            match outcome {
                Some(record) => {
                    summary.count_record(&record);
                    records.push(record);
                }
                None => summary.count_rejected(),
            }
            self.reporter.report(Progress { completed, total });
        }

        summary.finish(started.elapsed());
        obs::emit_batch_finished(
            &summary.run_id,
            summary.records,
            summary.failed(),
            summary.duration_ms,
        );
        METRICS.flush();

        BatchReport { records, summary }
    }

    /// `None` when the entry is refused before invocation.
    async fn process_entry(&self, index: usize, entry: PatternEntry) -> Option<PatternRecord> {
        let pattern = match entry.admit(self.max_pattern_len) {
            Ok(pattern) => pattern,
            Err(rejection) => {
                obs::emit_entry_rejected(index, &rejection);
                return None;
            }
        };

        let started = Instant::now();
        let record = self.process_pattern(pattern).await;
        METRICS.inc_patterns_processed();
        obs::emit_pattern_finished(index, &record, started.elapsed().as_millis() as u64);
        Some(record)
    }

    /// Run one admitted pattern through the full pipeline.
    pub async fn process_pattern(&self, pattern: &str) -> PatternRecord {
        match std::panic::AssertUnwindSafe(self.pipeline(pattern))
            .catch_unwind()
            .await
        {
            Ok(record) => record,
            Err(payload) => {
                METRICS.inc_workers_lost();
                PatternRecord::failed(
                    pattern,
                    RecordStatus::UnexpectedError,
                    ThrownBy::Egret,
                    panic_message(payload.as_ref()),
                )
            }
        }
    }

    async fn pipeline(&self, pattern: &str) -> PatternRecord {
        let outcome = self.invoker.invoke(pattern).await;
        if matches!(outcome, InvocationOutcome::Timeout { .. }) {
            METRICS.inc_generation_timeouts();
        }
        match classify(pattern, outcome) {
            Classification::Terminal(record) => record,
            Classification::Validate(ticket) => self.validation.finish(ticket).await,
        }
    }
}
