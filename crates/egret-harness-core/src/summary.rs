//! Batch summary: what happened to every input entry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{PatternRecord, RecordStatus};

pub const SUMMARY_SCHEMA_VERSION: &str = "1.0";

/// Record counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub engine_error: usize,
    pub matcher_error: usize,
    pub timeout: usize,
    pub unexpected_error: usize,
    pub protocol_violation: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: RecordStatus) {
        let slot = match status {
            RecordStatus::Ok => &mut self.ok,
            RecordStatus::EngineError => &mut self.engine_error,
            RecordStatus::MatcherError => &mut self.matcher_error,
            RecordStatus::Timeout => &mut self.timeout,
            RecordStatus::UnexpectedError => &mut self.unexpected_error,
            RecordStatus::ProtocolViolation => &mut self.protocol_violation,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.ok
            + self.engine_error
            + self.matcher_error
            + self.timeout
            + self.unexpected_error
            + self.protocol_violation
    }

    pub fn failed(&self) -> usize {
        self.total() - self.ok
    }
}

/// Persisted next to the shards as `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// Hex SHA-256 of the input file, when the batch came from one.
    pub input_digest: Option<String>,
    pub total_entries: usize,
    /// Entries refused before invocation (non-string, empty, over length).
    pub rejected: usize,
    pub records: usize,
    pub by_status: StatusCounts,
    /// Ok records whose validation pass was cut short.
    pub truncated: usize,
    pub duration_ms: u64,
}

impl BatchSummary {
    pub fn new(run_id: impl Into<String>, total_entries: usize) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            run_id: run_id.into(),
            generated_at: Utc::now(),
            input_digest: None,
            total_entries,
            rejected: 0,
            records: 0,
            by_status: StatusCounts::default(),
            truncated: 0,
            duration_ms: 0,
        }
    }

    pub fn with_input_digest(mut self, digest: impl Into<String>) -> Self {
        self.input_digest = Some(digest.into());
        self
    }

    pub fn count_record(&mut self, record: &PatternRecord) {
        self.records += 1;
        self.by_status.add(record.status);
        if record.truncated {
            self.truncated += 1;
        }
    }

    pub fn count_rejected(&mut self) {
        self.rejected += 1;
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.generated_at = Utc::now();
        self.duration_ms = elapsed.as_millis() as u64;
    }

    pub fn failed(&self) -> usize {
        self.by_status.failed()
    }
}
