//! EGRET Harness Core
//!
//! Runs a corpus of regular expressions through an external test-string
//! generation engine, re-validates every generated candidate with a local
//! matcher, and writes one record per pattern into sharded JSON output.
//! Each pattern gets its own generation deadline and each candidate its own
//! validation deadline, so one pathological pattern cannot stall the batch.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod input;
pub mod invoker;
pub mod matcher;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod output;
pub mod partition;
pub mod record;
pub mod summary;
pub mod telemetry;
pub mod timeout;
pub mod validate;

pub use classify::{classify, Classification, ValidationTicket};
pub use config::{GroupMode, HarnessConfig};
pub use engine::{
    parse_engine_output, CommandEngine, EngineFault, EngineFlags, EngineResponse,
    GenerationEngine, GenerationRequest, ProtocolViolation,
};
pub use error::{HarnessError, Result};
pub use input::{load_patterns, parse_entries, LoadedInput, PatternEntry, Rejection};
pub use invoker::{GenerationInvoker, InvocationOutcome};
pub use matcher::{
    CompileError, CompiledPattern, GroupCapture, MatchError, PatternMatcher, RegexMatcher,
    DEFAULT_BACKTRACK_LIMIT,
};
pub use orchestrator::{BatchOrchestrator, BatchReport, LogProgress, Progress, ProgressReporter};
pub use output::{shard_path, write_shards, write_summary, DEFAULT_SHARD_PREFIX, SUMMARY_FILE_NAME};
pub use partition::partition;
pub use record::{ExceptionTrace, GroupReport, PatternRecord, RecordStatus, ThrownBy};
pub use summary::{BatchSummary, StatusCounts};
pub use timeout::{Deadline, ExecError, ExecResult};
pub use validate::{AbandonReason, Abandonment, ValidationPass, ValidationResult};

pub use metrics::METRICS;
pub use obs::{
    emit_batch_finished, emit_batch_started, emit_entry_rejected, emit_pattern_finished,
};
pub use telemetry::init_tracing;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
