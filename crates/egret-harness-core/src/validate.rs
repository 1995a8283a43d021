//! Validation pass: re-match every candidate locally, one deadline per candidate.
//!
//! The local engine can backtrack without end on strings the generator
//! produced quickly, so each candidate runs on its own bounded worker. The
//! first candidate that exceeds its deadline, loses its worker or makes the
//! engine give up (backtrack limit) ends the pass: earlier candidates stay
//! classified, that one and every later one are dropped, and the result is
//! marked abandoned.

use std::sync::Arc;

use tracing::warn;

use crate::classify::ValidationTicket;
use crate::config::GroupMode;
use crate::matcher::{CompiledPattern, MatchError};
use crate::metrics::METRICS;
use crate::record::{GroupReport, PatternRecord, RecordStatus};
use crate::timeout::{Deadline, ExecError};

/// Why a pass stopped early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbandonReason {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("matcher gave up: {0}")]
    Matcher(#[from] MatchError),
}

impl AbandonReason {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AbandonReason::Exec(e) if e.is_timeout())
    }
}

/// Where and why a pass stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abandonment {
    /// Index of the candidate that was being matched.
    pub index: usize,
    pub reason: AbandonReason,
}

/// Candidates partitioned by the local engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub matches: Vec<String>,
    pub non_matches: Vec<String>,
    pub groups: Vec<GroupReport>,
    pub abandoned: Option<Abandonment>,
}

impl ValidationResult {
    pub fn classified(&self) -> usize {
        self.matches.len() + self.non_matches.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.abandoned.is_some()
    }

    /// The success-path record for `pattern`.
    pub fn into_record(
        self,
        pattern: impl Into<String>,
        alerts: Vec<String>,
        mode: GroupMode,
    ) -> PatternRecord {
        let truncated = self.is_truncated();
        PatternRecord {
            pattern: pattern.into(),
            status: RecordStatus::Ok,
            exception_stack_trace: None,
            alerts,
            matches: self.matches,
            non_matches: self.non_matches,
            truncated,
            groups: (mode.enabled() && !self.groups.is_empty()).then_some(self.groups),
        }
    }
}

/// Runs the local engine over generated candidates.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPass {
    deadline: Deadline,
    groups: GroupMode,
}

impl ValidationPass {
    pub fn new(deadline: Deadline) -> Self {
        Self {
            deadline,
            groups: GroupMode::Off,
        }
    }

    pub fn with_groups(mut self, groups: GroupMode) -> Self {
        self.groups = groups;
        self
    }

    /// Partition `candidates`, in order, into matches and non-matches.
    pub async fn validate(
        &self,
        compiled: Arc<dyn CompiledPattern>,
        candidates: Vec<String>,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();
        let mode = self.groups;

        for (index, candidate) in candidates.into_iter().enumerate() {
            let compiled = Arc::clone(&compiled);
            let outcome = self
                .deadline
                .run_blocking(move || {
                    let verdict = compiled.is_match(&candidate);
                    let captures = if verdict == Ok(true) && mode.enabled() {
                        compiled.group_captures(&candidate, mode == GroupMode::NamedOnly)
                    } else {
                        None
                    };
                    (candidate, verdict, captures)
                })
                .await;

            let reason = match outcome {
                Ok((candidate, Ok(true), captures)) => {
                    if let Some(captures) = captures {
                        result.groups.push(GroupReport {
                            input: candidate.clone(),
                            captures,
                        });
                    }
                    result.matches.push(candidate);
                    continue;
                }
                Ok((candidate, Ok(false), _)) => {
                    result.non_matches.push(candidate);
                    continue;
                }
                Ok((_, Err(refusal), _)) => {
                    METRICS.inc_matcher_refusals();
                    AbandonReason::Matcher(refusal)
                }
                Err(lost) => {
                    if lost.is_timeout() {
                        METRICS.inc_validation_timeouts();
                    } else {
                        METRICS.inc_workers_lost();
                    }
                    AbandonReason::Exec(lost)
                }
            };
            warn!(index, error = %reason, "validation pass abandoned");
            result.abandoned = Some(Abandonment { index, reason });
            break;
        }
        result
    }

    /// Validate a classified ticket and build its record.
    pub async fn finish(&self, ticket: ValidationTicket) -> PatternRecord {
        let ValidationTicket {
            pattern,
            compiled,
            response,
        } = ticket;
        self.validate(compiled, response.candidates)
            .await
            .into_record(pattern, response.alerts, self.groups)
    }
}
