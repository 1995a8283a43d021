//! Per-pattern output records.

use serde::{Deserialize, Serialize};

use crate::matcher::GroupCapture;

/// Which side raised the failure attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThrownBy {
    /// The generation engine (or its adapter).
    #[serde(rename = "EGRET")]
    Egret,
    /// The local matching engine.
    #[serde(rename = "HOST")]
    Host,
}

impl std::fmt::Display for ThrownBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThrownBy::Egret => write!(f, "EGRET"),
            ThrownBy::Host => write!(f, "HOST"),
        }
    }
}

/// How a pattern's pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Ok,
    EngineError,
    MatcherError,
    Timeout,
    UnexpectedError,
    ProtocolViolation,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "ok",
            RecordStatus::EngineError => "engine_error",
            RecordStatus::MatcherError => "matcher_error",
            RecordStatus::Timeout => "timeout",
            RecordStatus::UnexpectedError => "unexpected_error",
            RecordStatus::ProtocolViolation => "protocol_violation",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionTrace {
    pub thrown_by: ThrownBy,
    pub message: String,
}

/// Capture groups of one matched candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    pub input: String,
    pub captures: Vec<GroupCapture>,
}

/// The emitted unit of work: one per processed pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    pub pattern: String,
    pub status: RecordStatus,
    pub exception_stack_trace: Option<ExceptionTrace>,
    #[serde(default)]
    pub alerts: Vec<String>,
    pub matches: Vec<String>,
    pub non_matches: Vec<String>,
    /// A candidate hit the validation deadline; later candidates were dropped.
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupReport>>,
}

impl PatternRecord {
    /// A record for a pattern whose pipeline failed before validation.
    pub fn failed(
        pattern: impl Into<String>,
        status: RecordStatus,
        thrown_by: ThrownBy,
        message: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            status,
            exception_stack_trace: Some(ExceptionTrace {
                thrown_by,
                message: message.into(),
            }),
            alerts: Vec::new(),
            matches: Vec::new(),
            non_matches: Vec::new(),
            truncated: false,
            groups: None,
        }
    }

    /// Is this record free of an attached failure?
    pub fn is_ok(&self) -> bool {
        self.status == RecordStatus::Ok
    }
}
