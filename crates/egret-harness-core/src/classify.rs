//! Result classifier: invocation outcome → terminal record or validation handoff.
//!
//! | Outcome            | status               | thrownBy |
//! |--------------------|----------------------|----------|
//! | `EngineError`      | `engine_error`       | EGRET    |
//! | `MatcherError`     | `matcher_error`      | HOST     |
//! | `Timeout`          | `timeout`            | EGRET    |
//! | `UnexpectedError`  | `unexpected_error`   | EGRET    |
//! | `Success`, no BEGIN| `protocol_violation` | EGRET    |
//! | `Success`          | handed to validation | n/a      |

use std::sync::Arc;

use crate::engine::protocol::{parse_engine_output, EngineResponse};
use crate::invoker::InvocationOutcome;
use crate::matcher::CompiledPattern;
use crate::record::{PatternRecord, RecordStatus, ThrownBy};

/// Work the validation pass must finish for a successful invocation.
#[derive(Debug, Clone)]
pub struct ValidationTicket {
    pub pattern: String,
    pub compiled: Arc<dyn CompiledPattern>,
    pub response: EngineResponse,
}

/// Where a pattern goes after invocation.
#[derive(Debug, Clone)]
pub enum Classification {
    /// The pipeline ends here with this record.
    Terminal(PatternRecord),
    /// Candidates still need validating.
    Validate(ValidationTicket),
}

pub fn classify(pattern: &str, outcome: InvocationOutcome) -> Classification {
    let failed = |status, thrown_by, message: String| {
        Classification::Terminal(PatternRecord::failed(pattern, status, thrown_by, message))
    };

    match outcome {
        InvocationOutcome::EngineError(status) => {
            failed(RecordStatus::EngineError, ThrownBy::Egret, status)
        }
        InvocationOutcome::MatcherError(detail) => {
            failed(RecordStatus::MatcherError, ThrownBy::Host, detail)
        }
        InvocationOutcome::Timeout { limit_ms } => failed(
            RecordStatus::Timeout,
            ThrownBy::Egret,
            format!("generation timed out after {limit_ms}ms"),
        ),
        InvocationOutcome::UnexpectedError(detail) => {
            failed(RecordStatus::UnexpectedError, ThrownBy::Egret, detail)
        }
        InvocationOutcome::Success { compiled, raw } => match parse_engine_output(raw) {
            Ok(response) => Classification::Validate(ValidationTicket {
                pattern: pattern.to_string(),
                compiled,
                response,
            }),
            Err(violation) => failed(
                RecordStatus::ProtocolViolation,
                ThrownBy::Egret,
                violation.to_string(),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{PatternMatcher, RegexMatcher};

    fn terminal(c: Classification) -> PatternRecord {
        match c {
            Classification::Terminal(record) => record,
            Classification::Validate(t) => panic!("expected Terminal, got ticket for {}", t.pattern),
        }
    }

    fn success(raw: &[&str]) -> InvocationOutcome {
        InvocationOutcome::Success {
            compiled: RegexMatcher::new().compile("a").unwrap(),
            raw: raw.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_engine_error_record() {
        let record = terminal(classify(
            "a",
            InvocationOutcome::EngineError("ERROR: nope".into()),
        ));
        assert_eq!(record.status, RecordStatus::EngineError);
        let trace = record.exception_stack_trace.unwrap();
        assert_eq!(trace.thrown_by, ThrownBy::Egret);
        assert_eq!(trace.message, "ERROR: nope");
        assert!(record.matches.is_empty() && record.non_matches.is_empty());
    }

    #[test]
    fn test_matcher_error_is_host() {
        let record = terminal(classify(
            "(",
            InvocationOutcome::MatcherError("unclosed group".into()),
        ));
        assert_eq!(record.status, RecordStatus::MatcherError);
        assert_eq!(
            record.exception_stack_trace.unwrap().thrown_by,
            ThrownBy::Host
        );
    }

    #[test]
    fn test_timeout_is_recorded() {
        let record = terminal(classify("a", InvocationOutcome::Timeout { limit_ms: 10_000 }));
        assert_eq!(record.status, RecordStatus::Timeout);
        assert!(record
            .exception_stack_trace
            .unwrap()
            .message
            .contains("10000ms"));
    }

    #[test]
    fn test_unexpected_error_is_egret() {
        let record = terminal(classify(
            "a",
            InvocationOutcome::UnexpectedError("broken pipe".into()),
        ));
        assert_eq!(record.status, RecordStatus::UnexpectedError);
        assert_eq!(
            record.exception_stack_trace.unwrap().thrown_by,
            ThrownBy::Egret
        );
    }

    #[test]
    fn test_missing_sentinel_is_protocol_violation() {
        let record = terminal(classify("a", success(&["a", "b"])));
        assert_eq!(record.status, RecordStatus::ProtocolViolation);
        assert!(record
            .exception_stack_trace
            .unwrap()
            .message
            .contains("BEGIN"));
    }

    #[test]
    fn test_success_hands_off_split_response() {
        match classify("a", success(&["alert", "BEGIN", "a", "b"])) {
            Classification::Validate(ticket) => {
                assert_eq!(ticket.pattern, "a");
                assert_eq!(ticket.response.alerts, vec!["alert"]);
                assert_eq!(ticket.response.candidates, vec!["a", "b"]);
            }
            Classification::Terminal(r) => panic!("expected Validate, got {:?}", r),
        }
    }
}
