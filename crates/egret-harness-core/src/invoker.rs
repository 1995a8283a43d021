//! Generation invoker: one deadline-bounded engine call per pattern.

use std::sync::Arc;

use tracing::debug;

use crate::engine::protocol::engine_error_status;
use crate::engine::{EngineFlags, GenerationEngine, GenerationRequest};
use crate::matcher::{CompiledPattern, PatternMatcher};
use crate::timeout::{spawn_worker, Deadline, ExecError};

/// What one invocation produced.
#[derive(Debug, Clone)]
pub enum InvocationOutcome {
    /// The pattern compiled locally and the engine answered without an error status.
    Success {
        compiled: Arc<dyn CompiledPattern>,
        raw: Vec<String>,
    },
    /// The engine answered with an `ERROR...` status.
    EngineError(String),
    /// The local engine rejected the pattern.
    MatcherError(String),
    /// Compilation plus generation exceeded the deadline.
    Timeout { limit_ms: u64 },
    /// Anything else: adapter faults, panics, lost workers.
    UnexpectedError(String),
}

impl InvocationOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            InvocationOutcome::Success { .. } => "success",
            InvocationOutcome::EngineError(_) => "engine_error",
            InvocationOutcome::MatcherError(_) => "matcher_error",
            InvocationOutcome::Timeout { .. } => "timeout",
            InvocationOutcome::UnexpectedError(_) => "unexpected_error",
        }
    }
}

/// Compiles a pattern locally, then asks the engine for candidates, all
/// under one deadline.
pub struct GenerationInvoker {
    engine: Arc<dyn GenerationEngine>,
    matcher: Arc<dyn PatternMatcher>,
    deadline: Deadline,
    base_substring: String,
    flags: EngineFlags,
}

impl GenerationInvoker {
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        matcher: Arc<dyn PatternMatcher>,
        deadline: Deadline,
        base_substring: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            matcher,
            deadline,
            base_substring: base_substring.into(),
            flags: EngineFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: EngineFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Never fails: every way the call can go wrong is an outcome variant.
    pub async fn invoke(&self, pattern: &str) -> InvocationOutcome {
        let outcome = match self.deadline.run(self.attempt(pattern)).await {
            Ok(outcome) => outcome,
            Err(ExecError::TimedOut { limit_ms, .. }) => InvocationOutcome::Timeout { limit_ms },
            Err(ExecError::WorkerLost { reason }) => InvocationOutcome::UnexpectedError(reason),
        };
        debug!(
            engine = self.engine.name(),
            matcher = self.matcher.name(),
            pattern = %pattern,
            outcome = outcome.kind(),
            "invocation finished"
        );
        outcome
    }

    async fn attempt(&self, pattern: &str) -> InvocationOutcome {
        let matcher = Arc::clone(&self.matcher);
        let source = pattern.to_string();
        let compiled = match spawn_worker(move || matcher.compile(&source)).await {
            Ok(Ok(compiled)) => compiled,
            Ok(Err(err)) => return InvocationOutcome::MatcherError(err.message),
            Err(lost) => return InvocationOutcome::UnexpectedError(lost.to_string()),
        };

        let request =
            GenerationRequest::new(pattern, self.base_substring.as_str()).with_flags(self.flags);
        let raw = match self.engine.generate(&request).await {
            Ok(raw) => raw,
            Err(fault) => return InvocationOutcome::UnexpectedError(fault.to_string()),
        };

        if let Some(status) = engine_error_status(&raw) {
            return InvocationOutcome::EngineError(status.to_string());
        }
        InvocationOutcome::Success { compiled, raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{EngineScript, ScriptedEngine};
    use crate::matcher::RegexMatcher;

    fn invoker(engine: ScriptedEngine, limit_ms: u64) -> GenerationInvoker {
        GenerationInvoker::new(
            Arc::new(engine),
            Arc::new(RegexMatcher::new()),
            Deadline::from_millis(limit_ms),
            "evil",
        )
    }

    #[tokio::test]
    async fn test_success_keeps_raw_sequence() {
        let engine = ScriptedEngine::new().respond("^a+$", &["BEGIN", "a"]);
        match invoker(engine, 1000).invoke("^a+$").await {
            InvocationOutcome::Success { compiled, raw } => {
                assert_eq!(raw, vec!["BEGIN", "a"]);
                assert_eq!(compiled.is_match("aaa"), Ok(true));
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_compile_error_never_reaches_engine() {
        let engine = ScriptedEngine::new();
        let calls = engine.call_log();
        let outcome = invoker(engine, 1000).invoke("(").await;
        assert!(matches!(outcome, InvocationOutcome::MatcherError(_)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_engine_error() {
        let engine = ScriptedEngine::new().respond("a", &["ERROR (internal): bad state", "BEGIN"]);
        match invoker(engine, 1000).invoke("a").await {
            InvocationOutcome::EngineError(status) => {
                assert_eq!(status, "ERROR (internal): bad state")
            }
            other => panic!("expected EngineError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hanging_engine_times_out() {
        let engine = ScriptedEngine::new().script("a", EngineScript::Hang);
        let outcome = invoker(engine, 50).invoke("a").await;
        match outcome {
            InvocationOutcome::Timeout { limit_ms } => assert_eq!(limit_ms, 50),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adapter_fault_and_panic_are_unexpected() {
        let engine = ScriptedEngine::new()
            .script("a", EngineScript::Fault("pipe closed".into()))
            .script("b", EngineScript::Panic("index out of range".into()));
        let invoker = invoker(engine, 1000);

        match invoker.invoke("a").await {
            InvocationOutcome::UnexpectedError(msg) => assert!(msg.contains("pipe closed")),
            other => panic!("expected UnexpectedError, got {:?}", other),
        }
        match invoker.invoke("b").await {
            InvocationOutcome::UnexpectedError(msg) => {
                assert!(msg.contains("index out of range"))
            }
            other => panic!("expected UnexpectedError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_carries_base_substring_and_flags() {
        let engine = ScriptedEngine::new().respond("a", &["BEGIN"]);
        let calls = engine.call_log();
        let invoker = invoker(engine, 1000).with_flags(EngineFlags {
            debug: false,
            stat: true,
        });
        invoker.invoke("a").await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].base_substring, "evil");
        assert!(calls[0].flags.stat);
    }
}
