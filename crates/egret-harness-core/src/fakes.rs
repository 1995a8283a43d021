//! In-process fakes of both external engines (testing only)
//!
//! `ScriptedEngine` answers per pattern from a script and can hang, fault or
//! panic on demand. `StallingMatcher` wraps [`RegexMatcher`] and blocks on, or
//! gives up on, chosen candidates or patterns, which reproduces catastrophic
//! backtracking on demand.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::{EngineFault, GenerationEngine, GenerationRequest};
use crate::matcher::{
    CompileError, CompiledPattern, GroupCapture, MatchError, PatternMatcher, RegexMatcher,
};

// ---------------------------------------------------------------------------
// ScriptedEngine
// ---------------------------------------------------------------------------

/// Behaviour of [`ScriptedEngine`] for one pattern.
#[derive(Debug, Clone)]
pub enum EngineScript {
    /// Answer with this raw sequence.
    Respond(Vec<String>),
    /// Answer with this raw sequence after sleeping.
    Delayed(Duration, Vec<String>),
    /// Fail inside the adapter.
    Fault(String),
    /// Never answer.
    Hang,
    /// Panic inside the adapter.
    Panic(String),
}

/// Scripted [`GenerationEngine`]. Unscripted patterns get `["BEGIN"]`.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    scripts: HashMap<String, EngineScript>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, pattern: &str, script: EngineScript) -> Self {
        self.scripts.insert(pattern.to_string(), script);
        self
    }

    pub fn respond(self, pattern: &str, raw: &[&str]) -> Self {
        let raw = raw.iter().map(|s| s.to_string()).collect();
        self.script(pattern, EngineScript::Respond(raw))
    }

    /// Shared log of every request the engine received, in order.
    pub fn call_log(&self) -> Arc<Mutex<Vec<GenerationRequest>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl GenerationEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, EngineFault> {
        self.calls.lock().unwrap().push(request.clone());
        match self.scripts.get(&request.pattern) {
            None => Ok(vec!["BEGIN".to_string()]),
            Some(EngineScript::Respond(raw)) => Ok(raw.clone()),
            Some(EngineScript::Delayed(delay, raw)) => {
                tokio::time::sleep(*delay).await;
                Ok(raw.clone())
            }
            Some(EngineScript::Fault(msg)) => Err(EngineFault::Other(msg.clone())),
            Some(EngineScript::Hang) => std::future::pending().await,
            Some(EngineScript::Panic(msg)) => panic!("{msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// StallingMatcher
// ---------------------------------------------------------------------------

/// [`RegexMatcher`] that blocks its calling thread on selected inputs.
#[derive(Debug, Clone)]
pub struct StallingMatcher {
    inner: RegexMatcher,
    stall: Duration,
    stall_candidates: Arc<HashSet<String>>,
    refused_candidates: Arc<HashSet<String>>,
    stall_patterns: HashSet<String>,
}

impl StallingMatcher {
    pub fn new(stall: Duration) -> Self {
        Self {
            inner: RegexMatcher::new(),
            stall,
            stall_candidates: Arc::new(HashSet::new()),
            refused_candidates: Arc::new(HashSet::new()),
            stall_patterns: HashSet::new(),
        }
    }

    /// Block `is_match` on these candidate strings.
    pub fn on_candidates(mut self, candidates: &[&str]) -> Self {
        self.stall_candidates = Arc::new(candidates.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Answer `is_match` on these candidates with a [`MatchError`].
    pub fn on_refused(mut self, candidates: &[&str]) -> Self {
        self.refused_candidates = Arc::new(candidates.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Block `compile` on these patterns.
    pub fn on_patterns(mut self, patterns: &[&str]) -> Self {
        self.stall_patterns = patterns.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl PatternMatcher for StallingMatcher {
    fn name(&self) -> &str {
        "stalling"
    }

    fn compile(&self, pattern: &str) -> Result<Arc<dyn CompiledPattern>, CompileError> {
        if self.stall_patterns.contains(pattern) {
            std::thread::sleep(self.stall);
        }
        let inner = self.inner.compile(pattern)?;
        Ok(Arc::new(StallingPattern {
            inner,
            stall: self.stall,
            stall_candidates: Arc::clone(&self.stall_candidates),
            refused_candidates: Arc::clone(&self.refused_candidates),
        }))
    }
}

#[derive(Debug)]
struct StallingPattern {
    inner: Arc<dyn CompiledPattern>,
    stall: Duration,
    stall_candidates: Arc<HashSet<String>>,
    refused_candidates: Arc<HashSet<String>>,
}

impl CompiledPattern for StallingPattern {
    fn is_match(&self, input: &str) -> Result<bool, MatchError> {
        if self.stall_candidates.contains(input) {
            std::thread::sleep(self.stall);
        }
        if self.refused_candidates.contains(input) {
            return Err(MatchError::new("backtrack limit exceeded"));
        }
        self.inner.is_match(input)
    }

    fn group_captures(&self, input: &str, named_only: bool) -> Option<Vec<GroupCapture>> {
        self.inner.group_captures(input, named_only)
    }
}
