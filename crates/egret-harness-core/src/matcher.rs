//! Local matching engine seam and its `regex` / `fancy_regex` implementation.
//!
//! Patterns compile with the linear-time `regex` crate when they can. Patterns
//! that need backtracking features (backreferences, lookaround) fall up to
//! `fancy_regex`, whose backtracking VM is bounded by a step limit. Hitting the
//! limit is a [`MatchError`], not a verdict.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Compiled-program size ceiling handed to both builders.
pub const DEFAULT_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Backtracking steps a single `fancy_regex` match may take.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// The local engine rejected a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The local engine gave up on one input without a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MatchError {
    pub message: String,
}

impl MatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One capture group of a fully matched candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCapture {
    /// Group name, for named groups.
    pub name: Option<String>,
    /// Group index within the pattern.
    pub index: usize,
    /// Captured text, `None` when the group did not participate.
    pub value: Option<String>,
}

/// A pattern the local engine accepted.
pub trait CompiledPattern: Send + Sync + fmt::Debug {
    /// Does the pattern match somewhere in `input`?
    fn is_match(&self, input: &str) -> Result<bool, MatchError>;

    /// Capture groups of a full match of `input`.
    ///
    /// Named groups are reported when the pattern has any, numbered groups
    /// otherwise. `None` when `input` is not a full match, when the pattern has
    /// no groups, or when `named_only` is set and no group is named.
    fn group_captures(&self, _input: &str, _named_only: bool) -> Option<Vec<GroupCapture>> {
        None
    }
}

/// Compiles patterns.
pub trait PatternMatcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn compile(&self, pattern: &str) -> Result<Arc<dyn CompiledPattern>, CompileError>;
}

/// [`PatternMatcher`] over `regex`, falling up to `fancy_regex`.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    size_limit: usize,
    backtrack_limit: usize,
}

impl Default for RegexMatcher {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
        }
    }
}

impl RegexMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    pub fn with_backtrack_limit(mut self, backtrack_limit: usize) -> Self {
        self.backtrack_limit = backtrack_limit;
        self
    }

    fn build(&self, pattern: &str) -> Result<Engine, CompileError> {
        if let Ok(basic) = regex::RegexBuilder::new(pattern)
            .size_limit(self.size_limit)
            .build()
        {
            return Ok(Engine::Basic(basic));
        }
        fancy_regex::RegexBuilder::new(pattern)
            .backtrack_limit(self.backtrack_limit)
            .delegate_size_limit(self.size_limit)
            .build()
            .map(Engine::Fancy)
            .map_err(|e| CompileError::new(e.to_string()))
    }
}

impl PatternMatcher for RegexMatcher {
    fn name(&self) -> &str {
        "regex"
    }

    fn compile(&self, pattern: &str) -> Result<Arc<dyn CompiledPattern>, CompileError> {
        let search = self.build(pattern)?;
        // Full-match variant for group reports; a pattern that compiles alone
        // can still fail here (e.g. an unbalanced `(?x)` comment), which only
        // disables the group report.
        let anchored = self.build(&format!(r"\A(?:{pattern})\z")).ok();
        Ok(Arc::new(CompiledRegex { search, anchored }))
    }
}

#[derive(Debug)]
enum Engine {
    Basic(regex::Regex),
    Fancy(fancy_regex::Regex),
}

impl Engine {
    fn is_match(&self, input: &str) -> Result<bool, MatchError> {
        match self {
            Engine::Basic(re) => Ok(re.is_match(input)),
            Engine::Fancy(re) => re
                .is_match(input)
                .map_err(|e| MatchError::new(e.to_string())),
        }
    }

    fn capture_names(&self) -> Vec<Option<String>> {
        match self {
            Engine::Basic(re) => re
                .capture_names()
                .map(|n| n.map(str::to_string))
                .collect(),
            Engine::Fancy(re) => re
                .capture_names()
                .map(|n| n.map(str::to_string))
                .collect(),
        }
    }

    /// Every group of a match of `input` (index 0 is the whole match).
    fn captures(&self, input: &str) -> Option<Vec<Option<String>>> {
        let text = |m: Option<&str>| m.map(str::to_string);
        match self {
            Engine::Basic(re) => {
                let caps = re.captures(input)?;
                Some(caps.iter().map(|m| text(m.map(|m| m.as_str()))).collect())
            }
            Engine::Fancy(re) => {
                let caps = re.captures(input).ok()??;
                Some(caps.iter().map(|m| text(m.map(|m| m.as_str()))).collect())
            }
        }
    }
}

#[derive(Debug)]
struct CompiledRegex {
    search: Engine,
    anchored: Option<Engine>,
}

impl CompiledPattern for CompiledRegex {
    fn is_match(&self, input: &str) -> Result<bool, MatchError> {
        self.search.is_match(input)
    }

    fn group_captures(&self, input: &str, named_only: bool) -> Option<Vec<GroupCapture>> {
        let anchored = self.anchored.as_ref()?;
        let names = anchored.capture_names();
        let named: Vec<(usize, String)> = names
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, name)| name.clone().map(|n| (i, n)))
            .collect();
        if named.is_empty() && (named_only || names.len() <= 1) {
            return None;
        }

        let values = anchored.captures(input)?;
        let value = |i: usize| values.get(i).cloned().flatten();

        let groups = if named.is_empty() {
            (1..names.len())
                .map(|index| GroupCapture {
                    name: None,
                    index,
                    value: value(index),
                })
                .collect()
        } else {
            named
                .into_iter()
                .map(|(index, name)| GroupCapture {
                    name: Some(name),
                    index,
                    value: value(index),
                })
                .collect()
        };
        Some(groups)
    }
}
