//! Generation engine seam.
//!
//! The engine is an opaque producer of candidate test strings. It receives a
//! pattern, a base substring and a few toggles and answers with the raw string
//! sequence described in [`protocol`].
//!
//! - [`command`]: `CommandEngine`, an external program run as a subprocess
//! - [`protocol`]: status prefix and `BEGIN` sentinel handling

pub mod command;
pub mod protocol;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use command::CommandEngine;
pub use protocol::{parse_engine_output, EngineResponse, ProtocolViolation};

/// Toggles forwarded to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFlags {
    /// Ask the engine for debug output.
    pub debug: bool,
    /// Ask the engine for statistics output.
    pub stat: bool,
}

/// One generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub pattern: String,
    pub base_substring: String,
    pub flags: EngineFlags,
}

impl GenerationRequest {
    pub fn new(pattern: impl Into<String>, base_substring: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            base_substring: base_substring.into(),
            flags: EngineFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: EngineFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Failures of the engine adapter itself (not engine-signaled `ERROR` statuses).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineFault {
    #[error("failed to start engine: {0}")]
    Spawn(String),

    #[error("engine exited with status {code:?}: {stderr}")]
    Exited { code: Option<i32>, stderr: String },

    #[error("engine produced malformed output: {0}")]
    MalformedOutput(String),

    #[error("{0}")]
    Other(String),
}

/// An external generator of candidate strings.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce the raw output sequence for one pattern.
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, EngineFault>;
}
