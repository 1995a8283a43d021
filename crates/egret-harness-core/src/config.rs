//! Harness configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::EngineFlags;
use crate::error::{HarnessError, Result};

/// Default per-pattern generation deadline and per-candidate validation deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Patterns longer than this (in characters) are never sent to the engine.
pub const DEFAULT_MAX_PATTERN_LEN: usize = 500;

/// Default number of output shards.
pub const DEFAULT_SHARD_COUNT: usize = 10;

/// Default base substring handed to the generation engine.
pub const DEFAULT_BASE_SUBSTRING: &str = "evil";

/// Which capture-group report to attach to successful records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    /// No group report.
    #[default]
    Off,
    /// Report named and numbered groups.
    All,
    /// Report only patterns that declare named groups.
    NamedOnly,
}

impl GroupMode {
    pub fn enabled(self) -> bool {
        !matches!(self, GroupMode::Off)
    }
}

/// Configuration for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    /// Deadline for compiling a pattern and generating its candidates (milliseconds).
    pub generation_timeout_ms: u64,
    /// Deadline for matching a single candidate string (milliseconds).
    pub validation_timeout_ms: u64,
    /// Base substring forwarded to the generation engine.
    pub base_substring: String,
    /// Maximum admitted pattern length, in characters.
    pub max_pattern_len: usize,
    /// Number of output shards.
    pub shard_count: usize,
    /// Patterns processed concurrently (1 = strictly sequential).
    pub jobs: usize,
    /// Capture-group report mode.
    pub groups: GroupMode,
    /// Toggles forwarded to the generation engine.
    pub engine_flags: EngineFlags,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            generation_timeout_ms: DEFAULT_TIMEOUT_MS,
            validation_timeout_ms: DEFAULT_TIMEOUT_MS,
            base_substring: DEFAULT_BASE_SUBSTRING.to_string(),
            max_pattern_len: DEFAULT_MAX_PATTERN_LEN,
            shard_count: DEFAULT_SHARD_COUNT,
            jobs: 1,
            groups: GroupMode::Off,
            engine_flags: EngineFlags::default(),
        }
    }
}

impl HarnessConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    /// Reject settings that would make the batch meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.generation_timeout_ms == 0 {
            return Err(HarnessError::InvalidConfig(
                "generation_timeout_ms must be positive".into(),
            ));
        }
        if self.validation_timeout_ms == 0 {
            return Err(HarnessError::InvalidConfig(
                "validation_timeout_ms must be positive".into(),
            ));
        }
        if self.shard_count == 0 {
            return Err(HarnessError::InvalidConfig(
                "shard_count must be positive".into(),
            ));
        }
        if self.jobs == 0 {
            return Err(HarnessError::InvalidConfig("jobs must be positive".into()));
        }
        Ok(())
    }
}
