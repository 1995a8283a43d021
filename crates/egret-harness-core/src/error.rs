//! Harness-level error taxonomy.
//!
//! Per-pattern failures never surface here: they are folded into
//! [`PatternRecord`](crate::record::PatternRecord)s. These errors cover the
//! batch edges only (configuration, input loading, output writing).

/// Errors produced outside the per-pattern pipeline.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("invalid harness configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed input entry {index}: {reason}")]
    MalformedInput { index: usize, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
