//! Pattern corpus loading and admission.
//!
//! The input is a JSON array of objects, each carrying either `pattern` (one
//! value) or `patterns` (an array of values). All values land in one flat list
//! in file order. Structural problems fail the load; a value that is not a
//! usable pattern (non-string, empty, too long) is kept as an entry and
//! rejected later by [`PatternEntry::admit`].

use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{HarnessError, Result};

/// One input value destined for the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternEntry {
    Text(String),
    /// A `pattern` value of any other JSON type.
    NonText(Value),
}

impl From<&str> for PatternEntry {
    fn from(s: &str) -> Self {
        PatternEntry::Text(s.to_string())
    }
}

impl From<Value> for PatternEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => PatternEntry::Text(s),
            other => PatternEntry::NonText(other),
        }
    }
}

/// Why an entry never reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("pattern is not a string")]
    NotText,

    #[error("pattern is empty")]
    Empty,

    #[error("pattern has {len} characters (limit {max})")]
    TooLong { len: usize, max: usize },
}

impl PatternEntry {
    /// The pattern text, if it may enter the pipeline.
    ///
    /// Length is counted in characters, not bytes.
    pub fn admit(&self, max_len: usize) -> std::result::Result<&str, Rejection> {
        let PatternEntry::Text(pattern) = self else {
            return Err(Rejection::NotText);
        };
        if pattern.is_empty() {
            return Err(Rejection::Empty);
        }
        let len = pattern.chars().count();
        if len > max_len {
            return Err(Rejection::TooLong { len, max: max_len });
        }
        Ok(pattern)
    }
}

/// A loaded corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedInput {
    pub entries: Vec<PatternEntry>,
    /// Hex SHA-256 of the raw input bytes.
    pub digest: String,
}

/// Read and parse a corpus file.
pub fn load_patterns(path: &Path) -> Result<LoadedInput> {
    let bytes = std::fs::read(path)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    Ok(LoadedInput {
        entries: parse_entries(value)?,
        digest: digest_bytes(&bytes),
    })
}

/// Flatten a parsed corpus into entries.
pub fn parse_entries(value: Value) -> Result<Vec<PatternEntry>> {
    let Value::Array(objects) = value else {
        return Err(HarnessError::MalformedInput {
            index: 0,
            reason: "expected a JSON array of objects".into(),
        });
    };

    let mut entries = Vec::with_capacity(objects.len());
    for (index, object) in objects.into_iter().enumerate() {
        let Value::Object(mut fields) = object else {
            return Err(HarnessError::MalformedInput {
                index,
                reason: "expected an object".into(),
            });
        };

        if let Some(pattern) = fields.remove("pattern") {
            entries.push(PatternEntry::from(pattern));
        } else if let Some(patterns) = fields.remove("patterns") {
            let Value::Array(patterns) = patterns else {
                return Err(HarnessError::MalformedInput {
                    index,
                    reason: "`patterns` must be an array".into(),
                });
            };
            entries.extend(patterns.into_iter().map(PatternEntry::from));
        } else {
            return Err(HarnessError::MalformedInput {
                index,
                reason: "missing `pattern` or `patterns`".into(),
            });
        }
    }
    Ok(entries)
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
