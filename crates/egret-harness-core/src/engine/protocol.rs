//! Engine output protocol.
//!
//! The engine answers with a flat string sequence. A leading element starting
//! with `ERROR` is an engine-signaled failure. Otherwise the literal `BEGIN`
//! separates alert strings (before it) from candidate strings (after it).
//! [`parse_engine_output`] turns that framing into an [`EngineResponse`] in a
//! single bounded pass.

use serde::{Deserialize, Serialize};

/// Boundary between alerts and candidates.
pub const SENTINEL: &str = "BEGIN";

/// Prefix of an engine-signaled failure status.
pub const ERROR_PREFIX: &str = "ERROR";

/// Structured engine answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub alerts: Vec<String>,
    pub candidates: Vec<String>,
}

/// The raw sequence has no `BEGIN` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine output has no BEGIN sentinel ({len} element(s))")]
pub struct ProtocolViolation {
    pub len: usize,
}

/// The engine status carried by `raw`, if it signals a failure.
pub fn engine_error_status(raw: &[String]) -> Option<&str> {
    raw.first()
        .map(String::as_str)
        .filter(|status| status.starts_with(ERROR_PREFIX))
}

/// Split `raw` at the first `BEGIN`.
pub fn parse_engine_output(raw: Vec<String>) -> Result<EngineResponse, ProtocolViolation> {
    let Some(k) = raw.iter().position(|s| s == SENTINEL) else {
        return Err(ProtocolViolation { len: raw.len() });
    };
    let mut alerts = raw;
    let candidates = alerts.split_off(k + 1);
    alerts.truncate(k);
    Ok(EngineResponse { alerts, candidates })
}
