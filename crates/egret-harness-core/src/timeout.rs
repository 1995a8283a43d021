//! Timeout executor: deadline-bounded execution of untrusted operations.
//!
//! Two shapes of work are bounded here:
//!
//! - async work ([`Deadline::run`]), e.g. an engine subprocess. On expiry the
//!   future is dropped, which hard-kills any child spawned with `kill_on_drop`.
//! - blocking work ([`Deadline::run_blocking`]), e.g. a regex match that may
//!   backtrack without end. It runs on a dedicated detached thread; on expiry
//!   the receiver is dropped and the thread is abandoned, so its late result
//!   can never reach a later operation.
//!
//! Every call owns its own timer. The timer is dropped on every exit path, so
//! nothing armed for one operation can fire against another.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::oneshot;

/// Why a bounded operation produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("operation timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    TimedOut { elapsed_ms: u64, limit_ms: u64 },

    #[error("worker lost: {reason}")]
    WorkerLost { reason: String },
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::TimedOut { .. })
    }
}

/// Result type for bounded operations.
pub type ExecResult<T> = std::result::Result<T, ExecError>;

/// A fixed time budget applied to one operation at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn limit_ms(&self) -> u64 {
        self.limit.as_millis() as u64
    }

    /// Await `fut` for at most the budget.
    ///
    /// A panic inside `fut` is reported as [`ExecError::WorkerLost`].
    pub async fn run<F, T>(&self, fut: F) -> ExecResult<T>
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        match tokio::time::timeout(self.limit, AssertUnwindSafe(fut).catch_unwind()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(ExecError::WorkerLost {
                reason: panic_message(payload.as_ref()),
            }),
            Err(_elapsed) => Err(ExecError::TimedOut {
                elapsed_ms: started.elapsed().as_millis() as u64,
                limit_ms: self.limit_ms(),
            }),
        }
    }

    /// Run a blocking `op` on its own worker thread for at most the budget.
    pub async fn run_blocking<F, T>(&self, op: F) -> ExecResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.run(spawn_worker(op)).await?
    }
}

/// Start `op` on a detached worker thread and return a future for its result.
///
/// The thread is never joined. Dropping the returned future abandons it.
pub fn spawn_worker<F, T>(op: F) -> impl Future<Output = ExecResult<T>> + Send
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name("egret-worker".into())
        .spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(op)).map_err(|p| panic_message(p.as_ref()));
            // Receiver is gone when the deadline already fired.
            let _ = tx.send(outcome);
        })
        .map(drop)
        .map_err(|e| e.to_string());

    async move {
        if let Err(reason) = spawned {
            return Err(ExecError::WorkerLost {
                reason: format!("failed to spawn worker: {reason}"),
            });
        }
        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(reason)) => Err(ExecError::WorkerLost { reason }),
            Err(_) => Err(ExecError::WorkerLost {
                reason: "worker exited without a result".into(),
            }),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
