//! Subprocess-backed generation engine.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{EngineFault, GenerationEngine, GenerationRequest};

/// Runs an external generator once per pattern.
///
/// Invocation: `<program> <args...> --regex <pattern> --base-substring <base>`
/// plus `--debug` / `--stat` when those flags are set. The program must print
/// a JSON array of strings on stdout and exit 0.
///
/// The child is spawned with `kill_on_drop`, so a caller that stops awaiting
/// (deadline expiry) terminates the process.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Fixed leading arguments placed before the per-pattern ones.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn command_for(&self, request: &GenerationRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--regex")
            .arg(&request.pattern)
            .arg("--base-substring")
            .arg(&request.base_substring);
        if request.flags.debug {
            cmd.arg("--debug");
        }
        if request.flags.stat {
            cmd.arg("--stat");
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl GenerationEngine for CommandEngine {
    fn name(&self) -> &str {
        "command"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, EngineFault> {
        let start = Instant::now();

        let child = self
            .command_for(request)
            .spawn()
            .map_err(|e| EngineFault::Spawn(format!("{}: {e}", self.program.display())))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineFault::Other(format!("waiting for engine: {e}")))?;

        debug!(
            program = %self.program.display(),
            duration_ms = start.elapsed().as_millis() as u64,
            exit_code = ?output.status.code(),
            "engine process finished"
        );

        if !output.status.success() {
            return Err(EngineFault::Exited {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice::<Vec<String>>(&output.stdout)
            .map_err(|e| EngineFault::MalformedOutput(e.to_string()))
    }
}
