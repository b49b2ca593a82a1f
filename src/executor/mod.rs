//! Process executor: runs synthesized commands under a wall-clock timeout
//!
//! Commands arrive as full command strings (the model emits them that way),
//! get tokenized into an argv vector, and are spawned directly — no shell.
//! Three failure shapes are kept distinct because callers act on them
//! differently: a timeout, a non-zero exit, and a spawn failure.
//!
//! Media tools log progress and diagnostics to stderr even on success, so
//! combined output puts stderr first.

pub mod tokenizer;

pub use tokenizer::{rejoin, tokenize};

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default wall-clock timeout for an external tool run
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// How one execution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Process exited on its own; success iff the code is zero
    Completed { exit_code: i32 },

    /// The timeout fired first; the child was forcibly killed
    TimedOut,

    /// The process never started (binary missing, not executable, empty
    /// command)
    SpawnFailed { reason: String },
}

/// Result of running one command
#[derive(Debug, Clone)]
pub struct Execution {
    /// How the run ended
    pub status: ExecutionStatus,

    /// Combined output, stderr first
    pub output: String,

    /// Wall-clock duration
    pub duration: Duration,
}

impl Execution {
    /// True only for a zero exit code
    pub fn succeeded(&self) -> bool {
        matches!(self.status, ExecutionStatus::Completed { exit_code: 0 })
    }

    /// Human-readable failure description, if any
    pub fn failure_message(&self, timeout_secs: u64) -> Option<String> {
        match &self.status {
            ExecutionStatus::Completed { exit_code: 0 } => None,
            ExecutionStatus::Completed { exit_code } => {
                Some(format!("Command exited with code {}", exit_code))
            }
            ExecutionStatus::TimedOut => {
                Some(format!("Command timed out after {}s", timeout_secs))
            }
            ExecutionStatus::SpawnFailed { reason } => {
                Some(format!("Failed to start command: {}", reason))
            }
        }
    }
}

/// Executor for external media tools
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    /// Create an executor with the given wall-clock timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a command string to completion or timeout
    ///
    /// Never returns an error: all three failure shapes come back as
    /// structured [`ExecutionStatus`] values.
    pub async fn execute(&self, command_line: &str) -> Execution {
        let start = Instant::now();

        let argv = tokenize(command_line);
        let Some((program, args)) = argv.split_first() else {
            return Execution {
                status: ExecutionStatus::SpawnFailed {
                    reason: "empty command".to_string(),
                },
                output: String::new(),
                duration: start.elapsed(),
            };
        };

        debug!(program = %program, arg_count = args.len(), "spawning external tool");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A fired timeout drops the in-flight future; this reaps the
            // child instead of leaving it running detached
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %program, error = %e, "spawn failed");
                return Execution {
                    status: ExecutionStatus::SpawnFailed {
                        reason: format!("{}: {}", program, e),
                    },
                    output: String::new(),
                    duration: start.elapsed(),
                };
            }
        };

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let exit_code = output.status.code().unwrap_or(-1);

                Execution {
                    status: ExecutionStatus::Completed { exit_code },
                    output: combine_output(stdout, stderr),
                    duration: start.elapsed(),
                }
            }
            Ok(Err(e)) => Execution {
                status: ExecutionStatus::SpawnFailed {
                    reason: format!("wait failed: {}", e),
                },
                output: String::new(),
                duration: start.elapsed(),
            },
            Err(_) => {
                warn!(program = %program, timeout_secs = self.timeout.as_secs(), "execution timed out");
                Execution {
                    status: ExecutionStatus::TimedOut,
                    output: String::new(),
                    duration: start.elapsed(),
                }
            }
        }
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

/// Combine captured streams, stderr first
fn combine_output(stdout: String, stderr: String) -> String {
    if stderr.trim().is_empty() {
        stdout
    } else if stdout.trim().is_empty() {
        stderr
    } else {
        format!("{}\n{}", stderr.trim_end(), stdout.trim_end())
    }
}
