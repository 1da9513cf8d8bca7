//! Solver implementation that shells out to an external optimizer.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::{Solver, SolverError, SolverOutcome};

/// Runs the optimization by spawning `<program> [args..] <BASE> <SEAT>`.
///
/// Each stdout line of the child is forwarded to the log sink as it
/// appears. Exit status 0 is success (the summary is the last stdout
/// line); a non-zero exit becomes [`SolverError::Failed`] carrying the
/// captured stderr.
#[derive(Debug, Clone)]
pub struct CommandSolver {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandSolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Parse a whitespace-separated command line, e.g. `python optrunner.py`.
    ///
    /// Returns `None` for an empty line.
    pub fn from_command_line(cmdline: &str) -> Option<Self> {
        let mut parts = cmdline.split_whitespace();
        let program = parts.next()?;
        let mut solver = Self::new(program);
        solver.args = parts.map(str::to_string).collect();
        Some(solver)
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl Solver for CommandSolver {
    async fn run(
        &self,
        base: &str,
        seat: &str,
        log: mpsc::Sender<String>,
    ) -> Result<SolverOutcome, SolverError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(base)
            .arg(seat)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn()?;
        tracing::debug!(program = %self.program, base, seat, "Solver process spawned");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
        let stderr = child.stderr.take();

        // Drain stderr concurrently so a chatty child cannot deadlock on a
        // full pipe while we are still reading stdout.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stream) = stderr {
                let _ = stream.read_to_string(&mut buf).await;
            }
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut last_line = None;
        while let Some(line) = lines.next_line().await? {
            last_line = Some(line.clone());
            if log.send(line).await.is_err() {
                // Receiver gone; keep the child running but stop reporting.
                break;
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(SolverOutcome {
                summary: last_line.unwrap_or_else(|| "optimization complete".to_string()),
            })
        } else {
            let detail = if stderr_output.trim().is_empty() {
                "no error output".to_string()
            } else {
                stderr_output.trim().to_string()
            };
            Err(SolverError::Failed {
                status: status.code().unwrap_or(-1),
                detail,
            })
        }
    }
}
