// src/exec/launcher.rs

//! The `ProcessLauncher` trait and its production implementation.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{Result, StagerunError};
use crate::types::RunMode;

/// A fully resolved command: executable path plus arguments.
///
/// Quoting, `.app`-bundle unwrapping and platform launch wrappers are the
/// caller's concern; this type carries the final words as they are handed to
/// the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Render the command line for diagnostics (launch failures always carry
    /// the attempted command line).
    pub fn render(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// How a launch resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// BlockingExit mode: the child was awaited and exited with this code.
    Exited(i32),
    /// PollForArtifacts mode: the OS confirmed process creation; the child
    /// was left running (some tools legitimately never exit).
    Detached,
}

/// Trait abstracting how the external tool is started.
///
/// Production code uses [`TokioLauncher`]; tests can provide an
/// implementation that simulates exits or detached tools without spawning
/// anything.
pub trait ProcessLauncher: Send {
    fn launch(
        &mut self,
        command: &CommandSpec,
        working_dir: &Path,
        mode: RunMode,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>>;
}

/// Real launcher used in production.
#[derive(Debug, Clone, Default)]
pub struct TokioLauncher;

impl TokioLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for TokioLauncher {
    fn launch(
        &mut self,
        command: &CommandSpec,
        working_dir: &Path,
        mode: RunMode,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>> {
        let command = command.clone();
        let working_dir = working_dir.to_path_buf();

        Box::pin(async move {
            info!(cmd = %command, mode = ?mode, "launching external tool");

            let mut cmd = Command::new(&command.program);
            cmd.args(&command.args)
                .current_dir(&working_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());

            if mode == RunMode::BlockingExit {
                cmd.kill_on_drop(true);
            }

            let mut child = cmd.spawn().map_err(|e| StagerunError::LaunchFailed {
                command_line: command.render(),
                source: e,
            })?;

            // Always consume stdout/stderr so pipe buffers don't fill; log
            // at debug.
            if let Some(stdout) = child.stdout.take() {
                tokio::spawn(drain_lines(stdout, "stdout"));
            }
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(drain_lines(stderr, "stderr"));
            }

            match mode {
                RunMode::BlockingExit => {
                    let status = child.wait().await.map_err(StagerunError::IoError)?;
                    let code = status.code().unwrap_or(-1);
                    info!(exit_code = code, success = status.success(), "tool exited");
                    Ok(LaunchOutcome::Exited(code))
                }
                RunMode::PollForArtifacts => {
                    // Spawn succeeded; the child keeps running on its own.
                    debug!("tool started detached; completion comes from artifact polling");
                    Ok(LaunchOutcome::Detached)
                }
            }
        })
    }
}

async fn drain_lines<R>(reader: R, stream: &'static str)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let reader = BufReader::new(reader);
    let mut lines = reader.lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(stream, "{}", line);
    }
}
