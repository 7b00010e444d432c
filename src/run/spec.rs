// src/run/spec.rs

//! Run description and result value objects.
//!
//! A [`RunSpec`] is built per invocation, consumed by exactly one
//! `RunCoordinator::start` call, and discarded once the [`RunResult`] is
//! produced. Nothing here persists across runs.

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{Result, StagerunError};
use crate::exec::CommandSpec;
use crate::staging::ArtifactMatcher;
use crate::types::RunMode;

/// Optional pre-flight emptiness check for the staging directory.
#[derive(Debug, Clone, Default)]
pub struct PreflightCheck {
    /// Entry names permitted to exist in staging before the run (e.g. a
    /// control file the tool reads). Hidden entries are always permitted.
    pub allowlist: Vec<String>,
}

/// Everything needed for one run of an external tool.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Final resolved command; no quoting or platform wrapping happens here.
    pub command: CommandSpec,
    /// Staging directory the tool reads inputs from and writes outputs to.
    pub working_dir: PathBuf,
    pub mode: RunMode,
    /// Expected output artifacts, in harvest order.
    pub expected: Vec<ArtifactMatcher>,
    /// Max time without any new artifact before the run is abandoned.
    /// Progress resets this clock.
    pub per_item_timeout: Duration,
    pub poll_interval: Duration,
    /// When set, staging must be clear of unexpected files before launch.
    pub preflight: Option<PreflightCheck>,
}

impl RunSpec {
    /// Fail-fast structural validation, done before anything is launched.
    pub fn validate(&self) -> Result<()> {
        if self.command.program.as_os_str().is_empty() {
            return Err(StagerunError::InvalidSpec(
                "command program must not be empty".to_string(),
            ));
        }
        if self.mode == RunMode::PollForArtifacts && self.expected.is_empty() {
            return Err(StagerunError::InvalidSpec(
                "poll mode requires at least one expected artifact".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(StagerunError::InvalidSpec(
                "poll_interval must be non-zero".to_string(),
            ));
        }
        if self.per_item_timeout.is_zero() {
            return Err(StagerunError::InvalidSpec(
                "per_item_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// An artifact found in the staging directory during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArtifact {
    /// Index into `RunSpec::expected` of the matcher this file satisfied.
    pub matcher_index: usize,
    pub path: PathBuf,
    /// Offset from run start at which the artifact was discovered.
    pub discovered_at: Duration,
}

/// A discovered artifact plus the outcome of its harvest call.
#[derive(Debug, Clone)]
pub struct HarvestedArtifact {
    pub artifact: DiscoveredArtifact,
    /// Set when the harvest callback failed for this artifact. Other
    /// artifacts are unaffected.
    pub harvest_error: Option<String>,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All expected artifacts appeared (poll mode), or the tool exited with
    /// the success code (blocking mode).
    Satisfied,
    /// No progress for longer than `per_item_timeout`; whatever subset had
    /// appeared was still harvested.
    TimedOut,
    /// Cancelled via `CancelHandle` or the abort sentinel file; like
    /// `TimedOut`, already-found artifacts were harvested.
    Cancelled,
    /// Blocking mode only: the tool exited with this failure code.
    ProcessFailed(i32),
    /// The OS could not start the tool; `RunResult::launch_error` has the
    /// attempted command line.
    LaunchFailed,
}

/// Summary handed back to the caller after a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub outcome: RunOutcome,
    /// Rendered diagnostics when the process could not be started.
    pub launch_error: Option<String>,
    /// Harvested artifacts, in matcher order.
    pub artifacts: Vec<HarvestedArtifact>,
    /// Matcher indices never satisfied before the run ended (timed out or
    /// cancelled). Empty on `Satisfied`.
    pub timed_out_matchers: Vec<usize>,
    pub cancelled: bool,
}

impl RunResult {
    pub fn launch_failure(command_line: String) -> Self {
        Self {
            outcome: RunOutcome::LaunchFailed,
            launch_error: Some(command_line),
            artifacts: Vec::new(),
            timed_out_matchers: Vec::new(),
            cancelled: false,
        }
    }

    /// True when every expected artifact was found and harvested cleanly.
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Satisfied
            && self.artifacts.iter().all(|a| a.harvest_error.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(mode: RunMode, expected: Vec<ArtifactMatcher>) -> RunSpec {
        RunSpec {
            command: CommandSpec::new("/usr/bin/true"),
            working_dir: PathBuf::from("staging"),
            mode,
            expected,
            per_item_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            preflight: None,
        }
    }

    #[test]
    fn poll_mode_requires_matchers() {
        let s = spec(RunMode::PollForArtifacts, vec![]);
        assert!(matches!(
            s.validate(),
            Err(StagerunError::InvalidSpec(_))
        ));
    }

    #[test]
    fn blocking_mode_allows_empty_matchers() {
        let s = spec(RunMode::BlockingExit, vec![]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn empty_program_rejected() {
        let mut s = spec(RunMode::BlockingExit, vec![]);
        s.command = CommandSpec::new("");
        assert!(s.validate().is_err());
    }
}
