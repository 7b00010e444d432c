// src/run/coordinator.rs

//! The run coordinator: validate, pre-flight, launch, detect, harvest.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use tracing::{info, warn};

use super::cancel::CancelHandle;
use super::detector::{DetectorCore, DetectorState};
use super::harvest::Harvester;
use super::poll::poll_until_done;
use super::spec::{HarvestedArtifact, RunOutcome, RunResult, RunSpec};
use crate::errors::{Result, StagerunError};
use crate::exec::{LaunchOutcome, ProcessLauncher};
use crate::fs::FileSystem;
use crate::staging::StagingArea;

/// Exit code treated as success in blocking mode.
const SUCCESS_EXIT_CODE: i32 = 0;

/// Orchestrates one run at a time: owns the launcher, the filesystem handle,
/// and the cancel flag. One coordinator owns one staging directory for the
/// duration of a run; concurrent runs against the same directory are the
/// caller's responsibility to prevent (the pre-flight check is the guard,
/// not a lock).
pub struct RunCoordinator<L: ProcessLauncher> {
    launcher: L,
    fs: Arc<dyn FileSystem>,
    cancel: CancelHandle,
}

impl<L: ProcessLauncher> RunCoordinator<L> {
    pub fn new(launcher: L, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            launcher,
            fs,
            cancel: CancelHandle::new(),
        }
    }

    /// Handle for cancelling the current run from another task (Ctrl-C, UI).
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run the spec to completion and harvest what appeared.
    ///
    /// Fatal conditions (`InvalidSpec`, `StagingNotClear`,
    /// `DirectoryUnavailable`) return `Err` with nothing harvested. A failed
    /// launch is reported inside the `RunResult` with the attempted command
    /// line. `TimedOut` and `Cancelled` are partial successes: every
    /// artifact found before the run ended is still harvested.
    pub async fn start(
        &mut self,
        spec: RunSpec,
        harvester: &mut dyn Harvester,
    ) -> Result<RunResult> {
        spec.validate()?;

        let staging = StagingArea::new(spec.working_dir.clone(), Arc::clone(&self.fs));

        if let Some(preflight) = &spec.preflight {
            let report = staging.check_empty(&preflight.allowlist)?;
            if !report.is_clear() {
                return Err(StagerunError::StagingNotClear {
                    dir: spec.working_dir.clone(),
                    entries: report.unexpected,
                });
            }
        }

        let started = Instant::now();
        let mut core = DetectorCore::new(spec.expected.len(), spec.per_item_timeout);

        let launch = self
            .launcher
            .launch(&spec.command, &spec.working_dir, spec.mode)
            .await;

        match launch {
            Err(StagerunError::LaunchFailed {
                command_line,
                source,
            }) => {
                warn!(cmd = %command_line, error = %source, "launch failed");
                return Ok(RunResult::launch_failure(format!(
                    "{command_line}: {source}"
                )));
            }
            Err(other) => return Err(other),
            Ok(LaunchOutcome::Exited(code)) => {
                core.start(Duration::ZERO);
                let state = core.observe_exit(code, SUCCESS_EXIT_CODE);
                if state == DetectorState::Satisfied && !spec.expected.is_empty() {
                    // Tool exited cleanly; one scan resolves the artifacts.
                    let found =
                        staging.list_matching(&spec.expected, core.satisfied())?;
                    core.record_found(started.elapsed(), found);
                }
            }
            Ok(LaunchOutcome::Detached) => {
                poll_until_done(
                    &staging,
                    &spec.expected,
                    spec.poll_interval,
                    &self.cancel,
                    &mut core,
                )
                .await?;
            }
        }

        Ok(self.finish(&mut core, harvester))
    }

    /// Harvest discovered artifacts and assemble the result.
    fn finish(&self, core: &mut DetectorCore, harvester: &mut dyn Harvester) -> RunResult {
        let outcome = match core.state() {
            DetectorState::Satisfied => RunOutcome::Satisfied,
            DetectorState::TimedOut => RunOutcome::TimedOut,
            DetectorState::Cancelled => RunOutcome::Cancelled,
            DetectorState::ProcessFailed(code) => RunOutcome::ProcessFailed(code),
            state @ (DetectorState::Idle | DetectorState::Running) => {
                // Poll loop only returns on terminal states.
                unreachable!("detector left non-terminal: {state:?}")
            }
        };

        // ProcessFailed keeps the tool's output out of the import path.
        let artifacts = if matches!(outcome, RunOutcome::ProcessFailed(_)) {
            Vec::new()
        } else {
            let mut discovered = core.discovered().to_vec();
            discovered.sort_by_key(|a| a.matcher_index);

            discovered
                .into_iter()
                .map(|artifact| {
                    let harvest_error = match harvester.harvest(&artifact) {
                        Ok(()) => None,
                        Err(e) => {
                            warn!(
                                path = ?artifact.path,
                                error = %e,
                                "harvest failed for artifact"
                            );
                            Some(e.to_string())
                        }
                    };
                    HarvestedArtifact {
                        artifact,
                        harvest_error,
                    }
                })
                .collect()
        };

        let timed_out_matchers = match outcome {
            RunOutcome::TimedOut | RunOutcome::Cancelled => core.unsatisfied(),
            _ => Vec::new(),
        };

        info!(
            ?outcome,
            harvested = artifacts.len(),
            unsatisfied = timed_out_matchers.len(),
            "run finished"
        );

        RunResult {
            outcome,
            launch_error: None,
            artifacts,
            timed_out_matchers,
            cancelled: outcome == RunOutcome::Cancelled,
        }
    }
}
