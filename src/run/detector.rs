// src/run/detector.rs

//! Pure completion-detection state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! observations (an exit code, or one poll tick's findings) and tracks the
//! run state:
//!
//! ```text
//! Idle -> Running -> { Satisfied, TimedOut, Cancelled, ProcessFailed }
//! ```
//!
//! The async/IO-heavy shell (`run::poll`) is responsible for sleeping,
//! reading the staging directory and the cancel flag, and feeding ticks in
//! here. The core has no channels, no Tokio types, and performs no IO, so
//! the timeout and ordering semantics are unit-testable with plain
//! `Duration` arithmetic.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::spec::DiscoveredArtifact;

/// Detector state. The four right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Running,
    Satisfied,
    TimedOut,
    Cancelled,
    ProcessFailed(i32),
}

impl DetectorState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DetectorState::Idle | DetectorState::Running)
    }
}

/// One poll tick's worth of observations, as seen by the IO shell.
#[derive(Debug, Clone, Default)]
pub struct PollObservation {
    /// Offset from run start.
    pub now: Duration,
    /// Newly matched `(matcher_index, path)` pairs from this tick's
    /// directory scan.
    pub found: Vec<(usize, PathBuf)>,
    /// The coordinator's cancel flag was set.
    pub cancel_requested: bool,
    /// The abort sentinel file was present in staging.
    pub abort_sentinel: bool,
}

/// Tracks which matchers are satisfied and decides when a run is done.
#[derive(Debug)]
pub struct DetectorCore {
    matcher_count: usize,
    per_item_timeout: Duration,
    state: DetectorState,
    satisfied: HashSet<usize>,
    discovered: Vec<DiscoveredArtifact>,
    /// Offset of the last tick at which progress was made (or run start).
    /// The overall timeout is measured from here, so a still-productive run
    /// is never abandoned.
    last_progress: Duration,
}

impl DetectorCore {
    pub fn new(matcher_count: usize, per_item_timeout: Duration) -> Self {
        Self {
            matcher_count,
            per_item_timeout,
            state: DetectorState::Idle,
            satisfied: HashSet::new(),
            discovered: Vec::new(),
            last_progress: Duration::ZERO,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn satisfied(&self) -> &HashSet<usize> {
        &self.satisfied
    }

    /// Artifacts discovered so far, in discovery order.
    pub fn discovered(&self) -> &[DiscoveredArtifact] {
        &self.discovered
    }

    /// Matcher indices never satisfied, in index order.
    pub fn unsatisfied(&self) -> Vec<usize> {
        (0..self.matcher_count)
            .filter(|i| !self.satisfied.contains(i))
            .collect()
    }

    /// Transition `Idle -> Running` and start the progress clock.
    pub fn start(&mut self, now: Duration) {
        debug_assert_eq!(self.state, DetectorState::Idle);
        self.state = DetectorState::Running;
        self.last_progress = now;
    }

    /// Blocking-exit mode: the run ends the moment the launcher returns.
    pub fn observe_exit(&mut self, code: i32, success_code: i32) -> DetectorState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.state = if code == success_code {
            DetectorState::Satisfied
        } else {
            DetectorState::ProcessFailed(code)
        };
        self.state
    }

    /// Record artifacts found outside the poll loop (blocking mode does one
    /// final scan after a successful exit).
    pub fn record_found(&mut self, now: Duration, found: Vec<(usize, PathBuf)>) {
        for (idx, path) in found {
            if self.satisfied.insert(idx) {
                self.discovered.push(DiscoveredArtifact {
                    matcher_index: idx,
                    path,
                    discovered_at: now,
                });
            }
        }
    }

    /// Feed one poll tick. Per-tick order:
    /// 1. cancellation (flag or sentinel) wins over everything else;
    /// 2. newly found artifacts are recorded, and any progress resets the
    ///    timeout clock;
    /// 3. all matchers satisfied ends the run;
    /// 4. otherwise, too long since the last progress times the run out.
    ///
    /// `TimedOut` and `Cancelled` still leave the satisfied subset in
    /// [`discovered`](Self::discovered): partial success, not total failure.
    pub fn observe_poll(&mut self, obs: PollObservation) -> DetectorState {
        if self.state.is_terminal() {
            return self.state;
        }

        if obs.cancel_requested || obs.abort_sentinel {
            debug!(
                sentinel = obs.abort_sentinel,
                satisfied = self.satisfied.len(),
                "run cancelled"
            );
            self.state = DetectorState::Cancelled;
            return self.state;
        }

        let progressed = !obs.found.is_empty();
        self.record_found(obs.now, obs.found);
        if progressed {
            self.last_progress = obs.now;
        }

        if self.satisfied.len() == self.matcher_count {
            self.state = DetectorState::Satisfied;
            return self.state;
        }

        let since_progress = obs.now.saturating_sub(self.last_progress);
        if since_progress >= self.per_item_timeout {
            debug!(
                satisfied = self.satisfied.len(),
                expected = self.matcher_count,
                ?since_progress,
                "no progress within timeout; abandoning wait"
            );
            self.state = DetectorState::TimedOut;
        }

        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Duration = Duration::from_secs(1);

    fn tick(n: u64, found: Vec<(usize, PathBuf)>) -> PollObservation {
        PollObservation {
            now: UNIT * n as u32,
            found,
            ..Default::default()
        }
    }

    fn running_core(matchers: usize, timeout_units: u32) -> DetectorCore {
        let mut core = DetectorCore::new(matchers, UNIT * timeout_units);
        core.start(Duration::ZERO);
        core
    }

    #[test]
    fn satisfied_when_all_matchers_found() {
        // a at t=2, b at t=3, timeout 5 -> Satisfied.
        let mut core = running_core(2, 5);
        assert_eq!(core.observe_poll(tick(1, vec![])), DetectorState::Running);
        assert_eq!(
            core.observe_poll(tick(2, vec![(0, "out-a.tif".into())])),
            DetectorState::Running
        );
        assert_eq!(
            core.observe_poll(tick(3, vec![(1, "out-b.tif".into())])),
            DetectorState::Satisfied
        );
        assert_eq!(core.discovered().len(), 2);
        assert!(core.unsatisfied().is_empty());
    }

    #[test]
    fn progress_resets_timeout_clock() {
        // First artifact at t=2; with timeout 5 the run survives until t=7,
        // not t=5.
        let mut core = running_core(2, 5);
        core.observe_poll(tick(2, vec![(0, "out-a.tif".into())]));
        for t in 3..7 {
            assert_eq!(core.observe_poll(tick(t, vec![])), DetectorState::Running);
        }
        assert_eq!(core.observe_poll(tick(7, vec![])), DetectorState::TimedOut);
        assert_eq!(core.discovered().len(), 1);
        assert_eq!(core.unsatisfied(), vec![1]);
    }

    #[test]
    fn timeout_with_no_progress_at_all() {
        let mut core = running_core(1, 3);
        for t in 1..3 {
            assert_eq!(core.observe_poll(tick(t, vec![])), DetectorState::Running);
        }
        assert_eq!(core.observe_poll(tick(3, vec![])), DetectorState::TimedOut);
        assert!(core.discovered().is_empty());
        assert_eq!(core.unsatisfied(), vec![0]);
    }

    #[test]
    fn cancel_wins_over_found_artifacts() {
        let mut core = running_core(1, 5);
        let obs = PollObservation {
            now: UNIT,
            found: vec![(0, "out.tif".into())],
            cancel_requested: true,
            abort_sentinel: false,
        };
        assert_eq!(core.observe_poll(obs), DetectorState::Cancelled);
        // Artifacts found in the same tick as the cancel are not recorded;
        // cancellation is checked first.
        assert!(core.discovered().is_empty());
    }

    #[test]
    fn sentinel_behaves_like_cancel() {
        let mut core = running_core(1, 5);
        let obs = PollObservation {
            now: UNIT,
            abort_sentinel: true,
            ..Default::default()
        };
        assert_eq!(core.observe_poll(obs), DetectorState::Cancelled);
    }

    #[test]
    fn terminal_state_ignores_further_observations() {
        let mut core = running_core(1, 1);
        assert_eq!(core.observe_poll(tick(1, vec![])), DetectorState::TimedOut);
        assert_eq!(
            core.observe_poll(tick(2, vec![(0, "late.tif".into())])),
            DetectorState::TimedOut
        );
        assert!(core.discovered().is_empty());
    }

    #[test]
    fn exit_code_maps_to_satisfied_or_failed() {
        let mut core = running_core(0, 5);
        assert_eq!(core.observe_exit(0, 0), DetectorState::Satisfied);

        let mut core = running_core(0, 5);
        assert_eq!(core.observe_exit(2, 0), DetectorState::ProcessFailed(2));
    }

    #[test]
    fn duplicate_matcher_index_recorded_once() {
        let mut core = running_core(2, 5);
        core.record_found(
            UNIT,
            vec![(0, "a.tif".into()), (0, "a-again.tif".into())],
        );
        assert_eq!(core.discovered().len(), 1);
    }
}
