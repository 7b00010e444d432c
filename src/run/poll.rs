// src/run/poll.rs

//! Async shell around [`DetectorCore`] for poll mode.
//!
//! The sleep in this loop is the run's only suspension point and its sole
//! cancellation check; a `Cancel()` call or the abort sentinel is observed
//! within one `poll_interval`.

use std::time::Duration;

use tokio::time::Instant;

use tracing::{debug, trace};

use super::cancel::CancelHandle;
use super::detector::{DetectorCore, PollObservation};
use crate::errors::Result;
use crate::staging::{ArtifactMatcher, StagingArea};
use crate::types::ABORT_SENTINEL;

/// Poll the staging area until the detector reaches a terminal state.
///
/// Directory errors (`DirectoryUnavailable`) abort the run and propagate;
/// everything else ends through the detector's own terminal states.
pub async fn poll_until_done(
    staging: &StagingArea,
    matchers: &[ArtifactMatcher],
    poll_interval: Duration,
    cancel: &CancelHandle,
    core: &mut DetectorCore,
) -> Result<()> {
    let started = Instant::now();
    core.start(Duration::ZERO);

    loop {
        tokio::time::sleep(poll_interval).await;
        let now = started.elapsed();

        let cancel_requested = cancel.is_cancelled();
        let abort_sentinel = staging.contains(ABORT_SENTINEL);

        // Skip the directory scan when we're stopping anyway; new artifacts
        // in the same tick as a cancel are deliberately not recorded.
        let found = if cancel_requested || abort_sentinel {
            Vec::new()
        } else {
            staging.list_matching(matchers, core.satisfied())?
        };

        if !found.is_empty() {
            debug!(
                found = found.len(),
                satisfied = core.satisfied().len(),
                "new artifacts discovered"
            );
        } else {
            trace!(elapsed = ?now, "poll tick, nothing new");
        }

        let state = core.observe_poll(PollObservation {
            now,
            found,
            cancel_requested,
            abort_sentinel,
        });

        if state.is_terminal() {
            debug!(?state, "polling finished");
            return Ok(());
        }
    }
}
