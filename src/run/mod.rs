// src/run/mod.rs

//! Run orchestration.
//!
//! This module ties together:
//! - the run description and result value objects ([`spec`])
//! - the pure completion-detection state machine ([`detector`])
//! - the async poll shell ([`poll`])
//! - the coordinator that validates, launches, detects and harvests
//!   ([`coordinator`])
//! - the harvest seam ([`harvest`])
//!
//! The pure core state machine lives in [`detector`]; the async/IO shell is
//! implemented in [`poll`] and [`coordinator`].

pub mod cancel;
pub mod coordinator;
pub mod detector;
pub mod harvest;
pub mod poll;
pub mod spec;

pub use cancel::CancelHandle;
pub use coordinator::RunCoordinator;
pub use detector::{DetectorCore, DetectorState, PollObservation};
pub use harvest::{Harvester, MoveHarvester};
pub use spec::{
    DiscoveredArtifact, HarvestedArtifact, PreflightCheck, RunOutcome, RunResult, RunSpec,
};
