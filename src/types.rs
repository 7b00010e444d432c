use std::str::FromStr;

use serde::Deserialize;

/// How a run decides that the external tool is finished.
///
/// - `BlockingExit`: the launcher waits for the child process and the exit
///   code is the completion signal (default behaviour for well-behaved CLI
///   tools).
/// - `PollForArtifacts`: the tool detaches, minimizes, or otherwise never
///   exits in a useful way; completion is detected by polling the staging
///   directory for expected output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RunMode {
    #[serde(rename = "blocking")]
    BlockingExit,
    #[serde(rename = "poll")]
    PollForArtifacts,
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::BlockingExit
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blocking" => Ok(RunMode::BlockingExit),
            "poll" => Ok(RunMode::PollForArtifacts),
            other => Err(format!(
                "invalid mode: {other} (expected \"blocking\" or \"poll\")"
            )),
        }
    }
}

/// Name of the sentinel file that, when present in the staging directory,
/// cancels a polling run. Portable cancel mechanism for callers with no live
/// handle on the coordinator.
pub const ABORT_SENTINEL: &str = ".stagerun-abort";
