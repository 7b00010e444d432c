#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use stagerun::exec::CommandSpec;
use stagerun::run::{PreflightCheck, RunSpec};
use stagerun::staging::ArtifactMatcher;
use stagerun::types::RunMode;

/// Builder for `RunSpec` to simplify test setup.
///
/// Defaults: blocking mode, staging dir `"staging"`, a 100ms poll interval
/// and a 5s per-item timeout.
pub struct RunSpecBuilder {
    spec: RunSpec,
}

impl RunSpecBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            spec: RunSpec {
                command: CommandSpec::new(program),
                working_dir: PathBuf::from("staging"),
                mode: RunMode::BlockingExit,
                expected: Vec::new(),
                per_item_timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(100),
                preflight: None,
            },
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.command = self.spec.command.with_args(args);
        self
    }

    pub fn staging(mut self, dir: &str) -> Self {
        self.spec.working_dir = PathBuf::from(dir);
        self
    }

    pub fn poll_mode(mut self) -> Self {
        self.spec.mode = RunMode::PollForArtifacts;
        self
    }

    pub fn expect(mut self, matcher: ArtifactMatcher) -> Self {
        self.spec.expected.push(matcher);
        self
    }

    pub fn expect_suffix(self, suffix: &str) -> Self {
        self.expect(ArtifactMatcher::suffixes([suffix]))
    }

    pub fn per_item_timeout(mut self, timeout: Duration) -> Self {
        self.spec.per_item_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.spec.poll_interval = interval;
        self
    }

    pub fn preflight(mut self, allowlist: &[&str]) -> Self {
        self.spec.preflight = Some(PreflightCheck {
            allowlist: allowlist.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> RunSpec {
        self.spec
    }
}
