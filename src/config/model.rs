// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, StagerunError};
use crate::exec::CommandSpec;
use crate::run::{PreflightCheck, RunSpec};
use crate::staging::{ArtifactMatcher, RawMatcherSpec};
use crate::types::RunMode;

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_per_item_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_require_empty() -> bool {
    true
}

/// Global `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_per_item_timeout")]
    pub per_item_timeout: Duration,
    /// Run the staging pre-flight emptiness check before launching.
    #[serde(default = "default_require_empty")]
    pub require_empty_staging: bool,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            per_item_timeout: default_per_item_timeout(),
            require_empty_staging: default_require_empty(),
        }
    }
}

/// One `[tool.<name>]` section: how to run a particular external tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Final resolved executable path; no shell interpretation.
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub mode: RunMode,
    /// Staging directory used for the file exchange with this tool.
    pub staging: PathBuf,
    /// Where harvested artifacts are moved. Required by the CLI's default
    /// harvester; library callers may supply their own harvest step instead.
    pub destination: Option<PathBuf>,
    /// Expected output artifacts, in harvest order.
    #[serde(default)]
    pub expect: Vec<RawMatcherSpec>,
    /// Entry names allowed in staging during pre-flight (e.g. a control
    /// file the tool reads).
    #[serde(default)]
    pub allow: Vec<String>,
    /// Per-tool overrides of the global timing settings.
    #[serde(with = "humantime_serde", default)]
    pub per_item_timeout: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    pub poll_interval: Option<Duration>,
}

/// Raw, unvalidated representation of the config file. This is what serde
/// deserializes; use `ConfigFile::try_from` to get the validated form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,
    #[serde(default)]
    pub tool: BTreeMap<String, ToolConfig>,
}

/// Validated configuration. Construct via `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    tool: BTreeMap<String, ToolConfig>,
}

impl ConfigFile {
    /// Used by the validation layer after all checks pass.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        tool: BTreeMap<String, ToolConfig>,
    ) -> Self {
        Self { config, tool }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tools(&self) -> &BTreeMap<String, ToolConfig> {
        &self.tool
    }

    pub fn tool(&self, name: &str) -> Result<&ToolConfig> {
        self.tool.get(name).ok_or_else(|| {
            StagerunError::ConfigError(format!(
                "unknown tool '{name}' (available: {:?})",
                self.tool.keys().collect::<Vec<_>>()
            ))
        })
    }

    /// Resolve a tool section into a ready-to-run [`RunSpec`].
    pub fn run_spec_for(&self, name: &str) -> Result<RunSpec> {
        let tool = self.tool(name)?;

        let expected: Vec<ArtifactMatcher> = tool
            .expect
            .iter()
            .map(|raw| {
                ArtifactMatcher::from_raw(raw).map_err(|e| {
                    StagerunError::ConfigError(format!(
                        "tool '{name}': invalid matcher: {e}"
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let preflight = if self.config.require_empty_staging {
            Some(PreflightCheck {
                allowlist: tool.allow.clone(),
            })
        } else {
            None
        };

        Ok(RunSpec {
            command: CommandSpec::new(tool.program.clone()).with_args(tool.args.clone()),
            working_dir: tool.staging.clone(),
            mode: tool.mode,
            expected,
            per_item_timeout: tool
                .per_item_timeout
                .unwrap_or(self.config.per_item_timeout),
            poll_interval: tool.poll_interval.unwrap_or(self.config.poll_interval),
            preflight,
        })
    }
}
