// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, ToolConfig};
use crate::errors::{Result, StagerunError};
use crate::staging::ArtifactMatcher;
use crate::types::RunMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StagerunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.tool))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tools(cfg)?;
    validate_global_config(cfg)?;
    for (name, tool) in cfg.tool.iter() {
        validate_tool(name, tool)?;
    }
    Ok(())
}

fn ensure_has_tools(cfg: &RawConfigFile) -> Result<()> {
    if cfg.tool.is_empty() {
        return Err(StagerunError::ConfigError(
            "config must contain at least one [tool.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // `mode` strings are strongly typed and rejected during deserialization,
    // so only the timing values need checking here.
    if cfg.config.poll_interval.is_zero() {
        return Err(StagerunError::ConfigError(
            "[config].poll_interval must be non-zero".to_string(),
        ));
    }
    if cfg.config.per_item_timeout.is_zero() {
        return Err(StagerunError::ConfigError(
            "[config].per_item_timeout must be non-zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_tool(name: &str, tool: &ToolConfig) -> Result<()> {
    if tool.program.as_os_str().is_empty() {
        return Err(StagerunError::ConfigError(format!(
            "tool '{name}': `program` must not be empty"
        )));
    }
    if tool.staging.as_os_str().is_empty() {
        return Err(StagerunError::ConfigError(format!(
            "tool '{name}': `staging` must not be empty"
        )));
    }
    if tool.mode == RunMode::PollForArtifacts && tool.expect.is_empty() {
        return Err(StagerunError::ConfigError(format!(
            "tool '{name}': mode \"poll\" requires a non-empty `expect` list"
        )));
    }
    for raw in tool.expect.iter() {
        ArtifactMatcher::from_raw(raw).map_err(|e| {
            StagerunError::ConfigError(format!("tool '{name}': invalid matcher: {e}"))
        })?;
    }
    if let Some(d) = tool.per_item_timeout {
        if d.is_zero() {
            return Err(StagerunError::ConfigError(format!(
                "tool '{name}': `per_item_timeout` must be non-zero"
            )));
        }
    }
    if let Some(d) = tool.poll_interval {
        if d.is_zero() {
            return Err(StagerunError::ConfigError(format!(
                "tool '{name}': `poll_interval` must be non-zero"
            )));
        }
    }
    Ok(())
}
