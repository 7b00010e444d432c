// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stagerun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stagerun",
    version,
    about = "Run an external tool against a staging directory and harvest its outputs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Stagerun.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Stagerun.toml")]
    pub config: String,

    /// Name of the `[tool.<name>]` section to run.
    #[arg(long, value_name = "NAME")]
    pub tool: String,

    /// Override the tool's staging directory.
    #[arg(long, value_name = "DIR")]
    pub staging: Option<PathBuf>,

    /// Override the tool's destination directory for harvested artifacts.
    #[arg(long, value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Override the per-item timeout (e.g. "90s", "5m").
    #[arg(long, value_name = "DURATION")]
    pub per_item_timeout: Option<humantime::Duration>,

    /// Override the poll interval (e.g. "250ms", "2s").
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<humantime::Duration>,

    /// Parse + validate, print the resolved run, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STAGERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
