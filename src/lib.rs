// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod run;
pub mod staging;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::errors::StagerunError;
use crate::exec::TokioLauncher;
use crate::fs::RealFileSystem;
use crate::run::{MoveHarvester, RunCoordinator, RunOutcome, RunResult, RunSpec};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the run coordinator with the real launcher and filesystem
/// - the default move-to-destination harvester
/// - Ctrl-C handling (mapped to run cancellation)
pub async fn run(args: CliArgs) -> Result<RunResult> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let mut spec = cfg.run_spec_for(&args.tool)?;
    if let Some(staging) = &args.staging {
        spec.working_dir = staging.clone();
    }
    if let Some(timeout) = args.per_item_timeout {
        spec.per_item_timeout = timeout.into();
    }
    if let Some(interval) = args.poll_interval {
        spec.poll_interval = interval.into();
    }
    spec.validate()?;

    let destination = args
        .destination
        .clone()
        .or_else(|| cfg.tool(&args.tool).ok().and_then(|t| t.destination.clone()))
        .ok_or_else(|| {
            StagerunError::ConfigError(format!(
                "tool '{}' has no `destination` and none was given via --destination",
                args.tool
            ))
        })?;

    if args.dry_run {
        print_dry_run(&args.tool, &spec, &destination);
        return Ok(RunResult {
            outcome: RunOutcome::Satisfied,
            launch_error: None,
            artifacts: Vec::new(),
            timed_out_matchers: Vec::new(),
            cancelled: false,
        });
    }

    let fs: Arc<dyn fs::FileSystem> = Arc::new(RealFileSystem);
    let mut coordinator = RunCoordinator::new(TokioLauncher::new(), Arc::clone(&fs));

    // Ctrl-C → cancel; the poll loop notices within one poll interval.
    {
        let cancel = coordinator.cancel_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl-C received; cancelling run");
            cancel.cancel();
        });
    }

    let mut harvester = MoveHarvester::new(destination, fs);
    let result = coordinator.start(spec, &mut harvester).await?;

    print_summary(&result);
    Ok(result)
}

fn print_dry_run(tool: &str, spec: &RunSpec, destination: &std::path::Path) {
    println!("stagerun dry-run");
    println!("  tool: {tool}");
    println!("  command: {}", spec.command);
    println!("  staging: {}", spec.working_dir.display());
    println!("  destination: {}", destination.display());
    println!("  mode: {:?}", spec.mode);
    println!("  per_item_timeout: {:?}", spec.per_item_timeout);
    println!("  poll_interval: {:?}", spec.poll_interval);
    println!("  expected artifacts ({}):", spec.expected.len());
    for (idx, matcher) in spec.expected.iter().enumerate() {
        println!("    [{idx}] {matcher:?}");
    }
    if let Some(preflight) = &spec.preflight {
        println!("  preflight allowlist: {:?}", preflight.allowlist);
    }
}

fn print_summary(result: &RunResult) {
    match result.outcome {
        RunOutcome::Satisfied => println!("run satisfied"),
        RunOutcome::TimedOut => println!("run timed out; harvested what appeared"),
        RunOutcome::Cancelled => println!("run cancelled; harvested what appeared"),
        RunOutcome::ProcessFailed(code) => println!("tool failed with exit code {code}"),
        RunOutcome::LaunchFailed => {
            println!(
                "tool could not be launched: {}",
                result.launch_error.as_deref().unwrap_or("unknown error")
            )
        }
    }

    for harvested in &result.artifacts {
        match &harvested.harvest_error {
            None => println!(
                "  harvested [{}] {}",
                harvested.artifact.matcher_index,
                harvested.artifact.path.display()
            ),
            Some(err) => println!(
                "  harvest FAILED [{}] {}: {err}",
                harvested.artifact.matcher_index,
                harvested.artifact.path.display()
            ),
        }
    }

    for idx in &result.timed_out_matchers {
        println!("  never appeared: matcher [{idx}]");
    }
}
