// src/exec/mod.rs

//! Process launch layer.
//!
//! This module is responsible for actually starting the external tool, using
//! `tokio::process::Command`, and reporting how the launch resolved.
//!
//! - [`launcher`] provides the `ProcessLauncher` trait and the concrete
//!   `TokioLauncher` used in production; tests replace it with a fake that
//!   never spawns real processes.

pub mod launcher;

pub use launcher::{CommandSpec, LaunchOutcome, ProcessLauncher, TokioLauncher};
