use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use stagerun::errors::{Result, StagerunError};
use stagerun::exec::{CommandSpec, LaunchOutcome, ProcessLauncher};
use stagerun::types::RunMode;

/// What the fake should pretend the OS did.
#[derive(Debug, Clone, Copy)]
enum Behaviour {
    ExitWith(i32),
    Detach,
    FailToSpawn,
}

/// A fake launcher that never spawns a real process:
/// - records every command line it was asked to launch
/// - resolves according to a configured behaviour.
pub struct FakeLauncher {
    behaviour: Behaviour,
    launched: Arc<Mutex<Vec<String>>>,
}

impl FakeLauncher {
    /// Pretend the tool ran and exited with `code` (blocking mode).
    pub fn exits_with(code: i32) -> Self {
        Self::new(Behaviour::ExitWith(code))
    }

    /// Pretend the tool started and detached (poll mode).
    pub fn detaches() -> Self {
        Self::new(Behaviour::Detach)
    }

    /// Pretend the OS refused to start the tool.
    pub fn fails_to_spawn() -> Self {
        Self::new(Behaviour::FailToSpawn)
    }

    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded command lines.
    pub fn launched(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.launched)
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(
        &mut self,
        command: &CommandSpec,
        _working_dir: &Path,
        _mode: RunMode,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>> {
        let command_line = command.render();
        let behaviour = self.behaviour;
        let launched = Arc::clone(&self.launched);

        Box::pin(async move {
            launched.lock().unwrap().push(command_line.clone());
            match behaviour {
                Behaviour::ExitWith(code) => Ok(LaunchOutcome::Exited(code)),
                Behaviour::Detach => Ok(LaunchOutcome::Detached),
                Behaviour::FailToSpawn => Err(StagerunError::LaunchFailed {
                    command_line,
                    source: io::Error::new(io::ErrorKind::NotFound, "no such executable"),
                }),
            }
        })
    }
}
