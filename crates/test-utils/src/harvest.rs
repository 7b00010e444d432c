use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use stagerun::run::{DiscoveredArtifact, Harvester};

/// Records every harvest call, optionally failing for chosen paths.
#[derive(Default)]
pub struct RecordingHarvester {
    calls: Arc<Mutex<Vec<DiscoveredArtifact>>>,
    fail_for: Vec<String>,
}

impl RecordingHarvester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the harvest of any artifact whose file name matches `name`.
    pub fn failing_for(mut self, name: &str) -> Self {
        self.fail_for.push(name.to_string());
        self
    }

    /// Shared handle to the recorded calls.
    pub fn calls(&self) -> Arc<Mutex<Vec<DiscoveredArtifact>>> {
        Arc::clone(&self.calls)
    }
}

impl Harvester for RecordingHarvester {
    fn harvest(&mut self, artifact: &DiscoveredArtifact) -> Result<()> {
        self.calls.lock().unwrap().push(artifact.clone());
        let name = artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_for.iter().any(|f| f == &name) {
            bail!("harvest of {name} rejected by test");
        }
        Ok(())
    }
}
