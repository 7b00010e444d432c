// src/run/harvest.rs

//! The harvest seam.
//!
//! Everything host-application-specific (move to destination, metadata/tag
//! copy, grouping) lives behind [`Harvester`]; the coordinator calls it once
//! per discovered artifact, in matcher order, and isolates per-artifact
//! failures. [`MoveHarvester`] is the implementation the CLI ships: move the
//! artifact into a destination directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use super::spec::DiscoveredArtifact;
use crate::fs::FileSystem;

/// Caller-supplied finalize step for one artifact.
///
/// Implementations must return errors rather than panic; a failure is
/// recorded against that artifact only and the remaining harvests proceed.
pub trait Harvester {
    fn harvest(&mut self, artifact: &DiscoveredArtifact) -> Result<()>;
}

impl<F> Harvester for F
where
    F: FnMut(&DiscoveredArtifact) -> Result<()>,
{
    fn harvest(&mut self, artifact: &DiscoveredArtifact) -> Result<()> {
        self(artifact)
    }
}

/// Moves harvested artifacts into a destination directory, keeping the
/// original file name. Refuses to overwrite an existing destination file.
#[derive(Debug, Clone)]
pub struct MoveHarvester {
    destination: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl MoveHarvester {
    pub fn new(destination: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            destination: destination.into(),
            fs,
        }
    }
}

impl Harvester for MoveHarvester {
    fn harvest(&mut self, artifact: &DiscoveredArtifact) -> Result<()> {
        let Some(name) = artifact.path.file_name() else {
            bail!("artifact path {:?} has no file name", artifact.path);
        };
        let dest = self.destination.join(name);
        if self.fs.exists(&dest) {
            bail!("destination {:?} already exists; refusing to overwrite", dest);
        }
        self.fs.move_file(&artifact.path, &dest)?;
        info!(from = ?artifact.path, to = ?dest, "harvested artifact");
        Ok(())
    }
}
