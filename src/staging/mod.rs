// src/staging/mod.rs

//! Staging directory inspection.
//!
//! The staging directory is the file-exchange point between the caller (who
//! exports source files into it) and the external tool (which writes output
//! artifacts into it). This module is strictly read-only:
//!
//! - [`StagingArea::check_empty`] is the pre-flight guard against leftover
//!   files from a previous run.
//! - [`StagingArea::list_matching`] is the single-pass scan used by the poll
//!   loop to find expected artifacts.

pub mod matcher;

pub use matcher::{ArtifactMatcher, RawMatcherSpec};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, StagerunError};
use crate::fs::FileSystem;

/// Result of a pre-flight emptiness check.
#[derive(Debug, Clone)]
pub struct PreflightReport {
    /// Directory entries that are neither hidden nor allowlisted.
    pub unexpected: Vec<String>,
}

impl PreflightReport {
    pub fn is_clear(&self) -> bool {
        self.unexpected.is_empty()
    }
}

/// Read-only view over one staging directory.
///
/// One run owns one staging area; sharing a directory across concurrent runs
/// is not supported and is caught (best-effort) by the pre-flight check.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            dir: dir.into(),
            fs,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check that the staging directory contains nothing but hidden entries
    /// and allowlisted names (e.g. a control file the tool needs).
    ///
    /// An unreadable directory is [`StagerunError::DirectoryUnavailable`],
    /// fatal to the run.
    pub fn check_empty(&self, allowlist: &[String]) -> Result<PreflightReport> {
        let entries = self.read_entries()?;
        let mut unexpected = Vec::new();

        for path in entries {
            let Some(name) = file_name_of(&path) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if allowlist.iter().any(|allowed| allowed == &name) {
                continue;
            }
            unexpected.push(name);
        }

        unexpected.sort();
        Ok(PreflightReport { unexpected })
    }

    /// True if the given entry name is present in the staging directory.
    /// Used by the poll loop to spot the abort sentinel.
    pub fn contains(&self, name: &str) -> bool {
        self.fs.exists(&self.dir.join(name))
    }

    /// Single pass over the directory, matching entries against every
    /// still-unsatisfied matcher. First match wins; a file satisfies at most
    /// one matcher per pass. Files below a matcher's minimum size are
    /// treated as not yet written and skipped.
    ///
    /// Returns newly matched `(matcher_index, path)` pairs.
    pub fn list_matching(
        &self,
        matchers: &[ArtifactMatcher],
        satisfied: &HashSet<usize>,
    ) -> Result<Vec<(usize, PathBuf)>> {
        let entries = self.read_entries()?;
        let mut found: Vec<(usize, PathBuf)> = Vec::new();
        let mut claimed: HashSet<usize> = satisfied.clone();

        for path in entries {
            if !self.fs.is_file(&path) {
                continue;
            }
            let Some(name) = file_name_of(&path) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            for (idx, matcher) in matchers.iter().enumerate() {
                if claimed.contains(&idx) {
                    continue;
                }
                if !matcher.matches_name(&name) {
                    continue;
                }
                let len = self.fs.file_len(&path).unwrap_or(0);
                if len < matcher.min_size() {
                    debug!(path = ?path, len, "artifact below minimum size; not yet written");
                    break;
                }
                claimed.insert(idx);
                found.push((idx, path.clone()));
                break;
            }
        }

        Ok(found)
    }

    fn read_entries(&self) -> Result<Vec<PathBuf>> {
        if !self.fs.is_dir(&self.dir) {
            return Err(StagerunError::DirectoryUnavailable {
                dir: self.dir.clone(),
                reason: "not a directory".to_string(),
            });
        }
        self.fs
            .read_dir(&self.dir)
            .map_err(|e| StagerunError::DirectoryUnavailable {
                dir: self.dir.clone(),
                reason: e.to_string(),
            })
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
