// src/staging/matcher.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use serde::Deserialize;

/// Raw matcher specification as it appears in the TOML config.
///
/// Exactly one of `name`, `suffix`, `glob` must be set:
///
/// ```toml
/// expect = [
///     { name = "panorama.tif" },
///     { suffix = [".tif", ".tiff"] },
///     { glob = "stack-*.dng", min_size = 1024 },
/// ]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMatcherSpec {
    pub name: Option<String>,
    pub suffix: Option<Vec<String>>,
    pub glob: Option<String>,
    pub min_size: Option<u64>,
}

#[derive(Debug, Clone)]
enum MatchRule {
    Exact(String),
    /// Case-insensitive suffix membership, suffixes stored lowercased.
    Suffixes(Vec<String>),
    Glob(GlobMatcher),
}

/// Compiled predicate identifying one expected output artifact.
///
/// Stateless and reusable across polls. A zero-byte (or below `min_size`)
/// file is treated as "not yet written" so that a tool still streaming its
/// output is not harvested early.
#[derive(Clone)]
pub struct ArtifactMatcher {
    rule: MatchRule,
    min_size: u64,
}

impl fmt::Debug for ArtifactMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ArtifactMatcher");
        match &self.rule {
            MatchRule::Exact(name) => d.field("name", name),
            MatchRule::Suffixes(suffixes) => d.field("suffixes", suffixes),
            MatchRule::Glob(g) => d.field("glob", &g.glob().glob()),
        };
        d.field("min_size", &self.min_size).finish()
    }
}

impl ArtifactMatcher {
    /// Match a file by its exact name.
    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            rule: MatchRule::Exact(name.into()),
            min_size: 1,
        }
    }

    /// Match a file whose name ends with any of the given suffixes
    /// (case-insensitive).
    pub fn suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rule: MatchRule::Suffixes(
                suffixes.into_iter().map(|s| s.into().to_lowercase()).collect(),
            ),
            min_size: 1,
        }
    }

    /// Match a file name against a glob pattern.
    pub fn glob(pattern: &str) -> Result<Self> {
        let matcher = Glob::new(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();
        Ok(Self {
            rule: MatchRule::Glob(matcher),
            min_size: 1,
        })
    }

    /// Override the minimum size (bytes) below which a file does not count
    /// as written. Defaults to 1.
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn min_size(&self) -> u64 {
        self.min_size
    }

    /// Test a bare file name (not a path) against this matcher.
    pub fn matches_name(&self, file_name: &str) -> bool {
        match &self.rule {
            MatchRule::Exact(name) => file_name == name,
            MatchRule::Suffixes(suffixes) => {
                let lower = file_name.to_lowercase();
                suffixes.iter().any(|s| lower.ends_with(s.as_str()))
            }
            MatchRule::Glob(glob) => glob.is_match(file_name),
        }
    }

    /// Build a compiled matcher from its raw config representation.
    pub fn from_raw(raw: &RawMatcherSpec) -> Result<Self> {
        let base = match (&raw.name, &raw.suffix, &raw.glob) {
            (Some(name), None, None) => Self::exact(name.clone()),
            (None, Some(suffixes), None) => {
                anyhow::ensure!(
                    !suffixes.is_empty(),
                    "matcher `suffix` list must not be empty"
                );
                Self::suffixes(suffixes.clone())
            }
            (None, None, Some(pattern)) => Self::glob(pattern)?,
            _ => anyhow::bail!(
                "matcher must set exactly one of `name`, `suffix`, `glob` (got {raw:?})"
            ),
        };
        Ok(match raw.min_size {
            Some(min) => base.with_min_size(min),
            None => base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_only_that_name() {
        let m = ArtifactMatcher::exact("panorama.tif");
        assert!(m.matches_name("panorama.tif"));
        assert!(!m.matches_name("panorama.tiff"));
    }

    #[test]
    fn suffix_is_case_insensitive() {
        let m = ArtifactMatcher::suffixes([".tif", ".tiff"]);
        assert!(m.matches_name("out-a.TIF"));
        assert!(m.matches_name("out-b.tiff"));
        assert!(!m.matches_name("out.jpg"));
    }

    #[test]
    fn glob_matches_pattern() {
        let m = ArtifactMatcher::glob("stack-*.dng").unwrap();
        assert!(m.matches_name("stack-001.dng"));
        assert!(!m.matches_name("pano-001.dng"));
    }

    #[test]
    fn from_raw_rejects_ambiguous_spec() {
        let raw = RawMatcherSpec {
            name: Some("a".into()),
            glob: Some("*".into()),
            ..Default::default()
        };
        assert!(ArtifactMatcher::from_raw(&raw).is_err());
    }

    #[test]
    fn from_raw_applies_min_size() {
        let raw = RawMatcherSpec {
            suffix: Some(vec![".tif".into()]),
            min_size: Some(1024),
            ..Default::default()
        };
        let m = ArtifactMatcher::from_raw(&raw).unwrap();
        assert_eq!(m.min_size(), 1024);
    }
}
