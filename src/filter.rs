//! Source file selection.
//!
//! Decides which files inside a directory tree count as source code, both
//! when collecting a directory for validation and when fanning a report
//! out over the applications under validation.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

const DEFAULT_INCLUDE: &[&str] = &["**/*.py"];
const DEFAULT_EXCLUDE_DIRS: &[&str] = &["**/__pycache__", "**/.git", "**/.venv", "**/venv"];

/// Glob configuration for selecting source files.
#[derive(Debug, Clone)]
pub struct SourceFilterConfig {
    include: Vec<String>,
    exclude_directories: Vec<String>,
}

impl Default for SourceFilterConfig {
    fn default() -> Self {
        Self {
            include: DEFAULT_INCLUDE.iter().map(ToString::to_string).collect(),
            exclude_directories: DEFAULT_EXCLUDE_DIRS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl SourceFilterConfig {
    /// Creates the default configuration (Python sources).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the include patterns.
    #[must_use]
    pub fn include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }
}

/// Compiled form of [`SourceFilterConfig`].
#[derive(Debug, Clone)]
pub(crate) struct SourceFilter {
    include: GlobSet,
    exclude_directories: GlobSet,
}

impl SourceFilter {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid glob or an empty
    /// include list.
    pub(crate) fn new(config: &SourceFilterConfig) -> Result<Self> {
        if config.include.is_empty() {
            return Err(Error::config("at least one include pattern is required"));
        }

        Ok(Self {
            include: Self::build_globset(&config.include)?,
            exclude_directories: Self::build_globset(&config.exclude_directories)?,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                Error::config(format!("Invalid glob pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
    }

    /// Returns true if `relative` (a path below the walk root) is a source file.
    pub(crate) fn is_source(&self, relative: &Path) -> bool {
        if !self.include.is_match(relative) {
            return false;
        }

        !relative
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .any(|a| self.exclude_directories.is_match(a))
    }

    /// Returns true if a directory should not be descended into.
    pub(crate) fn is_excluded_dir(&self, relative: &Path) -> bool {
        !relative.as_os_str().is_empty() && self.exclude_directories.is_match(relative)
    }
}
