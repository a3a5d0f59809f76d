use crate::{
    config::Config,
    error::{Error, Result},
    file::{SourceFile, read_text},
    filter::SourceFilter,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Where the code under validation comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// One regular file
    File(PathBuf),
    /// Every matching file below a directory
    Directory(PathBuf),
    /// Entry points listed in a YAML manifest
    Manifest(PathBuf),
}

impl SourceSpec {
    /// Picks a source from command-line style selectors.
    ///
    /// A file wins over a directory, which wins over the manifest. The
    /// manifest only counts when `use_manifest` is set and the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSource`] when nothing usable was selected.
    pub fn select(
        file: Option<PathBuf>,
        dir: Option<PathBuf>,
        use_manifest: bool,
        manifest_file: &Path,
    ) -> Result<Self> {
        if let Some(file) = file {
            return Ok(Self::File(file));
        }

        if let Some(dir) = dir {
            return Ok(Self::Directory(dir));
        }

        if use_manifest && manifest_file.exists() {
            return Ok(Self::Manifest(manifest_file.to_path_buf()));
        }

        Err(Error::NoSource)
    }
}

/// Ordered code blocks gathered for one validation run.
#[derive(Debug, Clone, Default)]
pub struct CodeBundle {
    files: Vec<SourceFile>,
}

impl CodeBundle {
    /// File contents in collection order.
    #[must_use]
    pub fn contents(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.content.as_str()).collect()
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no code was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    entry_points: Vec<PathBuf>,
}

/// Reads code from a [`SourceSpec`].
pub(crate) struct Collector {
    filter: SourceFilter,
}

impl Collector {
    /// Creates a collector from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the source filter patterns are invalid.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            filter: SourceFilter::new(&config.source_filter)?,
        })
    }

    /// Collects the code blocks for `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A single-file source is not a regular file
    /// - A directory source is not a directory
    /// - The manifest is missing or malformed
    /// - Any selected file cannot be read as UTF-8
    pub(crate) fn collect(&self, spec: &SourceSpec) -> Result<CodeBundle> {
        let files = match spec {
            SourceSpec::File(path) => vec![Self::collect_file(path)?],
            SourceSpec::Directory(dir) => self.collect_directory(dir)?,
            SourceSpec::Manifest(manifest) => Self::collect_manifest(manifest)?,
        };

        if files.is_empty() {
            warn!("No source files collected from {:?}", spec);
        } else {
            info!("Collected {} source files", files.len());
        }

        Ok(CodeBundle { files })
    }

    fn collect_file(path: &Path) -> Result<SourceFile> {
        if !path.is_file() {
            return Err(Error::not_a_file(path));
        }

        SourceFile::read(path)
    }

    fn collect_directory(&self, dir: &Path) -> Result<Vec<SourceFile>> {
        if !dir.is_dir() {
            return Err(Error::config(format!(
                "Source directory does not exist: {}",
                dir.display()
            )));
        }

        debug!("Walking {}", dir.display());

        let walker = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && self.filter.is_excluded_dir(relative_to(entry.path(), dir)))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    warn!("Skipping symlink loop at {:?}", e.path());
                    continue;
                }
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    return Err(Error::io(path, e.into()));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_to(entry.path(), dir);
            if !self.filter.is_source(relative) {
                trace!("Skipping {}", relative.display());
                continue;
            }

            debug!("Reading {}", relative.display());
            files.push(SourceFile::read(entry.path())?);
        }

        Ok(files)
    }

    fn collect_manifest(manifest_path: &Path) -> Result<Vec<SourceFile>> {
        if !manifest_path.is_file() {
            return Err(Error::NoSource);
        }

        let text = read_text(manifest_path)?;
        let manifest: Manifest = if text.trim().is_empty() {
            Manifest::default()
        } else {
            serde_yaml::from_str(&text).map_err(|e| Error::manifest(manifest_path, &e))?
        };

        let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));
        debug!(
            "Manifest {} lists {} entry points",
            manifest_path.display(),
            manifest.entry_points.len()
        );

        manifest
            .entry_points
            .iter()
            .map(|entry| SourceFile::read(base.join(entry)))
            .collect()
    }
}

fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
