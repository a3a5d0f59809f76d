//! Persisted validation reports.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info, warn};

/// File name prefix shared by every report.
pub const REPORT_PREFIX: &str = "validation_report_";

const REPORT_EXTENSION: &str = "md";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Builds `validation_report_<model>_<YYYYMMDD_HHMMSS>.md`.
///
/// Characters that cannot appear in a file name (`/`, `\`, `:`) are
/// replaced with `-`, so `llama3:8b` becomes `llama3-8b`.
#[must_use]
pub fn report_file_name(model: &str, at: &DateTime<Local>) -> String {
    format!(
        "{REPORT_PREFIX}{}_{}.{REPORT_EXTENSION}",
        sanitize_model(model),
        at.format(TIMESTAMP_FORMAT)
    )
}

fn sanitize_model(model: &str) -> String {
    model
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect()
}

/// Returns true if `name` follows the report naming pattern.
#[must_use]
pub fn is_report_file_name(name: &str) -> bool {
    name.starts_with(REPORT_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == REPORT_EXTENSION)
}

/// Writes `content` as a new report in `results_dir`.
///
/// The directory is created if needed. An existing report is never
/// replaced: when the timestamped name is taken, `_2`, `_3`, … is appended
/// to the stem.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_report(
    results_dir: &Path,
    model: &str,
    at: &DateTime<Local>,
    content: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(results_dir).map_err(|e| Error::io(results_dir, e))?;

    let base = report_file_name(model, at);
    let stem = base.trim_end_matches(&format!(".{REPORT_EXTENSION}")).to_string();

    let mut attempt = 1;
    loop {
        let name = if attempt == 1 {
            base.clone()
        } else {
            format!("{stem}_{attempt}.{REPORT_EXTENSION}")
        };
        let path = results_dir.join(name);

        match reserve(&path) {
            Ok(()) => {
                if let Err(e) = write_file_atomic(&path, content) {
                    if let Err(cleanup) = fs::remove_file(&path) {
                        warn!("Failed to remove {}: {}", path.display(), cleanup);
                    }
                    return Err(e);
                }
                info!("Validation report saved to {}", path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next suffix", path.display());
                attempt += 1;
            }
            Err(e) => return Err(Error::io(&path, e)),
        }
    }
}

fn reserve(path: &Path) -> std::io::Result<()> {
    OpenOptions::new().write(true).create_new(true).open(path).map(drop)
}

/// Writes a file through a temporary sibling and a rename.
pub(crate) fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    let written = temp_file
        .write_all(content.as_bytes())
        .and_then(|()| temp_file.sync_all());
    drop(temp_file);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(path, e));
    }

    Ok(())
}

/// Finds the most recently modified report in `results_dir`.
///
/// # Errors
///
/// Returns [`Error::NoReport`] if the directory is missing or holds no
/// report, and an IO error if it cannot be listed.
pub fn find_latest_report(results_dir: &Path) -> Result<PathBuf> {
    if !results_dir.is_dir() {
        return Err(Error::no_report(results_dir));
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(results_dir).map_err(|e| Error::io(results_dir, e))? {
        let entry = entry.map_err(|e| Error::io(results_dir, e))?;
        let path = entry.path();

        let is_report = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_report_file_name);
        if !is_report {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| Error::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(|e| Error::io(&path, e))?;

        // Ties on mtime fall back to the name, whose timestamp sorts.
        let newer = latest
            .as_ref()
            .is_none_or(|(time, best)| (modified, &path) > (*time, best));
        if newer {
            latest = Some((modified, path));
        }
    }

    let (_, path) = latest.ok_or_else(|| Error::no_report(results_dir))?;
    debug!("Latest report: {}", path.display());
    Ok(path)
}
