use crate::{
    config::Config,
    error::{Error, Result},
    filter::SourceFilter,
    report::write_file_atomic,
    splitter::{ReportSections, SectionKind, SectionStatus},
};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

const SUMMARY_FILE: &str = "summary.json";

/// Status of one section after a fanout run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    /// Which section
    pub section: SectionKind,
    /// Classification
    pub status: SectionStatus,
    /// Artifact file name used for the section
    pub artifact: &'static str,
}

/// Outcome of fanning one report out over the applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanoutSummary {
    /// Report the sections came from
    pub report: String,

    /// Per-section status, in report order
    pub sections: Vec<SectionSummary>,

    /// Number of application directories visited
    pub apps: usize,

    /// Output directories, relative to the generated root
    pub modules: Vec<String>,

    /// Number of artifact files written
    pub artifacts_written: usize,
}

impl FanoutSummary {
    /// Returns true if at least one section produced artifacts.
    #[must_use]
    pub fn any_generated(&self) -> bool {
        self.sections.iter().any(|s| s.status.is_generated())
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              Artifact Generation Summary              ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        for section in &self.sections {
            let mark = match section.status {
                SectionStatus::Generated => "✓",
                SectionStatus::Empty | SectionStatus::Missing => "✗",
            };
            println!(
                "║ {} {:<20} {:>10}                     ║",
                mark,
                section.section.label(),
                section.status
            );
        }
        println!("║                                                       ║");
        println!("║ Applications:         {:>8}                        ║", self.apps);
        println!("║ Modules:              {:>8}                        ║", self.modules.len());
        println!(
            "║ Artifacts Written:    {:>8}                        ║",
            self.artifacts_written
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Writes report sections into the per-application artifact tree.
pub(crate) struct Fanout {
    apps_dir: PathBuf,
    generated_dir: PathBuf,
    filter: SourceFilter,
}

impl Fanout {
    /// Creates a fanout from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the source filter patterns are invalid.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            apps_dir: config.apps_dir.clone(),
            generated_dir: config.generated_dir.clone(),
            filter: SourceFilter::new(&config.source_filter)?,
        })
    }

    /// Writes every generated section for every source file of every app.
    ///
    /// Existing artifacts are overwritten. Sections that are empty or
    /// missing are not written.
    ///
    /// # Errors
    ///
    /// Returns an error if the apps tree cannot be read or an artifact
    /// cannot be written.
    pub(crate) fn run(&self, report: &Path, sections: &ReportSections) -> Result<FanoutSummary> {
        let section_summaries: Vec<SectionSummary> = SectionKind::ALL
            .into_iter()
            .map(|kind| SectionSummary {
                section: kind,
                status: sections.status(kind),
                artifact: kind.artifact_name(),
            })
            .collect();

        fs::create_dir_all(&self.generated_dir).map_err(|e| Error::io(&self.generated_dir, e))?;
        let generated_root =
            fs::canonicalize(&self.generated_dir).map_err(|e| Error::io(&self.generated_dir, e))?;

        let apps = self.app_dirs(&generated_root)?;
        let mut modules = Vec::new();
        let mut artifacts_written = 0;

        for app in &apps {
            let app_name = app
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("Fanning out application {}", app_name);

            for source in self.source_files(app, &generated_root)? {
                let module_dir = self.module_dir(&app_name, app, &source);
                fs::create_dir_all(&module_dir).map_err(|e| Error::io(&module_dir, e))?;

                for (kind, content) in sections.generated() {
                    let path = module_dir.join(kind.artifact_name());
                    write_file_atomic(&path, content)?;
                    trace!("Wrote {}", path.display());
                    artifacts_written += 1;
                }

                let relative = pathdiff::diff_paths(&module_dir, &self.generated_dir)
                    .unwrap_or_else(|| module_dir.clone());
                modules.push(relative.to_string_lossy().into_owned());
            }
        }

        let summary = FanoutSummary {
            report: report.display().to_string(),
            sections: section_summaries,
            apps: apps.len(),
            modules,
            artifacts_written,
        };

        self.write_summary(&summary)?;

        info!(
            "Wrote {} artifacts for {} modules in {} applications",
            summary.artifacts_written,
            summary.modules.len(),
            summary.apps
        );
        Ok(summary)
    }

    /// Top-level application directories, sorted by name.
    ///
    /// The generated root is never an application, even when it lives
    /// inside the apps tree.
    fn app_dirs(&self, generated_root: &Path) -> Result<Vec<PathBuf>> {
        if !self.apps_dir.is_dir() {
            warn!("Applications directory {} does not exist", self.apps_dir.display());
            return Ok(Vec::new());
        }

        let mut apps = Vec::new();
        for entry in fs::read_dir(&self.apps_dir).map_err(|e| Error::io(&self.apps_dir, e))? {
            let entry = entry.map_err(|e| Error::io(&self.apps_dir, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if self.filter.is_excluded_dir(Path::new(&entry.file_name()))
                || is_same_dir(&path, generated_root)
            {
                trace!("Skipping excluded directory {}", path.display());
                continue;
            }
            apps.push(path);
        }

        apps.sort();
        Ok(apps)
    }

    /// Source files below one application, in file name order.
    fn source_files(&self, app: &Path, generated_root: &Path) -> Result<Vec<PathBuf>> {
        let walker = WalkDir::new(app)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && (self
                        .filter
                        .is_excluded_dir(entry.path().strip_prefix(app).unwrap_or(entry.path()))
                        || is_same_dir(entry.path(), generated_root)))
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
                    let path = e.path().unwrap_or(app).to_path_buf();
                    return Err(Error::io(path, e.into()));
                }
            };

            if entry.file_type().is_file()
                && self
                    .filter
                    .is_source(entry.path().strip_prefix(app).unwrap_or(entry.path()))
            {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// `generated/<app>/<relative parent>/<file stem>`
    fn module_dir(&self, app_name: &str, app: &Path, source: &Path) -> PathBuf {
        let relative = pathdiff::diff_paths(source, app).unwrap_or_else(|| source.to_path_buf());
        let mut dir = self.generated_dir.join(app_name);

        if let Some(parent) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
            dir.push(parent);
        }
        if let Some(stem) = relative.file_stem() {
            dir.push(stem);
        }

        dir
    }

    fn write_summary(&self, summary: &FanoutSummary) -> Result<()> {
        let path = self.generated_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary)?;
        write_file_atomic(&path, &json)?;

        debug!("Wrote summary to {}", path.display());
        Ok(())
    }
}

fn is_same_dir(path: &Path, canonical: &Path) -> bool {
    fs::canonicalize(path).is_ok_and(|p| p == canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::split_report;
    use assert_fs::prelude::*;

    const REPORT: &str = "--- GENERATED_TESTS ---\ndef test_x(): pass\n\
--- REWRITTEN_PROMPTS ---\n{\"p\": 1}\n\
--- DRIFT_MONITOR ---\nmonitor()\n";

    fn fanout(temp: &assert_fs::TempDir) -> Fanout {
        let config = Config::builder()
            .apps_dir(temp.path().join("apps"))
            .generated_dir(temp.path().join("generated"))
            .build()
            .unwrap();
        Fanout::new(&config).unwrap()
    }

    fn setup_apps(temp: &assert_fs::TempDir) {
        temp.child("apps/sentiment/app.py").write_str("x").unwrap();
        temp.child("apps/summarizer/core/llm.py").write_str("y").unwrap();
        temp.child("apps/summarizer/README.md").write_str("docs").unwrap();
        temp.child("apps/summarizer/__pycache__/llm.py").write_str("z").unwrap();
        temp.child("apps/loose.py").write_str("not an app").unwrap();
    }

    #[test]
    fn test_mirrors_apps_tree() {
        let temp = assert_fs::TempDir::new().unwrap();
        setup_apps(&temp);

        let summary = fanout(&temp)
            .run(Path::new("report.md"), &split_report(REPORT))
            .unwrap();

        assert_eq!(summary.apps, 2);
        assert_eq!(summary.modules.len(), 2);
        assert_eq!(summary.artifacts_written, 6);

        temp.child("generated/sentiment/app/missing_tests.py")
            .assert("def test_x(): pass");
        temp.child("generated/sentiment/app/improved_prompts.json")
            .assert("{\"p\": 1}");
        temp.child("generated/summarizer/core/llm/drift_monitor.py")
            .assert("monitor()");
        assert!(!temp.child("generated/summarizer/__pycache__").exists());
        assert!(!temp.child("generated/summarizer/README").exists());
        assert!(temp.child("generated/summary.json").exists());
    }

    #[test]
    fn test_idempotent() {
        let temp = assert_fs::TempDir::new().unwrap();
        setup_apps(&temp);
        let fanout = fanout(&temp);
        let sections = split_report(REPORT);

        let first = fanout.run(Path::new("report.md"), &sections).unwrap();
        let tests_path = temp.child("generated/sentiment/app/missing_tests.py");
        let summary_path = temp.child("generated/summary.json");
        let tests_before = fs::read_to_string(tests_path.path()).unwrap();
        let summary_before = fs::read_to_string(summary_path.path()).unwrap();

        let second = fanout.run(Path::new("report.md"), &sections).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(tests_path.path()).unwrap(), tests_before);
        assert_eq!(fs::read_to_string(summary_path.path()).unwrap(), summary_before);
        assert_eq!(
            fs::read_dir(temp.child("generated/sentiment/app").path())
                .unwrap()
                .count(),
            3
        );
    }

    #[test]
    fn test_missing_and_empty_sections_not_written() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("apps/demo/main.py").write_str("x").unwrap();

        let sections = split_report("--- GENERATED_TESTS ---\n\n--- DRIFT_MONITOR ---\nwatch()");
        let summary = fanout(&temp).run(Path::new("r.md"), &sections).unwrap();

        let statuses: Vec<_> = summary.sections.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![SectionStatus::Empty, SectionStatus::Missing, SectionStatus::Generated]
        );
        assert_eq!(summary.artifacts_written, 1);

        let module = temp.child("generated/demo/main");
        assert!(module.exists());
        assert!(!module.child("missing_tests.py").exists());
        assert!(!module.child("improved_prompts.json").exists());
        module.child("drift_monitor.py").assert("watch()");
    }

    #[test]
    fn test_generated_dir_inside_apps_is_skipped() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("apps/demo/main.py").write_str("x").unwrap();
        let config = Config::builder()
            .apps_dir(temp.path().join("apps"))
            .generated_dir(temp.path().join("apps/generated"))
            .build()
            .unwrap();
        let fanout = Fanout::new(&config).unwrap();
        let sections = split_report(REPORT);

        let first = fanout.run(Path::new("r.md"), &sections).unwrap();
        let second = fanout.run(Path::new("r.md"), &sections).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.apps, 1);
        assert_eq!(second.modules, vec!["demo/main".to_string()]);
        assert_eq!(second.artifacts_written, 3);
        temp.child("apps/generated/demo/main/missing_tests.py")
            .assert("def test_x(): pass");
        assert!(!temp.child("apps/generated/generated").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinked_sources() {
        let temp = assert_fs::TempDir::new().unwrap();
        let shared = temp.child("shared/util.py");
        shared.write_str("shared").unwrap();
        temp.child("apps/demo/main.py").write_str("x").unwrap();
        temp.child("apps/demo/linked.py").symlink_to_file(shared.path()).unwrap();

        let summary = fanout(&temp)
            .run(Path::new("r.md"), &split_report(REPORT))
            .unwrap();

        assert_eq!(
            summary.modules,
            vec!["demo/linked".to_string(), "demo/main".to_string()]
        );
        temp.child("generated/demo/linked/drift_monitor.py")
            .assert("monitor()");
    }

    #[test]
    fn test_missing_apps_dir() {
        let temp = assert_fs::TempDir::new().unwrap();

        let summary = fanout(&temp)
            .run(Path::new("r.md"), &split_report(REPORT))
            .unwrap();

        assert_eq!(summary.apps, 0);
        assert_eq!(summary.artifacts_written, 0);
        assert!(summary.any_generated());
    }
}
