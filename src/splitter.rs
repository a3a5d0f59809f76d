//! Marker-based report splitting.
//!
//! A report carries up to three sections, each introduced by a literal
//! marker line. Extraction is purely positional: a section runs from the
//! end of its marker to the next occurrence of any marker, or to the end of
//! the text, and is trimmed.

use memchr::memmem;
use serde::Serialize;
use std::fmt;

/// Marker introducing generated tests.
pub const TESTS_MARKER: &str = "--- GENERATED_TESTS ---";
/// Marker introducing rewritten prompts.
pub const PROMPTS_MARKER: &str = "--- REWRITTEN_PROMPTS ---";
/// Marker introducing the drift monitor.
pub const DRIFT_MARKER: &str = "--- DRIFT_MONITOR ---";

const MARKERS: [&str; 3] = [TESTS_MARKER, PROMPTS_MARKER, DRIFT_MARKER];

/// One of the three report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Generated test code
    Tests,
    /// Rewritten prompts
    Prompts,
    /// Drift monitoring code
    Drift,
}

impl SectionKind {
    /// All sections in report order.
    pub const ALL: [Self; 3] = [Self::Tests, Self::Prompts, Self::Drift];

    /// Literal marker opening this section.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Tests => TESTS_MARKER,
            Self::Prompts => PROMPTS_MARKER,
            Self::Drift => DRIFT_MARKER,
        }
    }

    /// Artifact file written for this section.
    #[must_use]
    pub const fn artifact_name(self) -> &'static str {
        match self {
            Self::Tests => "missing_tests.py",
            Self::Prompts => "improved_prompts.json",
            Self::Drift => "drift_monitor.py",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tests => "Generated tests",
            Self::Prompts => "Rewritten prompts",
            Self::Drift => "Drift monitor",
        }
    }
}

/// Whether a section can be turned into an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    /// Marker present with non-empty content
    Generated,
    /// Marker present, nothing after trimming
    Empty,
    /// Marker absent
    Missing,
}

impl SectionStatus {
    /// Returns true if an artifact is written for this section.
    #[must_use]
    pub const fn is_generated(self) -> bool {
        matches!(self, Self::Generated)
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generated => "generated",
            Self::Empty => "empty",
            Self::Missing => "missing",
        })
    }
}

/// Sections extracted from one report.
///
/// `None` means the marker never appeared; `Some("")` means it appeared
/// with nothing after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSections {
    /// Text after [`TESTS_MARKER`]
    pub tests: Option<String>,
    /// Text after [`PROMPTS_MARKER`]
    pub prompts: Option<String>,
    /// Text after [`DRIFT_MARKER`]
    pub drift: Option<String>,
}

impl ReportSections {
    /// Content of `kind`, if its marker was present.
    #[must_use]
    pub fn get(&self, kind: SectionKind) -> Option<&str> {
        match kind {
            SectionKind::Tests => self.tests.as_deref(),
            SectionKind::Prompts => self.prompts.as_deref(),
            SectionKind::Drift => self.drift.as_deref(),
        }
    }

    /// Classification of `kind`.
    #[must_use]
    pub fn status(&self, kind: SectionKind) -> SectionStatus {
        match self.get(kind) {
            None => SectionStatus::Missing,
            Some("") => SectionStatus::Empty,
            Some(_) => SectionStatus::Generated,
        }
    }

    /// Sections that produce artifacts, in report order.
    pub fn generated(&self) -> impl Iterator<Item = (SectionKind, &str)> + '_ {
        SectionKind::ALL.into_iter().filter_map(|kind| {
            self.get(kind)
                .filter(|content| !content.is_empty())
                .map(|content| (kind, content))
        })
    }
}

/// Splits report text into its three sections.
#[must_use]
pub fn split_report(report: &str) -> ReportSections {
    ReportSections {
        tests: extract(report, TESTS_MARKER),
        prompts: extract(report, PROMPTS_MARKER),
        drift: extract(report, DRIFT_MARKER),
    }
}

fn extract(report: &str, marker: &str) -> Option<String> {
    let bytes = report.as_bytes();
    let start = memmem::find(bytes, marker.as_bytes())? + marker.len();
    let rest = &report[start..];

    let end = MARKERS
        .iter()
        .filter_map(|m| memmem::find(rest.as_bytes(), m.as_bytes()))
        .min()
        .unwrap_or(rest.len());

    Some(rest[..end].trim().to_string())
}
