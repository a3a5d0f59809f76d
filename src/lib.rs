//! # llm-qa-validator
//!
//! Sends application code to a locally running LLM for QA validation and
//! turns the model's report into generated artifacts.
//!
//! ## Features
//!
//! - Collects code from a single file, a directory tree or a YAML manifest
//! - Renders a fixed prompt template around the collected code
//! - Runs the model through a pluggable [`Generator`] (`ollama` by default)
//! - Stores every answer as a new timestamped report
//! - Splits the latest report by marker and fans the sections out per module
//!
//! ## Quick Start
//!
//! ```no_run
//! use llm_qa_validator::{Config, GenerationPipeline, OllamaCli, SourceSpec, ValidationPipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder().model("llama3").build()?;
//!
//! ValidationPipeline::new(config.clone())?
//!     .run(&SourceSpec::File("app.py".into()), &OllamaCli::default())?;
//!
//! GenerationPipeline::new(config)?.run()?.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Collector**: reads the selected source files
//! 2. **Reporter**: renders the prompt, calls the model, persists the report
//! 3. **Splitter**: extracts the marker-delimited sections of a report
//! 4. **Fanout**: writes each section next to every module of every app

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod collector;
mod config;
mod error;
mod fanout;
mod file;
mod filter;
mod generator;
mod pipeline;
mod report;
mod splitter;
mod template;
mod token;

pub use collector::{CodeBundle, SourceSpec};
pub use config::{Config, ConfigBuilder, DEFAULT_MODEL};
pub use error::{Error, Result};
pub use fanout::{FanoutSummary, SectionSummary};
pub use file::{SourceFile, extract_app_name};
pub use filter::SourceFilterConfig;
pub use generator::{Generator, OllamaCli};
pub use pipeline::{GenerationPipeline, ValidationPipeline, ValidationStats};
pub use report::{
    REPORT_PREFIX, find_latest_report, is_report_file_name, report_file_name, write_report,
};
pub use splitter::{
    DRIFT_MARKER, PROMPTS_MARKER, ReportSections, SectionKind, SectionStatus, TESTS_MARKER,
    split_report,
};
pub use token::estimate_token_count;

/// Runs one validation with the given configuration and generator.
///
/// # Errors
///
/// Returns an error if collection, generation or persisting the report fails.
pub fn validate<G: Generator>(
    config: Config,
    source: &SourceSpec,
    generator: &G,
) -> Result<ValidationStats> {
    ValidationPipeline::new(config)?.run(source, generator)
}

/// Fans the latest report out into the generated artifact tree.
///
/// # Errors
///
/// Returns an error if no report exists or artifacts cannot be written.
pub fn generate(config: Config) -> Result<FanoutSummary> {
    GenerationPipeline::new(config)?.run()
}
