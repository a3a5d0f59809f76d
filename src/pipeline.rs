use crate::{
    collector::{Collector, SourceSpec},
    config::Config,
    error::Result,
    fanout::{Fanout, FanoutSummary},
    file::read_text,
    generator::Generator,
    report::{find_latest_report, write_report},
    splitter::split_report,
    template::PromptRenderer,
    token::estimate_token_count,
};
use serde::Serialize;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{info, instrument, warn};

/// Statistics collected during a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationStats {
    /// Number of source files embedded in the prompt
    pub source_files: usize,

    /// Prompt size in bytes
    pub prompt_bytes: usize,

    /// Estimated prompt size in tokens
    pub estimated_tokens: usize,

    /// Model the prompt was sent to
    pub model: String,

    /// Report written, `None` in dry run mode
    pub report_path: Option<PathBuf>,

    /// Time spent collecting and rendering
    pub prepare_duration: Duration,

    /// Time spent waiting on the model
    pub generate_duration: Duration,

    /// Total execution time
    pub duration: Duration,
}

impl ValidationStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              Validation Execution Summary             ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ Source Files:         {:>8}                        ║", self.source_files);
        println!("║ Prompt Size:          {:>8} bytes                  ║", self.prompt_bytes);
        println!(
            "║ Estimated Tokens:     {:>8}                        ║",
            self.estimated_tokens
        );
        println!("║ Model:                {:>8}                        ║", self.model);
        println!("║                                                       ║");
        match &self.report_path {
            Some(path) => {
                println!("║ Report:                                               ║");
                println!("║   {}", path.display());
            }
            None => println!("║ ⚠ No report was written (dry run mode)               ║"),
        }
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Preparing:        {:>8.2}s                     ║",
            self.prepare_duration.as_secs_f64()
        );
        println!(
            "║   - Generating:       {:>8.2}s                     ║",
            self.generate_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Collects code, asks the model to validate it, and stores the report.
pub struct ValidationPipeline {
    config: Config,
    collector: Collector,
    renderer: PromptRenderer,
}

impl ValidationPipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The prompt layout cannot be compiled
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let collector = Collector::new(&config)?;
        let renderer = PromptRenderer::new()?;

        Ok(Self {
            config,
            collector,
            renderer,
        })
    }

    /// Runs one validation.
    ///
    /// # Process
    ///
    /// 1. **Collect**: reads the code selected by `source`
    /// 2. **Render**: embeds it after the prompt template
    /// 3. **Generate**: sends the prompt to `generator` and blocks for the answer
    /// 4. **Persist**: writes the answer verbatim as a new timestamped report
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails. A failing generator aborts the
    /// run without writing a report.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use llm_qa_validator::{Config, OllamaCli, SourceSpec, ValidationPipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder().model("llama3").build()?;
    /// let stats = ValidationPipeline::new(config)?
    ///     .run(&SourceSpec::Directory("./model_to_validate".into()), &OllamaCli::default())?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, generator), fields(model = %self.config.model))]
    pub fn run<G: Generator>(&self, source: &SourceSpec, generator: &G) -> Result<ValidationStats> {
        let start_time = Instant::now();

        info!("Stage 1/3: Collecting source code...");
        let instructions = read_text(&self.config.prompt_file)?;
        let bundle = self.collector.collect(source)?;
        let prompt = self.renderer.render(&instructions, &bundle)?;
        let prepare_duration = start_time.elapsed();

        let estimated_tokens = estimate_token_count(&prompt);
        info!("Estimated token size: ~{} tokens", estimated_tokens);

        let mut stats = ValidationStats {
            source_files: bundle.len(),
            prompt_bytes: prompt.len(),
            estimated_tokens,
            model: self.config.model.clone(),
            report_path: None,
            prepare_duration,
            generate_duration: Duration::ZERO,
            duration: Duration::ZERO,
        };

        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping model invocation");
            stats.duration = start_time.elapsed();
            return Ok(stats);
        }

        info!(
            "Stage 2/3: Sending prompt to model '{}'... This may take a moment",
            self.config.model
        );
        let generate_start = Instant::now();
        let output = generator.generate(&prompt, &self.config.model)?;
        stats.generate_duration = generate_start.elapsed();
        info!(
            "✓ Model responded in {:.2}s",
            stats.generate_duration.as_secs_f64()
        );

        info!("Stage 3/3: Writing report...");
        let path = write_report(
            &self.config.results_dir,
            &self.config.model,
            &chrono::Local::now(),
            &output,
        )?;

        stats.report_path = Some(path);
        stats.duration = start_time.elapsed();
        Ok(stats)
    }
}

/// Splits the latest report and writes its sections as artifacts.
pub struct GenerationPipeline {
    config: Config,
    fanout: Fanout,
}

impl GenerationPipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fanout = Fanout::new(&config)?;

        Ok(Self { config, fanout })
    }

    /// Fans the most recent report out into the generated tree.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoReport`] if no report exists, or an IO
    /// error if reading the report or writing artifacts fails.
    #[instrument(skip(self), fields(results_dir = %self.config.results_dir.display()))]
    pub fn run(&self) -> Result<FanoutSummary> {
        let report = find_latest_report(&self.config.results_dir)?;
        info!("Using report {}", report.display());

        let sections = split_report(&read_text(&report)?);
        let summary = self.fanout.run(&report, &sections)?;

        if !summary.any_generated() {
            warn!("Report {} contained no usable sections", report.display());
        }

        Ok(summary)
    }
}
