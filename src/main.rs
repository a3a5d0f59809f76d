use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use llm_qa_validator::{
    Config, DEFAULT_MODEL, GenerationPipeline, OllamaCli, SourceFilterConfig, SourceSpec,
    ValidationPipeline,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "llm-qa-validator",
    version,
    author,
    about = "Validate application code with a local LLM and generate QA artifacts",
    long_about = "Validate application code with a local LLM and generate QA artifacts.\n\n\
    The validate mode embeds source code into the QA prompt template, sends it to a \
    local model through ollama and stores the answer as a timestamped report. The \
    generate mode splits the latest report into generated tests, rewritten prompts \
    and a drift monitor, and writes them next to every module of every application.\n\n\
    USAGE EXAMPLES:\n  \
      # Validate a single file with the default model\n  \
      llm-qa-validator validate --file model_to_validate/sentiment_analysis/app.py\n\n  \
      # Validate a whole directory with another model\n  \
      llm-qa-validator validate --dir model_to_validate --model mistral\n\n  \
      # Validate the entry points listed in manifest.yaml\n  \
      llm-qa-validator validate --manifest\n\n  \
      # Fan the latest report out into generated/\n  \
      llm-qa-validator generate"
)]
struct Cli {
    /// Prompt template file
    #[arg(
        long,
        global = true,
        env = "QA_PROMPT_FILE",
        default_value = "prompts/qa_unified_prompt.txt",
        value_name = "FILE"
    )]
    prompt_file: PathBuf,

    /// Directory holding one subdirectory per application under validation
    #[arg(
        long,
        global = true,
        env = "QA_APPS_DIR",
        default_value = "model_to_validate",
        value_name = "PATH"
    )]
    apps_dir: PathBuf,

    /// Root of the generated artifact tree
    #[arg(
        long,
        global = true,
        env = "QA_GENERATED_DIR",
        default_value = "generated",
        value_name = "PATH"
    )]
    generated_dir: PathBuf,

    /// Directory receiving validation reports
    #[arg(
        long,
        global = true,
        env = "QA_RESULTS_DIR",
        default_value = "results",
        value_name = "PATH"
    )]
    results_dir: PathBuf,

    /// Manifest listing entry points (used with `validate --manifest`)
    #[arg(
        long,
        global = true,
        env = "QA_MANIFEST_FILE",
        default_value = "manifest.yaml",
        value_name = "FILE"
    )]
    manifest_file: PathBuf,

    /// Executable used to run the model
    #[arg(
        long,
        global = true,
        env = "QA_OLLAMA_BIN",
        default_value = "ollama",
        value_name = "PROGRAM"
    )]
    ollama_bin: String,

    /// Glob selecting source files (repeatable, default **/*.py)
    #[arg(long = "include", global = true, value_name = "GLOB")]
    include: Vec<String>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send source code to the model and save its report
    #[command(group(ArgGroup::new("source").multiple(false)))]
    Validate {
        /// Single file to validate
        #[arg(long, group = "source", value_name = "FILE")]
        file: Option<PathBuf>,

        /// Directory to validate
        #[arg(long, group = "source", value_name = "PATH")]
        dir: Option<PathBuf>,

        /// Validate the entry points listed in the manifest
        #[arg(long, group = "source")]
        manifest: bool,

        /// Name of the ollama model to use
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Collect and render the prompt without calling the model
        #[arg(long)]
        dry_run: bool,
    },

    /// Split the latest report into generated artifacts
    Generate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let mut source_filter = SourceFilterConfig::default();
    if !cli.include.is_empty() {
        source_filter = source_filter.include(cli.include);
    }

    let builder = Config::builder()
        .prompt_file(cli.prompt_file)
        .apps_dir(cli.apps_dir)
        .generated_dir(cli.generated_dir)
        .results_dir(cli.results_dir)
        .manifest_file(cli.manifest_file)
        .generator_program(cli.ollama_bin)
        .source_filter(source_filter);

    match cli.command {
        Command::Validate {
            file,
            dir,
            manifest,
            model,
            dry_run,
        } => {
            let config = builder
                .model(model)
                .dry_run(dry_run)
                .build()
                .context("Failed to build configuration")?;

            let source = SourceSpec::select(file, dir, manifest, &config.manifest_file)
                .context("No code to validate")?;
            let generator = OllamaCli::new(config.generator_program.clone());

            let stats = ValidationPipeline::new(config)
                .context("Failed to create validation pipeline")?
                .run(&source, &generator)
                .context("Validation failed")?;

            stats.print_summary();
        }
        Command::Generate => {
            let config = builder.build().context("Failed to build configuration")?;

            let summary = GenerationPipeline::new(config)
                .context("Failed to create generation pipeline")?
                .run()
                .context("Artifact generation failed")?;

            summary.print_summary();
        }
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("llm_qa_validator=info"),
        1 => EnvFilter::new("llm_qa_validator=debug"),
        _ => EnvFilter::new("llm_qa_validator=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}
