use crate::error::{Error, Result};
use crate::filter::{SourceFilter, SourceFilterConfig};
use std::path::PathBuf;

const DEFAULT_PROMPT_FILE: &str = "prompts/qa_unified_prompt.txt";
const DEFAULT_APPS_DIR: &str = "model_to_validate";
const DEFAULT_GENERATED_DIR: &str = "generated";
const DEFAULT_RESULTS_DIR: &str = "results";
const DEFAULT_MANIFEST_FILE: &str = "manifest.yaml";
const DEFAULT_GENERATOR_PROGRAM: &str = "ollama";

/// Model used when none is given on the command line.
pub const DEFAULT_MODEL: &str = "llama3";

/// Configuration shared by the validate and generate modes.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Text file holding the validation instructions
    pub prompt_file: PathBuf,

    /// Root holding one directory per application under validation
    pub apps_dir: PathBuf,

    /// Root of the generated artifact tree
    pub generated_dir: PathBuf,

    /// Directory receiving validation reports
    pub results_dir: PathBuf,

    /// YAML manifest listing entry points
    pub manifest_file: PathBuf,

    /// Model name passed to the generator
    pub model: String,

    /// Executable invoked to run the model
    pub generator_program: String,

    /// Source file selection
    pub source_filter: SourceFilterConfig,

    /// Dry run mode (no generator call, no report written)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_qa_validator::Config;
    ///
    /// let config = Config::builder()
    ///     .results_dir("./out/results")
    ///     .model("mistral")
    ///     .build()
    ///     .expect("valid configuration");
    /// assert_eq!(config.model, "mistral");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// Paths are not checked for existence here; each mode reports the
    /// missing input it actually needs.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model or generator program is blank
    /// - A source filter pattern is invalid
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("model name must not be empty"));
        }

        if self.generator_program.trim().is_empty() {
            return Err(Error::config("generator program must not be empty"));
        }

        SourceFilter::new(&self.source_filter)?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt_file: PathBuf::from(DEFAULT_PROMPT_FILE),
            apps_dir: PathBuf::from(DEFAULT_APPS_DIR),
            generated_dir: PathBuf::from(DEFAULT_GENERATED_DIR),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            manifest_file: PathBuf::from(DEFAULT_MANIFEST_FILE),
            model: DEFAULT_MODEL.to_string(),
            generator_program: DEFAULT_GENERATOR_PROGRAM.to_string(),
            source_filter: SourceFilterConfig::default(),
            dry_run: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    prompt_file: Option<PathBuf>,
    apps_dir: Option<PathBuf>,
    generated_dir: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    manifest_file: Option<PathBuf>,
    model: Option<String>,
    generator_program: Option<String>,
    source_filter: Option<SourceFilterConfig>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the prompt template file.
    #[must_use]
    pub fn prompt_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_file = Some(path.into());
        self
    }

    /// Sets the applications-under-validation root.
    #[must_use]
    pub fn apps_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.apps_dir = Some(path.into());
        self
    }

    /// Sets the generated artifacts root.
    #[must_use]
    pub fn generated_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.generated_dir = Some(path.into());
        self
    }

    /// Sets the results directory.
    #[must_use]
    pub fn results_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(path.into());
        self
    }

    /// Sets the manifest file.
    #[must_use]
    pub fn manifest_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_file = Some(path.into());
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the generator executable.
    #[must_use]
    pub fn generator_program(mut self, program: impl Into<String>) -> Self {
        self.generator_program = Some(program.into());
        self
    }

    /// Sets the source file selection.
    #[must_use]
    pub fn source_filter(mut self, config: SourceFilterConfig) -> Self {
        self.source_filter = Some(config);
        self
    }

    /// Enables dry run mode.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            prompt_file: self
                .prompt_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPT_FILE)),
            apps_dir: self
                .apps_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_APPS_DIR)),
            generated_dir: self
                .generated_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GENERATED_DIR)),
            results_dir: self
                .results_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            manifest_file: self
                .manifest_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_FILE)),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            generator_program: self
                .generator_program
                .unwrap_or_else(|| DEFAULT_GENERATOR_PROGRAM.to_string()),
            source_filter: self.source_filter.unwrap_or_default(),
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::builder().build().unwrap();

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.manifest_file, PathBuf::from("manifest.yaml"));
        assert_eq!(config.generator_program, "ollama");
        assert!(!config.dry_run);
    }

    #[test]
    fn test_overrides() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .results_dir(temp.path().join("results"))
            .apps_dir(temp.path().join("apps"))
            .model("demo")
            .dry_run(true)
            .build()
            .unwrap();

        assert_eq!(config.results_dir, temp.path().join("results"));
        assert_eq!(config.apps_dir, temp.path().join("apps"));
        assert_eq!(config.model, "demo");
        assert!(config.dry_run);
    }

    #[test]
    fn test_blank_model_rejected() {
        let result = Config::builder().model("  ").build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_blank_program_rejected() {
        assert!(Config::builder().generator_program("").build().is_err());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = Config::builder()
            .source_filter(SourceFilterConfig::new().include(vec!["a[".to_string()]))
            .build();

        assert!(result.is_err());
    }
}
