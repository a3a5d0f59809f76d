use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the llm-qa-validator library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// None of file, directory or manifest was usable as a code source.
    #[error("No valid input source provided. Use --file, --dir or --manifest with an existing manifest.")]
    NoSource,

    /// The single-file source does not point at a regular file.
    #[error("'{path}' is not an existing regular file")]
    NotAFile {
        /// Offending path
        path: PathBuf,
    },

    /// Manifest could not be parsed.
    #[error("Failed to parse manifest '{path}': {message}")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Invalid UTF-8 encountered in file.
    #[error("Invalid UTF-8 encoding in file '{path}'. File may be binary or use unsupported encoding.")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
    },

    /// The external generator failed to run or exited unsuccessfully.
    #[error("Generation with model '{model}' failed ({status}): {stderr}")]
    Generation {
        /// Model that was requested
        model: String,
        /// Exit status or spawn failure description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// No validation report exists yet.
    #[error("No validation report found in '{dir}'. Run the validate mode first.")]
    NoReport {
        /// Results directory that was searched
        dir: PathBuf,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: source.to_string(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }

    /// Creates a not-a-file error.
    #[must_use]
    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    /// Creates a manifest parse error.
    #[must_use]
    pub fn manifest(path: impl Into<PathBuf>, source: &serde_yaml::Error) -> Self {
        Self::Manifest {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a generation error.
    #[must_use]
    pub fn generation(
        model: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Generation {
            model: model.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a no report error.
    #[must_use]
    pub fn no_report(dir: impl Into<PathBuf>) -> Self {
        Self::NoReport { dir: dir.into() }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if no code source was available.
    #[must_use]
    pub const fn is_no_source(&self) -> bool {
        matches!(self, Self::NoSource)
    }

    /// Returns true if the external generator failed.
    #[must_use]
    pub const fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// Returns true if no report was found.
    #[must_use]
    pub const fn is_no_report(&self) -> bool {
        matches!(self, Self::NoReport { .. })
    }
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        Self::Template {
            template: "unknown".to_string(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_generation_error_carries_stderr() {
        let err = Error::generation("llama3", "exit status: 1", "model not found");
        assert!(err.is_generation());
        let msg = err.to_string();
        assert!(msg.contains("llama3"));
        assert!(msg.contains("model not found"));
    }

    #[test]
    fn test_no_report_mentions_directory() {
        let err = Error::no_report("results");
        assert!(err.is_no_report());
        assert!(err.to_string().contains("results"));
    }

    #[test]
    fn test_manifest_error() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{ not: [a list").unwrap_err();
        let err = Error::manifest("manifest.yaml", &yaml_err);
        assert!(err.to_string().contains("manifest.yaml"));
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::NoSource;
        let cloned = err.clone();
        assert!(cloned.is_no_source());
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
