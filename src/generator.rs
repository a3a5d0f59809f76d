//! External text generation.
//!
//! The validator only needs "prompt and model in, text out", so the model
//! runtime sits behind [`Generator`]. [`OllamaCli`] drives a locally
//! installed `ollama` binary; tests substitute their own implementation.

use crate::error::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info};

/// Produces text for a prompt with a named model.
pub trait Generator {
    /// Runs `model` on `prompt` and returns the complete output.
    ///
    /// # Errors
    ///
    /// Returns an error if the model could not be run or reported failure.
    fn generate(&self, prompt: &str, model: &str) -> Result<String>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        (**self).generate(prompt, model)
    }
}

/// Runs `<program> run <model>` with the prompt on standard input.
#[derive(Debug, Clone)]
pub struct OllamaCli {
    program: String,
}

impl OllamaCli {
    /// Uses the given executable.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for OllamaCli {
    fn default() -> Self {
        Self::new("ollama")
    }
}

impl Generator for OllamaCli {
    fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        info!("Sending prompt to model '{}' via {}", model, self.program);
        debug!("Executing: {} run {} [prompt: {} bytes]", self.program, model, prompt.len());

        let mut child = Command::new(&self.program)
            .args(["run", model])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::generation(model, "failed to start", format!("{}: {e}", self.program))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::generation(model, "failed to start", "stdin unavailable"))?;

        // Feed stdin from a helper thread so a large prompt cannot block
        // against a full stdout pipe.
        let payload = prompt.as_bytes().to_vec();
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let output = child
            .wait_with_output()
            .map_err(|e| Error::generation(model, "wait failed", e.to_string()))?;

        let write_result = writer
            .join()
            .map_err(|_| Error::generation(model, "stdin writer panicked", ""))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::generation(model, output.status.to_string(), stderr));
        }

        // A child that exits successfully without draining stdin is fine.
        if let Err(e) = write_result {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(Error::generation(model, "stdin write failed", e.to_string()));
            }
        }

        let text = String::from_utf8(output.stdout).map_err(|e| {
            Error::generation(
                model,
                output.status.to_string(),
                format!("invalid UTF-8 in output: {e}"),
            )
        })?;

        info!("Model '{}' responded with {} bytes", model, text.len());
        Ok(text)
    }
}
