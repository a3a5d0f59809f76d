use crate::{
    collector::CodeBundle,
    error::{Error, Result},
};
use serde::Serialize;
use tera::{Context, Tera};

const PROMPT_TEMPLATE_NAME: &str = "prompt";

/// Instructions, then the code blocks separated by blank lines.
const PROMPT_LAYOUT: &str = "{{ instructions }}\n\n# Codebase:\n\
{% for block in blocks %}{% if not loop.first %}\n\n{% endif %}{{ block }}{% endfor %}";

#[derive(Serialize)]
struct PromptContext<'a> {
    instructions: &'a str,
    blocks: Vec<&'a str>,
}

/// Renders the validation prompt sent to the model.
///
/// The instruction text is passed in as data, so braces inside the prompt
/// template file are emitted verbatim.
pub(crate) struct PromptRenderer {
    tera: Tera,
}

impl PromptRenderer {
    /// Creates a renderer with the built-in prompt layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout fails to parse.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(PROMPT_TEMPLATE_NAME, PROMPT_LAYOUT)
            .map_err(|e| Error::template(PROMPT_TEMPLATE_NAME, e))?;

        Ok(Self { tera })
    }

    /// Renders `instructions` followed by every block of `bundle`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub(crate) fn render(&self, instructions: &str, bundle: &CodeBundle) -> Result<String> {
        let context = Context::from_serialize(PromptContext {
            instructions,
            blocks: bundle.contents(),
        })?;

        self.tera
            .render(PROMPT_TEMPLATE_NAME, &context)
            .map_err(|e| Error::template(PROMPT_TEMPLATE_NAME, e))
    }
}
