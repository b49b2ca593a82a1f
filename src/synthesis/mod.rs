//! Command synthesizer: natural-language request → executable command line
//!
//! Builds a constrained prompt, runs it through the configured language
//! model, and extracts the command from the free-text response. Generation
//! failures (transport) and extraction failures (parsing) stay distinct all
//! the way to the caller.

pub mod extract;
pub mod prompt;

pub use extract::extract_command;
pub use prompt::build_prompt;

use crate::dispatch::types::Operation;
use crate::errors::Result;
use crate::llm::{LanguageModel, TokenUsage};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default external tool the synthesizer targets
pub const DEFAULT_TOOL: &str = "ffmpeg";

/// A synthesized command and the model accounting behind it
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// The extracted command line, verbatim
    pub command: String,

    /// Token accounting for the model call
    pub usage: TokenUsage,
}

/// Synthesizes tool command lines through a pluggable language model
pub struct CommandSynthesizer {
    model: Arc<dyn LanguageModel>,
    tool: String,
}

impl CommandSynthesizer {
    /// Create a synthesizer targeting the default tool
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            tool: DEFAULT_TOOL.to_string(),
        }
    }

    /// Override the target tool (tests substitute an innocuous binary)
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Target tool name
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Synthesize a command for one processing request
    ///
    /// No semantic validation of flags happens here; the executor and the
    /// external tool own that.
    pub async fn synthesize(
        &self,
        operation: &Operation,
        inputs: &[&Path],
        output: &Path,
        params: &BTreeMap<String, String>,
    ) -> Result<Synthesis> {
        let prompt = build_prompt(&self.tool, operation, inputs, output, params);
        debug!(operation = operation.name(), "requesting command synthesis");

        let generation = self.model.generate(&prompt).await?;
        let command = extract_command(&generation.text, &self.tool)?;

        debug!(command = %command, "synthesized command");

        Ok(Synthesis {
            command,
            usage: generation.usage,
        })
    }
}
