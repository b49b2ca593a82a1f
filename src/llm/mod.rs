//! Pluggable language-model client
//!
//! The synthesizer talks to whatever implements [`LanguageModel`]; the
//! shipped implementation is the Ollama client, tests substitute mocks.

pub mod client;
pub mod types;

pub use client::OllamaClient;
pub use types::{Generation, TokenUsage};

use crate::errors::Result;
use async_trait::async_trait;

/// A language model capable of one-shot text generation
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the prompt
    ///
    /// Transport failures surface as [`crate::errors::PipelineError::Generation`].
    async fn generate(&self, prompt: &str) -> Result<Generation>;

    /// Identity of the model answering calls
    fn model_name(&self) -> &str;

    /// Estimated cost per 1,000 tokens, in dollars
    fn cost_per_1k_tokens(&self) -> f64;
}
