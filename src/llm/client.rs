//! Ollama HTTP client for command generation
//!
//! Non-streaming client against POST /api/generate. Synthesis wants one
//! bounded, low-temperature completion; streaming buys nothing here.
//!
//! Fallback policy lives in this client: if the primary model call fails at
//! the transport level and a fallback model is configured, the call is
//! retried once against the fallback. Callers never retry on their own.

use crate::errors::{PipelineError, Result};
use crate::llm::types::{GenerateOptions, GenerateRequest, GenerateResponse, Generation, TokenUsage};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model for command synthesis
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default completion token ceiling
pub const DEFAULT_MAX_TOKENS: usize = 256;

/// Sampling temperature: creative variance in a command line is a
/// correctness risk, not a feature
pub const SYNTHESIS_TEMPERATURE: f64 = 0.1;

/// Ollama client with primary/fallback model selection
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    fallback_model: Option<String>,
    max_tokens: usize,
    temperature: f64,
}

impl OllamaClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL, Duration::from_secs(30))
    }

    /// Create a client with custom endpoint, model, and request timeout
    pub fn with_config(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PipelineError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            fallback_model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: SYNTHESIS_TEMPERATURE,
        })
    }

    /// Set the fallback model tried once after a primary transport failure
    pub fn with_fallback(mut self, model: Option<String>) -> Self {
        self.fallback_model = model;
        self
    }

    /// Set the completion token ceiling
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One generate call against a specific model
    async fn generate_with(&self, model: &str, prompt: &str) -> Result<Generation> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Generation(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Generation(format!("malformed response: {}", e)))?;

        debug!(
            model,
            prompt_tokens = body.prompt_eval_count,
            completion_tokens = body.eval_count,
            "generation complete"
        );

        Ok(Generation {
            text: body.response,
            usage: TokenUsage {
                prompt_tokens: body.prompt_eval_count,
                completion_tokens: body.eval_count,
            },
        })
    }

    /// Check if the Ollama server is reachable
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        match self.generate_with(&self.model, prompt).await {
            Ok(generation) => Ok(generation),
            Err(primary_err) => {
                let Some(fallback) = self.fallback_model.as_deref() else {
                    return Err(primary_err);
                };
                warn!(
                    primary = %self.model,
                    fallback,
                    error = %primary_err,
                    "primary model failed, trying fallback"
                );
                self.generate_with(fallback, prompt).await
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn cost_per_1k_tokens(&self) -> f64 {
        // Local inference: no per-token charge
        0.0
    }
}
