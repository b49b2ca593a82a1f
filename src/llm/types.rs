//! Wire types for the model transport
//!
//! Request/response shapes for the Ollama generate endpoint and the
//! token-usage accounting carried back through the pipeline.

use serde::{Deserialize, Serialize};

/// Request body for POST /api/generate
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g., "qwen2.5:7b-instruct")
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Always false: synthesis wants a single bounded completion
    pub stream: bool,

    /// Sampling options
    pub options: GenerateOptions,
}

/// Sampling options for a generate call
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    /// Sampling temperature; low values favor determinism
    pub temperature: f64,

    /// Token ceiling for the completion
    pub num_predict: usize,
}

/// Response body from POST /api/generate (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    #[serde(default)]
    pub response: String,

    /// Tokens consumed by the prompt
    #[serde(default)]
    pub prompt_eval_count: usize,

    /// Tokens generated
    #[serde(default)]
    pub eval_count: usize,
}

/// Token accounting for one model call
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: usize,

    /// Tokens in the completion
    pub completion_tokens: usize,
}

impl TokenUsage {
    /// Total tokens across prompt and completion
    pub fn total(&self) -> usize {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A completed generation: the text plus its accounting
#[derive(Debug, Clone)]
pub struct Generation {
    /// Raw model output
    pub text: String,

    /// Token accounting for the call
    pub usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_usage_default_is_zero() {
        let usage = TokenUsage::default();
        assert_eq!(usage.total(), 0);
    }

    #[test]
    fn test_generate_response_tolerates_missing_counts() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"response": "ffmpeg -i a.mp4 b.mp4"}"#).unwrap();
        assert_eq!(response.response, "ffmpeg -i a.mp4 b.mp4");
        assert_eq!(response.eval_count, 0);
    }

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest {
            model: "qwen2.5:7b-instruct".to_string(),
            prompt: "say hi".to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: 0.1,
                num_predict: 256,
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"stream\":false"));
        assert!(json.contains("\"num_predict\":256"));
    }
}
