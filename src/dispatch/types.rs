//! Request and result types for the dispatcher surface

use crate::errors::{PipelineError, Result};
use crate::llm::TokenUsage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Supported media transformations
///
/// A closed set: an unrecognized operation name fails fast at dispatch
/// instead of reaching the model with semantics nobody defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Convert,
    ExtractAudio,
    Trim,
    Resize,
    Compress,
    Thumbnail,
    Gif,
    Composite,
    Probe,
}

impl Operation {
    /// Parse an operation name; unknown names are an explicit failure
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "convert" => Ok(Operation::Convert),
            "extract_audio" => Ok(Operation::ExtractAudio),
            "trim" => Ok(Operation::Trim),
            "resize" => Ok(Operation::Resize),
            "compress" => Ok(Operation::Compress),
            "thumbnail" => Ok(Operation::Thumbnail),
            "gif" => Ok(Operation::Gif),
            "composite" => Ok(Operation::Composite),
            "probe" => Ok(Operation::Probe),
            other => Err(PipelineError::UnsupportedOperation(other.to_string())),
        }
    }

    /// Stable snake_case name
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Convert => "convert",
            Operation::ExtractAudio => "extract_audio",
            Operation::Trim => "trim",
            Operation::Resize => "resize",
            Operation::Compress => "compress",
            Operation::Thumbnail => "thumbnail",
            Operation::Gif => "gif",
            Operation::Composite => "composite",
            Operation::Probe => "probe",
        }
    }

    /// Task sentence embedded in the synthesis prompt
    pub fn describe(&self) -> &'static str {
        match self {
            Operation::Convert => {
                "Convert the input into the format implied by the output file extension"
            }
            Operation::ExtractAudio => "Extract the audio track from the input",
            Operation::Trim => "Cut the input to the requested time range",
            Operation::Resize => "Scale the input video to the requested dimensions",
            Operation::Compress => "Re-encode the input at a reduced bitrate",
            Operation::Thumbnail => "Capture a single frame from the input as an image",
            Operation::Gif => "Turn the input clip into an animated GIF",
            Operation::Composite => {
                "Combine the first input's video with the second input's audio"
            }
            Operation::Probe => "Report the input's container and stream metadata as JSON",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A normalized processing request
///
/// The destination path is always caller-supplied, never derived from
/// identifiers.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    /// Source file identifiers, in prompt order
    pub input_ids: Vec<String>,

    /// Caller-supplied destination path
    pub output_path: PathBuf,

    /// The requested transformation
    pub operation: Operation,

    /// Operation-specific parameters
    pub params: BTreeMap<String, String>,
}

/// Result of one processing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the external tool exited zero
    pub success: bool,

    /// The literal command line that was executed, for auditability
    pub command: Option<String>,

    /// Wall-clock duration of the whole request
    pub duration_ms: u64,

    /// Token accounting from the model call (zero if no call happened)
    pub usage: TokenUsage,

    /// Sanitized tool output
    pub output: String,

    /// Destination path; populated only on success
    pub output_file: Option<PathBuf>,

    /// Failure description, if any
    pub error: Option<String>,
}

impl CommandResult {
    /// Successful result; the destination is taken on trust from the zero
    /// exit code, no post-hoc existence check
    pub fn success(
        command: String,
        output: String,
        output_file: PathBuf,
        usage: TokenUsage,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: true,
            command: Some(command),
            duration_ms,
            usage,
            output,
            output_file: Some(output_file),
            error: None,
        }
    }

    /// Failed result; never carries an output file
    pub fn failure(error: String, duration_ms: u64) -> Self {
        Self {
            success: false,
            command: None,
            duration_ms,
            usage: TokenUsage::default(),
            output: String::new(),
            output_file: None,
            error: Some(error),
        }
    }

    /// Failed result that still records the command that ran and what it
    /// printed
    pub fn execution_failure(
        command: String,
        output: String,
        error: String,
        usage: TokenUsage,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: false,
            command: Some(command),
            duration_ms,
            usage,
            output,
            output_file: None,
            error: Some(error),
        }
    }
}

/// Result of a remote fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    /// Whether the download tool exited zero
    pub success: bool,

    /// Where the file landed, when the tool reported it
    pub downloaded_path: Option<PathBuf>,

    /// Media title, when the tool reported it
    pub title: Option<String>,

    /// Media duration in seconds, when the tool reported it
    pub duration_secs: Option<f64>,

    /// Sanitized tool output
    pub output: String,

    /// Failure description, if any
    pub error: Option<String>,
}

/// Model identity and cost accounting for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    /// Model answering synthesis calls
    pub model: String,

    /// Estimated cost per 1,000 tokens, in dollars
    pub cost_per_1k_tokens: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse_known() {
        assert_eq!(Operation::parse("convert").unwrap(), Operation::Convert);
        assert_eq!(
            Operation::parse("EXTRACT_AUDIO").unwrap(),
            Operation::ExtractAudio
        );
    }

    #[test]
    fn test_operation_parse_unknown_fails_fast() {
        let err = Operation::parse("liquify").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_operation_name_roundtrip() {
        for op in [
            Operation::Convert,
            Operation::ExtractAudio,
            Operation::Trim,
            Operation::Resize,
            Operation::Compress,
            Operation::Thumbnail,
            Operation::Gif,
            Operation::Composite,
            Operation::Probe,
        ] {
            assert_eq!(Operation::parse(op.name()).unwrap(), op);
        }
    }

    #[test]
    fn test_failure_never_has_output_file() {
        let result = CommandResult::failure("boom".to_string(), 5);
        assert!(!result.success);
        assert!(result.output_file.is_none());

        let result = CommandResult::execution_failure(
            "ffmpeg -i a b".to_string(),
            "stderr text".to_string(),
            "exit 1".to_string(),
            TokenUsage::default(),
            5,
        );
        assert!(!result.success);
        assert!(result.output_file.is_none());
        assert_eq!(result.command.as_deref(), Some("ffmpeg -i a b"));
    }

    #[test]
    fn test_success_carries_audit_trail() {
        let result = CommandResult::success(
            "ffmpeg -i a b".to_string(),
            "out".to_string(),
            PathBuf::from("/out/b.mp4"),
            TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            },
            42,
        );

        assert!(result.success);
        assert_eq!(result.command.as_deref(), Some("ffmpeg -i a b"));
        assert_eq!(result.output_file, Some(PathBuf::from("/out/b.mp4")));
        assert_eq!(result.usage.total(), 15);
    }
}
