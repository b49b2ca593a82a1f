//! Request dispatcher: the pipeline's external surface
//!
//! Owns the strict per-request sequencing: resolve identifiers, synthesize
//! a command, execute it, sanitize the output. Resolution and
//! operation-validation failures short-circuit before any model call.
//! Every path returns a structured result; nothing here panics or takes the
//! service down with it.

pub mod types;

pub use types::{CommandResult, FetchResult, Operation, ProcessingRequest, UsageStats};

use crate::errors::PipelineError;
use crate::executor::{rejoin, ProcessExecutor};
use crate::llm::LanguageModel;
use crate::registry::{FileRecord, FileRegistry};
use crate::sanitize::{OutputKind, OutputSanitizer};
use crate::synthesis::CommandSynthesizer;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Download tool for remote fetches
pub const DOWNLOAD_TOOL: &str = "yt-dlp";

/// The media-command orchestration pipeline
///
/// Constructed once and shared; all methods take `&self`, so concurrent
/// requests run as independent tasks over the same instance.
pub struct MediaPipeline {
    registry: Arc<FileRegistry>,
    model: Arc<dyn LanguageModel>,
    synthesizer: CommandSynthesizer,
    executor: ProcessExecutor,
    sanitizer: OutputSanitizer,
    sanitize_enabled: bool,
}

impl MediaPipeline {
    /// Create a pipeline over a registry and model with default components
    pub fn new(registry: Arc<FileRegistry>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            registry,
            synthesizer: CommandSynthesizer::new(model.clone()),
            model,
            executor: ProcessExecutor::default(),
            sanitizer: OutputSanitizer::new(500),
            sanitize_enabled: true,
        }
    }

    /// Replace the executor (timeout configuration)
    pub fn with_executor(mut self, executor: ProcessExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the sanitizer (budget and allow-list configuration)
    pub fn with_sanitizer(mut self, sanitizer: OutputSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Toggle output sanitization
    pub fn with_sanitize_enabled(mut self, enabled: bool) -> Self {
        self.sanitize_enabled = enabled;
        self
    }

    /// Override the synthesis target tool
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.synthesizer = CommandSynthesizer::new(self.model.clone()).with_tool(tool);
        self
    }

    /// Process one media file through a named transformation
    pub async fn process_media(
        &self,
        input_id: &str,
        output_path: &Path,
        operation: &str,
        params: BTreeMap<String, String>,
    ) -> CommandResult {
        let start = Instant::now();

        let operation = match Operation::parse(operation) {
            Ok(op) => op,
            Err(e) => return CommandResult::failure(e.to_string(), elapsed_ms(start)),
        };

        let Some(input) = self.registry.resolve(input_id) else {
            return CommandResult::failure(
                PipelineError::Resolution(input_id.to_string()).to_string(),
                elapsed_ms(start),
            );
        };

        let request = ProcessingRequest {
            input_ids: vec![input_id.to_string()],
            output_path: output_path.to_path_buf(),
            operation,
            params,
        };

        self.run_request(&request, &[input], start).await
    }

    /// Combine one file's video with another file's audio
    pub async fn create_composite(
        &self,
        video_id: &str,
        audio_id: &str,
        output_path: &Path,
        duration: Option<f64>,
        start_time: Option<f64>,
    ) -> CommandResult {
        let start = Instant::now();

        let Some(video) = self.registry.resolve(video_id) else {
            return CommandResult::failure(
                PipelineError::Resolution(video_id.to_string()).to_string(),
                elapsed_ms(start),
            );
        };
        let Some(audio) = self.registry.resolve(audio_id) else {
            return CommandResult::failure(
                PipelineError::Resolution(audio_id.to_string()).to_string(),
                elapsed_ms(start),
            );
        };

        let mut params = BTreeMap::new();
        if let Some(duration) = duration {
            params.insert("duration_secs".to_string(), duration.to_string());
        }
        if let Some(start_time) = start_time {
            params.insert("start_time_secs".to_string(), start_time.to_string());
        }

        let request = ProcessingRequest {
            input_ids: vec![video_id.to_string(), audio_id.to_string()],
            output_path: output_path.to_path_buf(),
            operation: Operation::Composite,
            params,
        };

        self.run_request(&request, &[video, audio], start).await
    }

    /// Synthesize, execute, sanitize — the strict internal sequence
    async fn run_request(
        &self,
        request: &ProcessingRequest,
        inputs: &[PathBuf],
        start: Instant,
    ) -> CommandResult {
        let input_refs: Vec<&Path> = inputs.iter().map(PathBuf::as_path).collect();

        let synthesis = match self
            .synthesizer
            .synthesize(
                &request.operation,
                &input_refs,
                &request.output_path,
                &request.params,
            )
            .await
        {
            Ok(synthesis) => synthesis,
            Err(e) => {
                warn!(operation = request.operation.name(), error = %e, "synthesis failed");
                return CommandResult::failure(e.to_string(), elapsed_ms(start));
            }
        };

        info!(command = %synthesis.command, "executing synthesized command");
        let execution = self.executor.execute(&synthesis.command).await;

        let output = self.sanitized(&execution.output, request.operation.name());

        if execution.succeeded() {
            CommandResult::success(
                synthesis.command,
                output,
                request.output_path.clone(),
                synthesis.usage,
                elapsed_ms(start),
            )
        } else {
            let message = execution
                .failure_message(self.executor.timeout().as_secs())
                .unwrap_or_else(|| "unknown execution failure".to_string());
            CommandResult::execution_failure(
                synthesis.command,
                output,
                message,
                synthesis.usage,
                elapsed_ms(start),
            )
        }
    }

    /// Download remote media with the download tool
    ///
    /// The invocation is fully known here, so the argv is built directly —
    /// no model in the loop.
    pub async fn fetch_remote(
        &self,
        url: &str,
        output_dir: &Path,
        format: Option<&str>,
        audio_only: bool,
        max_duration_secs: Option<u64>,
    ) -> FetchResult {
        let mut argv: Vec<String> = vec![
            DOWNLOAD_TOOL.to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "-o".to_string(),
            format!("{}/%(title)s.%(ext)s", output_dir.display()),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:%(title)s\t%(duration)s\t%(filepath)s".to_string(),
        ];

        if audio_only {
            argv.push("-x".to_string());
            argv.push("--audio-format".to_string());
            argv.push("mp3".to_string());
        } else if let Some(format) = format {
            argv.push("-f".to_string());
            argv.push(format.to_string());
        }

        if let Some(max) = max_duration_secs {
            argv.push("--match-filter".to_string());
            argv.push(format!("duration <= {}", max));
        }

        argv.push(url.to_string());

        let command = rejoin(&argv);
        info!(url, "fetching remote media");
        let execution = self.executor.execute(&command).await;

        // Parse the print line out of the raw output before the sanitizer
        // can trim it away
        let printed = parse_print_line(&execution.output);
        let output = self.sanitized(&execution.output, "download");

        if execution.succeeded() {
            let (title, duration_secs, downloaded_path) = printed.unwrap_or((None, None, None));
            FetchResult {
                success: true,
                downloaded_path,
                title,
                duration_secs,
                output,
                error: None,
            }
        } else {
            let message = execution
                .failure_message(self.executor.timeout().as_secs())
                .unwrap_or_else(|| "unknown execution failure".to_string());
            FetchResult {
                success: false,
                downloaded_path: None,
                title: None,
                duration_secs: None,
                output,
                error: Some(message),
            }
        }
    }

    /// All currently registered files
    pub fn list_registered_files(&self) -> Vec<FileRecord> {
        self.registry.list()
    }

    /// One file's record, refreshing stale metadata
    pub fn get_file(&self, id: &str) -> Option<FileRecord> {
        self.registry.get_info(id)
    }

    /// Model identity and cost accounting
    pub fn get_usage_stats(&self) -> UsageStats {
        UsageStats {
            model: self.model.model_name().to_string(),
            cost_per_1k_tokens: self.model.cost_per_1k_tokens(),
        }
    }

    /// Shared registry handle
    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    fn sanitized(&self, output: &str, operation: &str) -> String {
        if !self.sanitize_enabled {
            return output.to_string();
        }
        let kind = OutputKind::classify(operation);
        self.sanitizer.sanitize(output, kind).text
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Parse the `--print after_move:` line: title, duration, filepath,
/// tab-separated
fn parse_print_line(output: &str) -> Option<(Option<String>, Option<f64>, Option<PathBuf>)> {
    let line = output
        .lines()
        .rev()
        .find(|line| line.matches('\t').count() == 2)?;

    let mut fields = line.split('\t');
    let title = fields.next().map(str::trim).filter(|s| !s.is_empty());
    let duration = fields.next().and_then(|s| s.trim().parse::<f64>().ok());
    let path = fields.next().map(str::trim).filter(|s| !s.is_empty());

    Some((
        title.map(String::from),
        duration,
        path.map(PathBuf::from),
    ))
}
