//! Response sanitizer: token-budgeted compression of tool output
//!
//! Media tools narrate heavily — version banners, build configuration,
//! stream mappings, per-frame progress. Sanitization removes lines, never
//! adds content, and the error/success signal survives every path.
//!
//! The rule set is selected by a lightweight classification of the
//! operation name; unclassified output falls back to budget truncation.

pub mod counter;

pub use counter::TokenCounter;

use serde_json::Value;
use tracing::debug;

/// Retained-line cap for download-tool output
pub const MAX_RETAINED_DOWNLOAD_LINES: usize = 10;

/// Lines at or under this length are kept as informative on the media path
pub const SHORT_LINE_MAX: usize = 60;

/// Marker appended when fallback output is truncated to budget
pub const TRUNCATION_MARKER: &str = "... [output truncated]";

/// Output classification driving the rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// ffmpeg-style media tool output
    MediaTool,
    /// yt-dlp-style download tool output
    Downloader,
    /// JSON-shaped output reduced to an allow-list of fields
    Structured,
    /// Unclassified: pass through under budget, truncate over it
    Plain,
}

impl OutputKind {
    /// Classify an operation name
    pub fn classify(operation: &str) -> Self {
        let name = operation.to_ascii_lowercase();

        if name.contains("download") || name.contains("fetch") {
            OutputKind::Downloader
        } else if name.contains("probe") || name.contains("metadata") || name.contains("info") {
            OutputKind::Structured
        } else if [
            "convert",
            "extract_audio",
            "trim",
            "resize",
            "compress",
            "thumbnail",
            "gif",
            "composite",
            "overlay",
        ]
        .iter()
        .any(|op| name.contains(op))
        {
            OutputKind::MediaTool
        } else {
            OutputKind::Plain
        }
    }
}

/// Accounting for one sanitization pass
#[derive(Debug, Clone)]
pub struct SanitizationResult {
    /// Token estimate before sanitization
    pub original_tokens: usize,

    /// Token estimate after sanitization
    pub sanitized_tokens: usize,

    /// Reduction as a percentage of the original
    pub reduction_percent: f64,

    /// Sanitized text
    pub text: String,
}

/// Operation-aware output sanitizer
///
/// Pure transformation: no filesystem, no network. Configured with a token
/// budget and, for the structured path, a caller-specified field allow-list.
#[derive(Debug, Clone)]
pub struct OutputSanitizer {
    counter: TokenCounter,
    max_tokens: usize,
    keep_fields: Vec<String>,
}

impl OutputSanitizer {
    /// Create a sanitizer with the given retained-token budget
    pub fn new(max_tokens: usize) -> Self {
        Self {
            counter: TokenCounter::new(),
            max_tokens,
            keep_fields: Vec::new(),
        }
    }

    /// Set the field allow-list for structured (JSON) output
    pub fn with_keep_fields(mut self, fields: Vec<String>) -> Self {
        self.keep_fields = fields;
        self
    }

    /// Sanitize tool output under the rules for its kind
    pub fn sanitize(&self, text: &str, kind: OutputKind) -> SanitizationResult {
        let sanitized = match kind {
            OutputKind::MediaTool => self.sanitize_media(text),
            OutputKind::Downloader => self.sanitize_download(text),
            OutputKind::Structured => self.sanitize_structured(text),
            OutputKind::Plain => self.sanitize_plain(text),
        };

        let original_tokens = self.counter.estimate(text);
        let sanitized_tokens = self.counter.estimate(&sanitized);
        let reduction_percent = if original_tokens > 0 {
            (original_tokens.saturating_sub(sanitized_tokens) as f64 / original_tokens as f64)
                * 100.0
        } else {
            0.0
        };

        debug!(
            ?kind,
            original_tokens, sanitized_tokens, "sanitized tool output"
        );

        SanitizationResult {
            original_tokens,
            sanitized_tokens,
            reduction_percent,
            text: sanitized,
        }
    }

    /// Media-tool rules: strip banners and stream-mapping detail, retain
    /// progress markers, error/warning markers, and short lines
    fn sanitize_media(&self, text: &str) -> String {
        let kept: Vec<&str> = text
            .lines()
            .filter(|line| {
                if is_media_banner(line) || is_stream_mapping(line) {
                    return false;
                }
                has_progress_marker(line)
                    || has_error_marker(line)
                    || line.trim().chars().count() <= SHORT_LINE_MAX
            })
            .collect();

        kept.join("\n")
    }

    /// Download-tool rules: strip format tables and percent progress, keep
    /// destination/error/warning lines, cap retained lines
    fn sanitize_download(&self, text: &str) -> String {
        let survivors: Vec<&str> = text
            .lines()
            .filter(|line| !is_format_table_row(line) && !is_percent_progress(line))
            .filter(|line| !line.trim().is_empty())
            .collect();

        if survivors.len() <= MAX_RETAINED_DOWNLOAD_LINES {
            return survivors.join("\n");
        }

        // Over the cap: destination/error/warning lines take the slots
        // first, then earliest remaining lines, original order preserved.
        let mut keep_idx: Vec<usize> = survivors
            .iter()
            .enumerate()
            .filter(|(_, line)| is_download_signal(line))
            .map(|(i, _)| i)
            .take(MAX_RETAINED_DOWNLOAD_LINES)
            .collect();

        for (i, line) in survivors.iter().enumerate() {
            if keep_idx.len() >= MAX_RETAINED_DOWNLOAD_LINES {
                break;
            }
            if !is_download_signal(line) {
                keep_idx.push(i);
            }
        }
        keep_idx.sort_unstable();

        keep_idx
            .into_iter()
            .map(|i| survivors[i])
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Structured rules: retain the allow-list plus error/success/status
    /// unconditionally; pass through on parse failure
    fn sanitize_structured(&self, text: &str) -> String {
        let parsed: Value = match serde_json::from_str(text.trim()) {
            Ok(value) => value,
            // Not actually JSON: pass through rather than corrupt it
            Err(_) => return text.to_string(),
        };

        let Value::Object(map) = parsed else {
            return text.to_string();
        };

        let mut reduced = serde_json::Map::new();
        for (key, value) in map {
            let always = matches!(key.as_str(), "error" | "success" | "status");
            if always || self.keep_fields.iter().any(|f| f == &key) {
                reduced.insert(key, value);
            }
        }

        serde_json::to_string(&Value::Object(reduced)).unwrap_or_else(|_| text.to_string())
    }

    /// Fallback rules: unchanged under budget, truncated with marker over it
    fn sanitize_plain(&self, text: &str) -> String {
        if self.counter.estimate(text) <= self.max_tokens {
            return text.to_string();
        }

        let budget_chars = self.counter.chars_for(self.max_tokens);
        let truncated: String = text.chars().take(budget_chars).collect();
        format!("{}\n{}", truncated, TRUNCATION_MARKER)
    }
}

fn is_media_banner(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("ffmpeg version")
        || trimmed.starts_with("ffprobe version")
        || trimmed.starts_with("built with")
        || trimmed.starts_with("configuration:")
        || trimmed.starts_with("lib")
}

fn is_stream_mapping(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("Stream mapping:") || trimmed.starts_with("Stream #")
}

fn has_progress_marker(line: &str) -> bool {
    ["frame=", "time=", "size=", "speed=", "bitrate="]
        .iter()
        .any(|marker| line.contains(marker))
}

fn has_error_marker(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    ["error", "warning", "failed", "invalid", "unable", "no such"]
        .iter()
        .any(|marker| lower.contains(marker))
}

fn is_percent_progress(line: &str) -> bool {
    line.contains("% of") || (line.contains("[download]") && line.contains('%'))
}

fn is_format_table_row(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("[info]") || trimmed.starts_with("format code") {
        return true;
    }
    // Rows like "137  mp4  1920x1080  ..." or "251  webm  audio only ..."
    let mut columns = trimmed.split_whitespace();
    let first_is_id = columns
        .next()
        .map(|t| t.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    first_is_id
        && (trimmed.contains("audio only")
            || trimmed.contains("video only")
            || columns.count() >= 3)
}

fn is_download_signal(line: &str) -> bool {
    line.contains("Destination")
        || line.contains("Merging")
        || line.contains("already been downloaded")
        || has_error_marker(line)
}
