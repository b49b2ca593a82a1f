//! Command-line argument parsing
//!
//! Clap-based CLI with subcommands mirroring the pipeline surface and
//! verbosity control mapped onto the tracing filter.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mediapilot - natural-language media requests, executed
#[derive(Parser, Debug)]
#[command(name = "mediapilot")]
#[command(version)]
#[command(about = "Turn natural-language media requests into executed ffmpeg commands", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the synthesis model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the source directory scanned at startup
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Verbosity level: -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered files
    List,

    /// Show one file's record
    Info {
        /// File identifier
        id: String,
    },

    /// Run a transformation on a registered file
    Process {
        /// Source file identifier
        id: String,

        /// Destination path
        output: PathBuf,

        /// Operation name (convert, extract_audio, trim, resize,
        /// compress, thumbnail, gif, probe)
        operation: String,

        /// Operation parameters as key=value
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Combine one file's video with another file's audio
    Composite {
        /// Video source identifier
        video_id: String,

        /// Audio source identifier
        audio_id: String,

        /// Destination path
        output: PathBuf,

        /// Clip duration in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Start offset in seconds
        #[arg(long)]
        start: Option<f64>,
    },

    /// Download remote media
    Fetch {
        /// Media URL
        url: String,

        /// Destination directory (default: configured output dir)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Download format selector
        #[arg(long)]
        format: Option<String>,

        /// Extract audio only
        #[arg(long)]
        audio_only: bool,

        /// Skip media longer than this many seconds
        #[arg(long)]
        max_duration: Option<u64>,
    },

    /// Show model identity and cost accounting
    Stats,
}

/// Tracing filter directive for the chosen verbosity
pub fn filter_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Split a `key=value` parameter argument
pub fn parse_param(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive(0, false), "info");
        assert_eq!(filter_directive(1, false), "debug");
        assert_eq!(filter_directive(2, false), "trace");
        assert_eq!(filter_directive(2, true), "warn");
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("width=1280"),
            Some(("width".to_string(), "1280".to_string()))
        );
        assert_eq!(
            parse_param("filter=scale=640:480"),
            Some(("filter".to_string(), "scale=640:480".to_string()))
        );
        assert_eq!(parse_param("no-equals"), None);
        assert_eq!(parse_param("=value"), None);
    }

    #[test]
    fn test_args_parse_process() {
        let args = Args::parse_from([
            "mediapilot",
            "process",
            "abc123",
            "/out/b.mp4",
            "resize",
            "--param",
            "width=1280",
        ]);

        match args.command {
            Commands::Process {
                id,
                output,
                operation,
                params,
            } => {
                assert_eq!(id, "abc123");
                assert_eq!(output, PathBuf::from("/out/b.mp4"));
                assert_eq!(operation, "resize");
                assert_eq!(params, vec!["width=1280"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_args_parse_fetch_flags() {
        let args = Args::parse_from([
            "mediapilot",
            "fetch",
            "https://example.com/v",
            "--audio-only",
            "--max-duration",
            "600",
        ]);

        match args.command {
            Commands::Fetch {
                audio_only,
                max_duration,
                ..
            } => {
                assert!(audio_only);
                assert_eq!(max_duration, Some(600));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
