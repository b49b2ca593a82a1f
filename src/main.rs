//! mediapilot CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mediapilot::cli::{filter_directive, parse_param, Args, Commands};
use mediapilot::config::Config;
use mediapilot::dispatch::{CommandResult, MediaPipeline};
use mediapilot::executor::ProcessExecutor;
use mediapilot::llm::OllamaClient;
use mediapilot::registry::FileRegistry;
use mediapilot::sanitize::OutputSanitizer;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(args.verbose, args.quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(model) = args.model.clone() {
        config.models.primary = model;
    }
    if let Some(source_dir) = args.source_dir.clone() {
        config.paths.source_dir = source_dir;
    }

    let registry = Arc::new(FileRegistry::new());
    let registered = registry.scan(&config.paths.source_dir);
    info!(
        count = registered,
        dir = %config.paths.source_dir.display(),
        "registry seeded from source directory"
    );

    let client = OllamaClient::with_config(
        &config.models.base_url,
        &config.models.primary,
        Duration::from_secs(config.limits.llm_timeout_secs),
    )?
    .with_fallback(config.models.fallback.clone())
    .with_max_tokens(config.limits.llm_max_tokens)
    .with_temperature(config.limits.temperature);

    let pipeline = MediaPipeline::new(registry, Arc::new(client))
        .with_executor(ProcessExecutor::new(Duration::from_secs(
            config.limits.tool_timeout_secs,
        )))
        .with_sanitizer(
            OutputSanitizer::new(config.sanitizer.max_output_tokens)
                .with_keep_fields(config.sanitizer.keep_fields.clone()),
        )
        .with_sanitize_enabled(config.sanitizer.enabled);

    match args.command {
        Commands::List => {
            let mut records = pipeline.list_registered_files();
            records.sort_by(|a, b| a.path.cmp(&b.path));

            if records.is_empty() {
                println!("{}", "No files registered.".yellow());
            }
            for record in records {
                println!(
                    "{}  {:<7} {:>10}  {}",
                    record.id.cyan(),
                    record.media_kind.to_string(),
                    format_size(record.size),
                    record.path.display()
                );
            }
        }

        Commands::Info { id } => match pipeline.get_file(&id) {
            Some(record) => {
                println!("{}       {}", "id:".bold(), record.id);
                println!("{}     {}", "path:".bold(), record.path.display());
                println!("{}     {}", "kind:".bold(), record.media_kind);
                println!("{}     {}", "size:".bold(), format_size(record.size));
                println!("{} {}", "modified:".bold(), record.modified);
            }
            None => {
                eprintln!("{} {}", "not found:".red(), id);
                std::process::exit(1);
            }
        },

        Commands::Process {
            id,
            output,
            operation,
            params,
        } => {
            let params: BTreeMap<String, String> =
                params.iter().filter_map(|p| parse_param(p)).collect();

            let spinner = start_spinner(&format!("{} {}", operation, id));
            let result = pipeline.process_media(&id, &output, &operation, params).await;
            spinner.finish_and_clear();

            print_command_result(&result);
            if !result.success {
                std::process::exit(1);
            }
        }

        Commands::Composite {
            video_id,
            audio_id,
            output,
            duration,
            start,
        } => {
            let spinner = start_spinner(&format!("composite {} + {}", video_id, audio_id));
            let result = pipeline
                .create_composite(&video_id, &audio_id, &output, duration, start)
                .await;
            spinner.finish_and_clear();

            print_command_result(&result);
            if !result.success {
                std::process::exit(1);
            }
        }

        Commands::Fetch {
            url,
            output_dir,
            format,
            audio_only,
            max_duration,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            std::fs::create_dir_all(&output_dir)?;

            let spinner = start_spinner(&format!("fetching {}", url));
            let result = pipeline
                .fetch_remote(&url, &output_dir, format.as_deref(), audio_only, max_duration)
                .await;
            spinner.finish_and_clear();

            if result.success {
                println!("{}", "Download complete".green().bold());
                if let Some(title) = &result.title {
                    println!("  {}    {}", "title:".bold(), title);
                }
                if let Some(duration) = result.duration_secs {
                    println!("  {} {:.0}s", "duration:".bold(), duration);
                }
                if let Some(path) = &result.downloaded_path {
                    println!("  {}     {}", "path:".bold(), path.display());
                }
            } else {
                println!("{}", "Download failed".red().bold());
                if let Some(error) = &result.error {
                    println!("  {}", error);
                }
                if !result.output.is_empty() {
                    println!("{}", result.output.dimmed());
                }
                std::process::exit(1);
            }
        }

        Commands::Stats => {
            let stats = pipeline.get_usage_stats();
            println!("{}           {}", "model:".bold(), stats.model);
            println!(
                "{} ${:.4}",
                "cost per 1K tokens:".bold(),
                stats.cost_per_1k_tokens
            );
        }
    }

    Ok(())
}

fn start_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_command_result(result: &CommandResult) {
    if result.success {
        println!(
            "{} {}",
            "Done".green().bold(),
            format!("({} ms)", result.duration_ms).dimmed()
        );
        if let Some(output_file) = &result.output_file {
            println!("  {}  {}", "output:".bold(), output_file.display());
        }
    } else {
        println!("{}", "Failed".red().bold());
        if let Some(error) = &result.error {
            println!("  {}", error);
        }
    }

    if let Some(command) = &result.command {
        println!("  {} {}", "command:".bold(), command.dimmed());
    }
    if result.usage.total() > 0 {
        println!(
            "  {}  {} prompt + {} completion",
            "tokens:".bold(),
            result.usage.prompt_tokens,
            result.usage.completion_tokens
        );
    }
    if !result.output.is_empty() {
        println!("{}", result.output.dimmed());
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
