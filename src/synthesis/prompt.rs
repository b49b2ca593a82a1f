//! Prompt construction for command synthesis
//!
//! The prompt pins down everything the model must not improvise: the exact
//! input/output paths (quoted, so embedded whitespace survives), the
//! operation, and the parameter bag. The rules block demands exactly one
//! command line.

use crate::dispatch::types::Operation;
use std::collections::BTreeMap;
use std::path::Path;

/// Build the synthesis prompt for one processing request
pub fn build_prompt(
    tool: &str,
    operation: &Operation,
    inputs: &[&Path],
    output: &Path,
    params: &BTreeMap<String, String>,
) -> String {
    let input_lines = inputs
        .iter()
        .map(|p| format!("  \"{}\"", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    let param_lines = if params.is_empty() {
        "  (none)".to_string()
    } else {
        params
            .iter()
            .map(|(k, v)| format!("  {} = {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are a media-processing assistant that writes {tool} command lines.

TASK: {task}

INPUT FILES:
{inputs}

OUTPUT FILE:
  "{output}"

PARAMETERS:
{params}

RULES:
1. Respond with exactly one executable {tool} command line and nothing else
2. The line must start with {tool}
3. Double-quote every file path
4. Write to the OUTPUT FILE path exactly as given
5. Overwrite the output file if it already exists"#,
        tool = tool,
        task = operation.describe(),
        inputs = input_lines,
        output = output.display(),
        params = param_lines,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_prompt_quotes_paths() {
        let input = PathBuf::from("/media/my clip.mp4");
        let output = PathBuf::from("/out/result file.mp4");

        let prompt = build_prompt(
            "ffmpeg",
            &Operation::Convert,
            &[&input],
            &output,
            &BTreeMap::new(),
        );

        assert!(prompt.contains(r#""/media/my clip.mp4""#));
        assert!(prompt.contains(r#""/out/result file.mp4""#));
    }

    #[test]
    fn test_prompt_includes_parameters() {
        let input = PathBuf::from("/media/a.mp4");
        let output = PathBuf::from("/out/b.mp4");
        let mut params = BTreeMap::new();
        params.insert("width".to_string(), "1280".to_string());
        params.insert("height".to_string(), "720".to_string());

        let prompt = build_prompt("ffmpeg", &Operation::Resize, &[&input], &output, &params);

        assert!(prompt.contains("width = 1280"));
        assert!(prompt.contains("height = 720"));
    }

    #[test]
    fn test_prompt_marks_empty_params() {
        let input = PathBuf::from("/media/a.mp4");
        let output = PathBuf::from("/out/b.mp3");

        let prompt = build_prompt(
            "ffmpeg",
            &Operation::ExtractAudio,
            &[&input],
            &output,
            &BTreeMap::new(),
        );

        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn test_prompt_demands_single_command() {
        let input = PathBuf::from("/media/a.mp4");
        let output = PathBuf::from("/out/b.mp4");

        let prompt = build_prompt(
            "ffmpeg",
            &Operation::Convert,
            &[&input],
            &output,
            &BTreeMap::new(),
        );

        assert!(prompt.contains("exactly one executable ffmpeg command line"));
    }

    #[test]
    fn test_prompt_lists_both_composite_inputs() {
        let video = PathBuf::from("/media/v.mp4");
        let audio = PathBuf::from("/media/a.mp3");
        let output = PathBuf::from("/out/c.mp4");

        let prompt = build_prompt(
            "ffmpeg",
            &Operation::Composite,
            &[&video, &audio],
            &output,
            &BTreeMap::new(),
        );

        assert!(prompt.contains("v.mp4"));
        assert!(prompt.contains("a.mp3"));
    }
}
