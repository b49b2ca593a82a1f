//! Command extraction from free-text model responses
//!
//! Models wrap command lines in preambles, markdown fences, and trailing
//! prose. Extraction treats the response as having a small grammar of
//! acceptable shapes: first a line whose leading token is the tool name,
//! then a looser search for the tool name at a token boundary anywhere.
//! Failing both is an extraction error, distinct from a transport failure.

use crate::errors::{PipelineError, Result};

/// Parse a literal command out of a model response
pub fn extract_command(response: &str, tool: &str) -> Result<String> {
    // Pass 1: a line that starts with the tool invocation
    for line in response.lines() {
        let cleaned = clean_line(line);
        if cleaned.split_whitespace().next() == Some(tool) {
            return Ok(cleaned);
        }
    }

    // Pass 2: the tool name at a token boundary anywhere in a line
    for line in response.lines() {
        let cleaned = clean_line(line);
        if let Some(pos) = find_tool_boundary(&cleaned, tool) {
            return Ok(cleaned[pos..].trim().to_string());
        }
    }

    let preview: String = response.chars().take(120).collect();
    Err(PipelineError::Extraction(format!(
        "no {} invocation in response starting {:?}",
        tool, preview
    )))
}

/// Strip shell-prompt and markdown decoration from a line
fn clean_line(line: &str) -> String {
    let mut cleaned = line.trim();
    cleaned = cleaned.strip_prefix("$ ").unwrap_or(cleaned);
    cleaned = cleaned.trim_matches('`').trim();
    cleaned.to_string()
}

/// Find the tool name at a token boundary followed by an argument
fn find_tool_boundary(line: &str, tool: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(rel) = line[search_from..].find(tool) {
        let pos = search_from + rel;
        let before_ok = pos == 0
            || line[..pos]
                .chars()
                .next_back()
                .map(|c| c.is_whitespace() || matches!(c, '`' | '"' | '\'' | '(' | ':'))
                .unwrap_or(true);
        let after = line[pos + tool.len()..].chars().next();
        let after_ok = matches!(after, Some(c) if c.is_whitespace());

        if before_ok && after_ok {
            return Some(pos);
        }
        search_from = pos + tool.len();
    }
    None
}
