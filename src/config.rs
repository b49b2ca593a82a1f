//! Pipeline configuration
//!
//! TOML file loaded from `~/.mediapilot/config.toml` (created with defaults
//! on first run). `${VAR}` placeholders anywhere in the file are expanded
//! from the environment before parsing; unset variables are left as-is so
//! the error points at the placeholder instead of an empty path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub sanitizer: SanitizerConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model used for command synthesis
    pub primary: String,

    /// Tried once when the primary fails at the transport level
    pub fallback: Option<String>,

    /// Ollama endpoint
    pub base_url: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            primary: crate::llm::client::DEFAULT_MODEL.to_string(),
            fallback: None,
            base_url: crate::llm::client::DEFAULT_OLLAMA_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Wall-clock timeout for the external media tool
    pub tool_timeout_secs: u64,

    /// Request timeout for the model call
    pub llm_timeout_secs: u64,

    /// Completion token ceiling for the model call
    pub llm_max_tokens: usize,

    /// Sampling temperature for synthesis
    pub temperature: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 120,
            llm_timeout_secs: 30,
            llm_max_tokens: crate::llm::client::DEFAULT_MAX_TOKENS,
            temperature: crate::llm::client::SYNTHESIS_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Master toggle for output sanitization
    pub enabled: bool,

    /// Retained-token budget for tool output
    pub max_output_tokens: usize,

    /// Field allow-list for structured (JSON) output
    pub keep_fields: Vec<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_output_tokens: 500,
            keep_fields: vec!["format".to_string(), "streams".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned at startup to seed the registry
    pub source_dir: PathBuf,

    /// Scratch space for intermediate files
    pub temp_dir: PathBuf,

    /// Default destination directory
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("media");
        Self {
            source_dir: base.join("source"),
            temp_dir: base.join("tmp"),
            output_dir: base.join("output"),
        }
    }
}

impl Config {
    /// Load configuration, creating the default file if it doesn't exist
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            let config = Config::default();
            config.save(&config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let expanded = expand_env(&contents);

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

        Ok(config)
    }

    /// Save configuration to the given path
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".mediapilot").join("config.toml"))
    }
}

/// Expand `${VAR}` placeholders from the environment
///
/// Unset variables keep their placeholder text.
pub fn expand_env(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push_str("${");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.models.primary, crate::llm::client::DEFAULT_MODEL);
        assert!(config.models.fallback.is_none());
        assert!(config.sanitizer.enabled);
        assert_eq!(config.limits.tool_timeout_secs, 120);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.limits.llm_max_tokens, 256);
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.models.primary = "llama3.1:8b".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.models.primary, "llama3.1:8b");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[models]\nprimary = \"qwen2.5:3b\"\nbase_url = \"http://127.0.0.1:11434\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.models.primary, "qwen2.5:3b");
        // Untouched tables come from defaults
        assert_eq!(config.sanitizer.max_output_tokens, 500);
    }

    #[test]
    fn test_expand_env_substitutes() {
        std::env::set_var("MEDIAPILOT_TEST_DIR", "/srv/media");
        let expanded = expand_env("source_dir = \"${MEDIAPILOT_TEST_DIR}/in\"");
        assert_eq!(expanded, "source_dir = \"/srv/media/in\"");
        std::env::remove_var("MEDIAPILOT_TEST_DIR");
    }

    #[test]
    fn test_expand_env_unset_left_alone() {
        let input = "dir = \"${MEDIAPILOT_DEFINITELY_UNSET}\"";
        assert_eq!(expand_env(input), input);
    }

    #[test]
    fn test_expand_env_multiple() {
        std::env::set_var("MP_A", "1");
        std::env::set_var("MP_B", "2");
        assert_eq!(expand_env("${MP_A}-${MP_B}"), "1-2");
        std::env::remove_var("MP_A");
        std::env::remove_var("MP_B");
    }

    #[test]
    fn test_expand_env_unterminated() {
        assert_eq!(expand_env("x ${broken"), "x ${broken");
    }

    #[test]
    fn test_config_with_env_in_file() {
        std::env::set_var("MEDIAPILOT_SRC", "/srv/incoming");
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[paths]\nsource_dir = \"${MEDIAPILOT_SRC}\"\ntemp_dir = \"/tmp\"\noutput_dir = \"/out\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.paths.source_dir, PathBuf::from("/srv/incoming"));
        std::env::remove_var("MEDIAPILOT_SRC");
    }
}
