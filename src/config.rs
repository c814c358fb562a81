use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Where the finished manuscript file is written.
    #[serde(default = "default_output")]
    pub output_folder: String,

    pub llm: LlmConfig,

    #[serde(default)]
    pub interview: InterviewConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub anthropic: Option<AnthropicConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Point this at a relay endpoint to keep the credential server-side.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InterviewConfig {
    /// Author responses gathered before the outline step is offered.
    #[serde(default = "default_ready_threshold")]
    pub ready_threshold: usize,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self { ready_threshold: default_ready_threshold() }
    }
}

fn default_output() -> String {
    "output".to_string()
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_ready_threshold() -> usize {
    8
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config.yml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)
            .with_context(|| format!("Failed to create output folder: {}", self.output_folder))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_applies_defaults() {
        let yaml = r#"
llm:
  anthropic:
    api_key: "sk-test"
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.output_folder, "output");
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.interview.ready_threshold, 8);

        let anthropic = config.llm.anthropic.unwrap();
        assert_eq!(anthropic.model, DEFAULT_MODEL);
        assert_eq!(anthropic.base_url, "https://api.anthropic.com");
        assert_eq!(anthropic.max_tokens, 4096);
    }

    #[test]
    fn test_overrides_are_honored() {
        let yaml = r#"
output_folder: drafts
llm:
  provider: anthropic
  anthropic:
    api_key: "sk-test"
    base_url: "http://localhost:3000"
    max_tokens: 2048
interview:
  ready_threshold: 3
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.output_folder, "drafts");
        assert_eq!(config.interview.ready_threshold, 3);
        let anthropic = config.llm.anthropic.unwrap();
        assert_eq!(anthropic.base_url, "http://localhost:3000");
        assert_eq!(anthropic.max_tokens, 2048);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(dir.path().join("config.yml"));
        assert!(result.is_err());
    }
}
