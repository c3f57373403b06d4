//! Configuration file handling.
//!
//! This module handles loading `.journeydash.toml` and merging it with
//! command-line arguments.

use crate::assistant::{AssistantConfig, DEFAULT_API_URL};
use crate::state::DEFAULT_STORAGE_KEY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".journeydash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Where the dashboard state is kept.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat assistant settings.
    #[serde(default)]
    pub assistant: AssistantSettings,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// State storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the state file.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// Key (file stem) the aggregate is stored under.
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// Keep state in memory only.
    #[serde(default)]
    pub ephemeral: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: default_storage_key(),
            ephemeral: false,
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".journeydash")
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

/// Gemini assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSettings {
    /// generateContent endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key. Prefer the GEMINI_API_KEY environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout() -> u64 {
    30
}

impl From<&AssistantSettings> for AssistantConfig {
    fn from(settings: &AssistantSettings) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout_seconds: settings.timeout_seconds,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence over
    /// config file settings, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.state_dir {
            self.storage.dir = dir.clone();
        }
        if args.ephemeral {
            self.storage.ephemeral = true;
        }

        if let Some(ref key) = args.api_key {
            self.assistant.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.assistant.timeout_seconds = timeout;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level from the merged settings. `quiet` overrides `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.key, "healthcare_analytics_state");
        assert_eq!(config.storage.dir, PathBuf::from(".journeydash"));
        assert!(!config.storage.ephemeral);
        assert_eq!(config.assistant.max_tokens, 1000);
        assert!(config.assistant.api_key.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[storage]
dir = "/tmp/dash"

[assistant]
api_key = "abc"
temperature = 0.2
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.storage.dir, PathBuf::from("/tmp/dash"));
        assert_eq!(config.storage.key, "healthcare_analytics_state");
        assert_eq!(config.assistant.api_key.as_deref(), Some("abc"));
        assert_eq!(config.assistant.temperature, 0.2);
        assert_eq!(config.assistant.timeout_seconds, 30);
        assert!(config.assistant.api_url.contains("gemini-pro:generateContent"));
    }

    #[test]
    fn test_assistant_config_conversion() {
        let mut settings = AssistantSettings::default();
        settings.api_key = Some("k".to_string());
        let config = AssistantConfig::from(&settings);
        assert_eq!(config.usable_api_key(), Some("k"));
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[assistant]"));
        assert!(!toml_str.contains("api_key"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.storage.key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_log_level_follows_file_and_flags() {
        use clap::Parser;

        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        config.general.verbose = false;
        assert_eq!(config.log_level(false), tracing::Level::WARN);

        let args = crate::cli::Args::try_parse_from(["journeydash", "list", "-v"]).unwrap();
        config.merge_with_args(&args);
        assert_eq!(config.log_level(args.quiet), tracing::Level::DEBUG);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[storage]\nephemeral = true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.storage.ephemeral);
        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
