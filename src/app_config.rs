use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), e.g. "ja"
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO), e.g. "zh-tw"
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Terminology dictionary file location
    #[serde(default = "default_terminology_path")]
    pub terminology_path: PathBuf,

    /// Directory holding the per-page translation cache
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; may also come from the GEMINI_API_KEY environment variable
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds; bounds the only blocking operation
    /// in a page's orchestration
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "zh-tw".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

/// Application data directory, falling back to the working directory when
/// the platform offers no data dir
fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("bubblefish"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_terminology_path() -> PathBuf {
    data_dir().join("terminology_dict.json")
}

fn default_cache_dir() -> PathBuf {
    data_dir().join("pages")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_language: default_target_language(),
            provider: ProviderConfig::default(),
            terminology_path: default_terminology_path(),
            cache_dir: default_cache_dir(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or fall back to defaults when the
    /// file does not exist
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<()> {
        language_utils::get_language_name(&self.source_language)
            .map_err(|_| anyhow!("Invalid source language code: {}", self.source_language))?;
        language_utils::get_language_name(&self.target_language)
            .map_err(|_| anyhow!("Invalid target language code: {}", self.target_language))?;

        if self.source_language == self.target_language {
            return Err(anyhow!(
                "Source and target languages are identical: {}",
                self.source_language
            ));
        }

        if self.provider.model.trim().is_empty() {
            return Err(anyhow!("Provider model must not be empty"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("Provider timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Resolve the API key, preferring the config value and falling back to
    /// the GEMINI_API_KEY environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.provider.api_key.trim().is_empty() {
            return Some(self.provider.api_key.clone());
        }
        std::env::var("GEMINI_API_KEY").ok().filter(|key| !key.trim().is_empty())
    }
}
