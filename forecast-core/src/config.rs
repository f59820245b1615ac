use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::TimeSlot;

/// Environment variable holding the CWA open data key.
pub const API_KEY_ENV: &str = "API_KEY";

pub const DEFAULT_ENDPOINT: &str =
    "https://opendata.cwa.gov.tw/api/v1/rest/datastore/F-C0032-001";

/// Settings for `forecast fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_city")]
    pub city: String,

    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    #[serde(default)]
    pub time_slot: TimeSlot,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_city() -> String {
    "臺中市".to_string()
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("weather_data.csv")
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            csv_path: default_csv_path(),
            time_slot: TimeSlot::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings for `forecast ask` and its Ollama backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Number of documents handed to the model per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("weather_data.json")
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_chat_model() -> String {
    "gemma3:4b".to_string()
}

const fn default_top_k() -> usize {
    4
}

const fn default_llm_timeout_secs() -> u64 {
    120
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            base_url: default_ollama_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            top_k: default_top_k(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "CWA-XXXXXXXX"
///
/// [fetch]
/// city = "臺北市"
///
/// [assistant]
/// chat_model = "gemma3:4b"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// CWA open data key. `API_KEY` in the environment takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            fetch: FetchConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("tw", "cwa-forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Overlay values from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key, if present.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn is_api_key_configured(&self) -> bool {
        self.api_key().is_some()
    }
}
