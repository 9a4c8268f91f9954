//! Configuration loading, validation, and management for digestr.
//!
//! Loads configuration from `~/.digestr/config.toml` with environment
//! variable overrides. Validates all settings at startup. Channel lists
//! live in a separate YAML file, see [`channels`].

pub mod channels;

pub use channels::ChannelList;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.digestr/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion backend (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion response
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,

    /// YAML file with channel lists and groups
    #[serde(default = "default_channels_file")]
    pub channels_file: String,

    /// Channels used when neither the CLI nor the channels file names any
    #[serde(default)]
    pub default_channels: Vec<String>,

    /// Chunking and map-reduce settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Prompt template selection
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Where posts are read from
    #[serde(default)]
    pub source: SourceConfig,

    /// Telegram delivery
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// File and console output
    #[serde(default)]
    pub output: OutputConfig,

    /// Digest presentation
    #[serde(default)]
    pub digest: DigestConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "cerebras".into()
}
fn default_model() -> String {
    "llama3.1-70b".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_response_tokens() -> u32 {
    4000
}
fn default_channels_file() -> String {
    "channels.yaml".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_response_tokens", &self.max_response_tokens)
            .field("channels_file", &self.channels_file)
            .field("default_channels", &self.default_channels)
            .field("processing", &self.processing)
            .field("prompt", &self.prompt)
            .field("source", &self.source)
            .field("telegram", &self.telegram)
            .field("output", &self.output)
            .field("digest", &self.digest)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("target", &self.target)
            .field("parse_mode", &self.parse_mode)
            .field("max_message_chars", &self.max_message_chars)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Chunking and map-reduce settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Token budget for one completion request; larger corpora are chunked
    #[serde(default = "default_max_tokens_per_chunk")]
    pub max_tokens_per_chunk: usize,

    /// Characters per token used by the size estimate
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// Upper bound on a single backend call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Chunks summarized at once in the map phase (1 = sequential)
    #[serde(default = "default_map_concurrency")]
    pub map_concurrency: usize,
}

fn default_max_tokens_per_chunk() -> usize {
    50_000
}
fn default_chars_per_token() -> usize {
    4
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_map_concurrency() -> usize {
    1
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: default_max_tokens_per_chunk(),
            chars_per_token: default_chars_per_token(),
            request_timeout_secs: default_request_timeout_secs(),
            map_concurrency: default_map_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Named prompt template
    #[serde(default = "default_template")]
    pub template: String,

    /// Replace the template's system prompt with this text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,

    /// Read the system prompt from this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<String>,
}

fn default_template() -> String {
    "telegram".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            system_prompt_override: None,
            system_prompt_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Where posts come from; one of `SOURCE_KINDS`
    #[serde(default = "default_source_kind")]
    pub kind: String,

    /// Directory holding Telegram Desktop JSON exports
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_source_kind() -> String {
    "telegram_export".into()
}
fn default_export_dir() -> String {
    "exports".into()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            export_dir: default_export_dir(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Default chat to post digests to (e.g. `@my_digest_channel`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// "plain", "html" or "markdown_v2"
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,

    /// Split digests longer than this into several messages
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

fn default_parse_mode() -> String {
    "plain".into()
}
fn default_max_message_chars() -> usize {
    4000
}
fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            target: None,
            parse_mode: default_parse_mode(),
            max_message_chars: default_max_message_chars(),
            api_url: default_telegram_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for auto-named digest files (current directory if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Echo digests to stdout
    #[serde(default = "default_true")]
    pub console: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            console: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Title shown in the digest header
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "ML/AI Digest".into()
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

const PARSE_MODES: [&str; 3] = ["plain", "html", "markdown_v2"];

/// Message sources this build can construct.
pub const SOURCE_KINDS: [&str; 1] = ["telegram_export"];

impl AppConfig {
    /// Load configuration from the default path (~/.digestr/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognized keys:
    /// - `DIGESTR_API_KEY`, `CEREBRAS_API_KEY`, `OPENAI_API_KEY` (first wins, only if unset in file)
    /// - `DIGESTR_PROVIDER`
    /// - `DIGESTR_MODEL`, `CEREBRAS_MODEL` (also replaces the default provider's `default_model`)
    /// - `TEMPERATURE`, `MAX_TOKENS_RESPONSE`, `MAX_TOKENS_PER_CHUNK`
    /// - `TELEGRAM_BOT_TOKEN`, `OUTPUT_TELEGRAM_CHANNEL`
    /// - `DIGESTR_EXPORT_DIR`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(k).filter(|v| !v.is_empty()));

        if self.api_key.is_none() {
            self.api_key = first(&["DIGESTR_API_KEY", "CEREBRAS_API_KEY", "OPENAI_API_KEY"]);
        }
        if let Some(provider) = first(&["DIGESTR_PROVIDER"]) {
            self.default_provider = provider;
        }
        if let Some(model) = first(&["DIGESTR_MODEL", "CEREBRAS_MODEL"]) {
            if let Some(provider) = self.providers.get_mut(&self.default_provider) {
                provider.default_model = Some(model.clone());
            }
            self.default_model = model;
        }
        if let Some(raw) = first(&["TEMPERATURE"]) {
            self.temperature = parse_env("TEMPERATURE", &raw)?;
        }
        if let Some(raw) = first(&["MAX_TOKENS_RESPONSE"]) {
            self.max_response_tokens = parse_env("MAX_TOKENS_RESPONSE", &raw)?;
        }
        if let Some(raw) = first(&["MAX_TOKENS_PER_CHUNK"]) {
            self.processing.max_tokens_per_chunk = parse_env("MAX_TOKENS_PER_CHUNK", &raw)?;
        }
        if let Some(token) = first(&["TELEGRAM_BOT_TOKEN"]) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(target) = first(&["OUTPUT_TELEGRAM_CHANNEL"]) {
            self.telegram.target = Some(target);
        }
        if let Some(dir) = first(&["DIGESTR_EXPORT_DIR"]) {
            self.source.export_dir = dir;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".digestr")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.processing.chars_per_token == 0 {
            return Err(ConfigError::ValidationError(
                "processing.chars_per_token must be at least 1".into(),
            ));
        }

        if self.processing.max_tokens_per_chunk == 0 {
            return Err(ConfigError::ValidationError(
                "processing.max_tokens_per_chunk must be at least 1".into(),
            ));
        }

        if self.processing.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "processing.request_timeout_secs must be at least 1".into(),
            ));
        }

        if self.processing.map_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "processing.map_concurrency must be at least 1".into(),
            ));
        }

        if !SOURCE_KINDS.contains(&self.source.kind.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "source.kind must be one of {}, got '{}'",
                SOURCE_KINDS.join(", "),
                self.source.kind
            )));
        }

        if !PARSE_MODES.contains(&self.telegram.parse_mode.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "telegram.parse_mode must be one of {}, got '{}'",
                PARSE_MODES.join(", "),
                self.telegram.parse_mode
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_response_tokens: default_max_response_tokens(),
            channels_file: default_channels_file(),
            default_channels: vec![],
            processing: ProcessingConfig::default(),
            prompt: PromptConfig::default(),
            source: SourceConfig::default(),
            telegram: TelegramConfig::default(),
            output: OutputConfig::default(),
            digest: DigestConfig::default(),
            providers: HashMap::new(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} has an invalid value: '{raw}'")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Channel group '{group}' not found (available: {available})")]
    UnknownGroup { group: String, available: String },
}
