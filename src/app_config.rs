use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language name (free form, used in prompts)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language name (free form, used in prompts)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Task configuration for content translation
    #[serde(default)]
    pub content: TaskConfig,

    /// Task configuration for title translation
    #[serde(default)]
    pub title: TitleConfig,

    /// Task configuration for retry rounds
    #[serde(default = "default_retry_task")]
    pub retry: TaskConfig,

    /// Optional segment filtering applied before dispatch
    #[serde(default)]
    pub filtering: FilterConfig,

    /// Directory for run logs
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Directory for translated output and failure reports
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    // @provider: OpenAI-compatible chat completion APIs (OpenAI, DeepSeek, ...)
    #[default]
    OpenAi,
    // @provider: Google Gemini API
    Gemini,
    // @provider: Google Vertex AI
    Vertex,
}

impl Provider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Gemini",
            Self::Vertex => "Vertex AI",
        }
    }

    // @returns: Lowercase provider identifier (secret store key)
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAi => "openai".to_string(),
            Self::Gemini => "gemini".to_string(),
            Self::Vertex => "vertex".to_string(),
        }
    }

    // @returns: Short SDK code used in log and output file names
    pub fn sdk_code(&self) -> &'static str {
        match self {
            Self::OpenAi => "oai",
            Self::Gemini => "gmn",
            Self::Vertex => "vtx",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "vertex" => Ok(Self::Vertex),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Configuration for one logical dispatch task (content, title or retry).
///
/// Distinct tasks may target entirely different providers; the retry task in
/// particular often runs a different model at lower concurrency.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskConfig {
    // @field: Provider backing this task
    #[serde(default)]
    pub provider: Provider,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: Max completion tokens per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    // @field: Max simultaneous in-flight requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Minimum delay between successive dispatches (ms)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    // @field: Extra retry rounds after the first pass
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    // @field: Request timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Thinking-token budget for models that support it; 0 disables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            concurrent_requests: default_concurrent_requests(),
            request_delay_ms: default_request_delay_ms(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            thinking_budget: None,
        }
    }
}

impl TaskConfig {
    /// Resolve the model name, falling back to the provider default
    pub fn model_name(&self) -> String {
        if !self.model.is_empty() {
            return self.model.clone();
        }
        match self.provider {
            Provider::OpenAi => default_openai_model(),
            Provider::Gemini => default_gemini_model(),
            Provider::Vertex => default_gemini_model(),
        }
    }

    /// Validate one task configuration
    pub fn validate(&self, task_name: &str) -> Result<(), crate::errors::ConfigError> {
        use crate::errors::ConfigError;

        if self.concurrent_requests == 0 {
            return Err(ConfigError::InvalidTask {
                task: task_name.to_string(),
                reason: "concurrent_requests must be at least 1".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTask {
                task: task_name.to_string(),
                reason: format!("temperature {} outside 0.0..=2.0", self.temperature),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidTask {
                task: task_name.to_string(),
                reason: "max_tokens must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Title translation settings; disabled tasks skip the title pass entirely
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TitleConfig {
    /// Whether to translate chapter titles
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Task configuration for the title pass
    #[serde(flatten)]
    pub task: TaskConfig,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            task: TaskConfig {
                // Titles are short and rarely parallel-bound
                concurrent_requests: 2,
                request_delay_ms: 3000,
                ..TaskConfig::default()
            },
        }
    }
}

/// Segment filtering mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// No filtering, translate every record
    #[default]
    Off,
    /// Keep records whose chapter number falls in the range
    Chapter,
    /// Keep records by position in the file
    Segment,
}

/// Optional pre-dispatch filtering of segment records
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FilterConfig {
    /// Filtering mode
    #[serde(default)]
    pub mode: FilterMode,

    /// First chapter to keep (inclusive), chapter mode
    #[serde(default)]
    pub start_chapter: Option<u32>,

    /// Last chapter to keep (inclusive), chapter mode
    #[serde(default)]
    pub end_chapter: Option<u32>,

    /// First record position to keep (inclusive, 1-based), segment mode
    #[serde(default)]
    pub start_segment: Option<usize>,

    /// Last record position to keep (inclusive, 1-based), segment mode
    #[serde(default)]
    pub end_segment: Option<usize>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "Chinese".to_string()
}

fn default_target_language() -> String {
    "Vietnamese".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_openai_model() -> String {
    "deepseek-chat".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_retry_task() -> TaskConfig {
    TaskConfig {
        // Retry rounds run narrower to avoid re-tripping rate limits
        concurrent_requests: 2,
        request_delay_ms: 2000,
        ..TaskConfig::default()
    }
}

impl Config {
    /// Load configuration from a JSON file, creating a default file if absent
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            log::info!("Created default configuration at {}", path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        self.content.validate("content")?;
        self.retry.validate("retry")?;
        if self.title.enabled {
            self.title.task.validate("title")?;
        }
        Ok(())
    }

    /// Providers that credentials must exist for, given the enabled tasks
    pub fn required_providers(&self) -> Vec<Provider> {
        let mut providers = vec![self.content.provider, self.retry.provider];
        if self.title.enabled {
            providers.push(self.title.task.provider);
        }
        providers.sort_by_key(|p| p.to_lowercase_string());
        providers.dedup();
        providers
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            content: TaskConfig::default(),
            title: TitleConfig::default(),
            retry: default_retry_task(),
            filtering: FilterConfig::default(),
            log_dir: default_log_dir(),
            output_dir: default_output_dir(),
            log_level: LogLevel::default(),
        }
    }
}
