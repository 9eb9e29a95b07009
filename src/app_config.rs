use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::outline::prompts::{Complexity, Depth};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Oracle provider settings
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Refinement pass settings
    #[serde(default)]
    pub refinement: RefinementConfig,

    /// Validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Defaults for outline generation
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Oracle provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    // @provider: OpenAI chat completions
    #[default]
    OpenAI,
    // @provider: Anthropic messages API
    Anthropic,
    // @provider: Ollama (local LLM)
    Ollama,
}

impl OracleProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    // @returns: Environment variable consulted when no API key is configured
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }
}

impl std::fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for OracleProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: HTTP timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    // @param provider: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider: OracleProvider) -> Self {
        Self {
            provider_type: provider.to_lowercase_string(),
            model: default_model(provider),
            api_key: String::new(),
            endpoint: default_endpoint(provider),
            timeout_secs: default_timeout_secs(),
            rate_limit: default_rate_limit(provider),
        }
    }
}

/// Oracle service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OracleConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: OracleProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: OracleCommonConfig,
}

/// Settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OracleCommonConfig {
    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff for retries in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OracleCommonConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Refinement pass configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefinementConfig {
    /// Scenes refined concurrently per batch
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Minimum delay between the starts of two batches, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Timeout applied to every oracle call, in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Fail the whole pass when every scene of a multi-scene batch fails
    #[serde(default = "default_true")]
    pub abort_on_failed_batch: bool,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            batch_delay_ms: default_batch_delay_ms(),
            call_timeout_secs: default_call_timeout_secs(),
            abort_on_failed_batch: true,
        }
    }
}

/// Validation thresholds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationConfig {
    /// Plans shorter than this many characters get a suggestion
    #[serde(default = "default_min_plan_chars")]
    pub min_plan_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_plan_chars: default_min_plan_chars(),
        }
    }
}

/// Defaults for first-pass outline generation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default)]
    pub complexity: Complexity,

    #[serde(default)]
    pub depth: Depth,

    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            complexity: Complexity::default(),
            depth: Depth::default(),
            style: default_style(),
        }
    }
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

fn default_max_concurrency() -> usize {
    4
}

fn default_batch_delay_ms() -> u64 {
    1000 // one second between batch starts
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_min_plan_chars() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.4
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_style() -> String {
    "clean and modern".to_string()
}

fn default_model(provider: OracleProvider) -> String {
    match provider {
        OracleProvider::OpenAI => "gpt-4o-mini".to_string(),
        OracleProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
        OracleProvider::Ollama => "llama3.2:3b".to_string(),
    }
}

fn default_endpoint(provider: OracleProvider) -> String {
    match provider {
        OracleProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        OracleProvider::Anthropic => "https://api.anthropic.com".to_string(),
        OracleProvider::Ollama => "http://localhost:11434".to_string(),
    }
}

fn default_rate_limit(provider: OracleProvider) -> Option<u32> {
    match provider {
        OracleProvider::OpenAI => Some(60),
        OracleProvider::Anthropic => Some(45), // below the 50 rpm tier limit
        OracleProvider::Ollama => None,
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.refinement.max_concurrency == 0 {
            return Err(anyhow!("refinement.max_concurrency must be at least 1"));
        }

        if self.refinement.call_timeout_secs == 0 {
            return Err(anyhow!("refinement.call_timeout_secs must be at least 1"));
        }

        Ok(())
    }

    /// Validate that the active provider can actually be called
    pub fn validate_oracle(&self) -> Result<()> {
        let provider = self.oracle.provider;
        if provider.api_key_env_var().is_some() && self.oracle.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider (set it in the config or {})",
                provider.display_name(),
                provider.api_key_env_var().unwrap_or_default()
            ));
        }

        let endpoint = self.oracle.get_endpoint();
        let url = Url::parse(&endpoint)
            .map_err(|e| anyhow!("Invalid endpoint for {} provider: {} ({})", provider.display_name(), endpoint, e))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(anyhow!(
                "Endpoint for {} provider must be an http(s) URL with a host: {}",
                provider.display_name(),
                endpoint
            ));
        }
        Ok(())
    }
}

impl OracleConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get the active provider configuration for in-place edits
    pub fn get_active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider: &OracleProvider) -> Option<&ProviderConfig> {
        let provider_str = provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(config) if !config.model.is_empty() => config.model.clone(),
            _ => default_model(self.provider),
        }
    }

    /// Get the API key for the active provider, falling back to the environment
    pub fn get_api_key(&self) -> String {
        if let Some(config) = self.get_active_provider_config() {
            if !config.api_key.is_empty() {
                return config.api_key.clone();
            }
        }

        self.provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(config) if !config.endpoint.is_empty() => config.endpoint.clone(),
            _ => default_endpoint(self.provider),
        }
    }

    /// Get the HTTP timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(config) if config.timeout_secs > 0 => config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }

    /// Get the rate limit for the active provider
    pub fn get_rate_limit(&self) -> Option<u32> {
        match self.get_active_provider_config() {
            Some(config) => config.rate_limit,
            None => default_rate_limit(self.provider),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: OracleProvider::default(),
            available_providers: vec![
                ProviderConfig::new(OracleProvider::OpenAI),
                ProviderConfig::new(OracleProvider::Anthropic),
                ProviderConfig::new(OracleProvider::Ollama),
            ],
            common: OracleCommonConfig::default(),
        }
    }
}
