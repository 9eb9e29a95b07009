/*!
 * Configured oracle client.
 *
 * Wraps one of the HTTP providers behind the `Oracle` trait and adds what the
 * raw clients leave out: request pacing, retries with exponential backoff and
 * rejection of empty answers.
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;

use crate::app_config::{OracleConfig, OracleProvider};
use crate::errors::ProviderError;
use crate::outline::rate_limit::RateLimiter;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::{Oracle, Provider};

/// Concrete provider selected by the configuration
#[derive(Debug)]
enum Backend {
    OpenAI(OpenAI),
    Anthropic(Anthropic),
    Ollama(Ollama),
}

/// Oracle backed by a configured HTTP provider
#[derive(Debug)]
pub struct OracleClient {
    backend: Backend,
    provider: OracleProvider,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry_count: u32,
    retry_backoff_ms: u64,
    limiter: RateLimiter,
}

impl OracleClient {
    /// Build the client for the active provider of `config`
    pub fn from_config(config: &OracleConfig) -> Self {
        let model = config.get_model();
        let endpoint = config.get_endpoint();
        let timeout_secs = config.get_timeout_secs();

        let backend = match config.provider {
            OracleProvider::OpenAI => Backend::OpenAI(OpenAI::new(
                config.get_api_key(),
                endpoint,
                model.clone(),
                timeout_secs,
            )),
            OracleProvider::Anthropic => Backend::Anthropic(Anthropic::new(
                config.get_api_key(),
                endpoint,
                model.clone(),
                timeout_secs,
            )),
            OracleProvider::Ollama => Backend::Ollama(Ollama::new(endpoint, timeout_secs)),
        };

        Self {
            backend,
            provider: config.provider,
            model,
            temperature: config.common.temperature,
            max_tokens: config.common.max_tokens,
            retry_count: config.common.retry_count,
            retry_backoff_ms: config.common.retry_backoff_ms,
            limiter: RateLimiter::per_minute(config.get_rate_limit()),
        }
    }

    /// Model requests are sent to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check that the provider is reachable and the credentials work
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.backend {
            Backend::OpenAI(client) => client.test_connection().await,
            Backend::Anthropic(client) => client.test_connection().await,
            Backend::Ollama(client) => client.test_connection().await,
        }
    }

    async fn generate_once(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let text = match &self.backend {
            Backend::OpenAI(client) => {
                let request = OpenAIRequest::new(&self.model)
                    .add_message("system", system)
                    .add_message("user", prompt)
                    .temperature(self.temperature)
                    .max_tokens(self.max_tokens);
                OpenAI::extract_text(&client.complete(request).await?)
            }
            Backend::Anthropic(client) => {
                let request = AnthropicRequest::new(&self.model, self.max_tokens)
                    .system(system)
                    .add_message("user", prompt)
                    .temperature(self.temperature);
                Anthropic::extract_text(&client.complete(request).await?)
            }
            Backend::Ollama(client) => {
                let request = GenerationRequest::new(&self.model, prompt)
                    .system(system)
                    .temperature(self.temperature)
                    .num_predict(self.max_tokens);
                Ollama::extract_text(&client.complete(request).await?)
            }
        };

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

#[async_trait]
impl Oracle for OracleClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            self.limiter.acquire().await;
            match self.generate_once(system, prompt).await {
                Ok(text) => {
                    debug!("{} returned {} chars", self.provider.display_name(), text.len());
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.retry_count => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} request failed ({}), retrying in {}ms - attempt {}/{}",
                        self.provider.display_name(),
                        e,
                        delay.as_millis(),
                        attempt + 1,
                        self.retry_count + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        self.provider.display_name()
    }
}
