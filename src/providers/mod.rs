/*!
 * Oracle provider implementations.
 *
 * This module contains client implementations for the text-generation
 * services the refinement pass can talk to:
 * - OpenAI: chat completions API
 * - Anthropic: messages API
 * - Ollama: local LLM server
 * - Mock: scripted oracle for tests
 *
 * Each HTTP client implements the typed `Provider` trait. The rest of the
 * crate only sees the `Oracle` trait: prompt in, text out.
 */

use async_trait::async_trait;
use log::error;
use reqwest::{Client, Response, StatusCode};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be wrapped interchangeably by the oracle client.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Opaque text-generation oracle.
///
/// One call is single-shot and stateless. Failures are reported as errors,
/// never as partial output.
#[async_trait]
pub trait Oracle: Send + Sync + Debug {
    /// Generate text for `prompt` under the given system prompt
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        (**self).generate(system, prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Build an HTTP client with the given request timeout
pub(crate) fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_default()
}

/// Map a transport error to a provider error
pub(crate) fn map_send_error(provider: &str, err: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(Duration::from_secs(timeout_secs))
    } else if err.is_connect() {
        ProviderError::ConnectionError(format!("{}: {}", provider, err))
    } else {
        ProviderError::RequestFailed(format!("Failed to send request to {} API: {}", provider, err))
    }
}

/// Turn a non-success HTTP status into a provider error
pub(crate) async fn check_status(provider: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    error!("{} API error ({}): {}", provider, status, error_text);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(error_text),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(error_text),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: error_text,
        },
    })
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub mod anthropic;
pub mod client;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use client::OracleClient;
pub use mock::{MockBehavior, MockOracle};
