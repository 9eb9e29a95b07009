use async_trait::async_trait;
use log::error;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{check_status, http_client, join_url, map_send_error, Provider};

const PROVIDER_NAME: &str = "Ollama";

/// Client for a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// Base URL, e.g. `http://localhost:11434`
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// Generation request for `/api/generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// The model name
    pub model: String,

    /// The prompt to generate a response for
    pub prompt: String,

    /// System prompt overriding the model's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Streaming is always disabled by this client
    pub stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

/// Model parameters
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to predict
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Response from `/api/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub model: String,

    /// The generated text
    #[serde(default)]
    pub response: String,

    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub prompt_eval_count: Option<u64>,

    #[serde(default)]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            stream: false,
            options: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }
}

/// Parse a generate response body.
///
/// Some server versions answer in JSON lines even with streaming disabled; the
/// fragments are concatenated in that case.
pub fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(response);
    }

    let chunks: Vec<GenerationResponse> = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<GenerationResponse>(line).ok())
        .collect();

    let Some(last) = chunks.last() else {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API response. Raw response (first 500 chars): {}", preview);
        return Err(ProviderError::ParseError(
            "Ollama response contains invalid JSON".to_string(),
        ));
    };

    Ok(GenerationResponse {
        model: last.model.clone(),
        response: chunks.iter().map(|chunk| chunk.response.as_str()).collect(),
        done: true,
        prompt_eval_count: last.prompt_eval_count,
        eval_count: last.eval_count,
    })
}

impl Ollama {
    /// Create a client for a base URL such as `http://localhost:11434`
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            client: http_client(timeout_secs),
            timeout_secs,
        }
    }

    /// Server version, used to check connectivity
    pub async fn version(&self) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(join_url(&self.base_url, "api/version"))
            .send()
            .await
            .map_err(|e| map_send_error(PROVIDER_NAME, e, self.timeout_secs))?;

        let response = check_status(PROVIDER_NAME, response).await?;
        let version = response
            .json::<VersionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version: {}", e)))?;
        Ok(version.version)
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let response = self
            .client
            .post(join_url(&self.base_url, "api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(PROVIDER_NAME, e, self.timeout_secs))?;

        let response = check_status(PROVIDER_NAME, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read Ollama response: {}", e)))?;

        parse_generation_body(&body)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &GenerationResponse) -> String {
        response.response.clone()
    }
}
