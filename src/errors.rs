/*!
 * Error types for the scenecraft application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Structural and quality findings of the validator are never errors in this
 * sense: they are collected into a `ValidationReport` instead.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to an oracle provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not settle within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered, but with nothing usable
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether retrying the same request could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) | Self::AuthenticationError(_) | Self::EmptyResponse => false,
        }
    }
}

/// A single scene whose refinement call failed
#[derive(Debug, Clone)]
pub struct SceneFailure {
    /// Declared number of the scene
    pub scene_number: u32,
    /// Rendered provider error
    pub message: String,
}

/// Errors that abort the whole refinement phase
#[derive(Error, Debug)]
pub enum RefinementError {
    /// Nothing to refine
    #[error("No scenes found in outline for refinement")]
    NoScenes,

    /// Every oracle call of one batch failed
    #[error("All {} scene(s) in refinement batch {} failed: {}", .failures.len(), .batch, summarize(.failures))]
    BatchFailed {
        /// 1-based batch index
        batch: usize,
        /// Failures of that batch
        failures: Vec<SceneFailure>,
    },
}

fn summarize(failures: &[SceneFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("scene {}: {}", f.scene_number, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
