/*!
 * Mock oracle for testing.
 *
 * This module provides a scripted oracle that simulates different behaviors:
 * - `MockOracle::working()` - Always answers with an enriched scene block
 * - `MockOracle::intermittent(n)` - Fails every n-th request
 * - `MockOracle::failing()` - Always fails with an error
 * - `MockOracle::slow(ms)` - Answers after a delay (for timeout testing)
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::outline::model::{SCENE_END, SCENE_START};
use crate::outline::parser::parse_header;
use crate::providers::Oracle;

/// One request seen by the mock
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub system: String,
    pub prompt: String,
}

impl MockRequest {
    /// Scene number of the first scene header found in the prompt
    pub fn scene_number(&self) -> Option<u32> {
        self.prompt.lines().find_map(|line| parse_header(line).map(|h| h.number))
    }

    /// The scene block embedded in the prompt, delimiters included
    pub fn scene_block(&self) -> Option<String> {
        let start = self.prompt.find(SCENE_START)?;
        let rest = &self.prompt[start..];
        let end = rest.find(SCENE_END)? + SCENE_END.len();
        Some(rest[..end].to_string())
    }
}

/// Behavior mode for the mock oracle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Scripted oracle
#[derive(Debug, Clone)]
pub struct MockOracle {
    behavior: MockBehavior,
    /// Shared between clones
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Scenes whose requests always fail
    failing_scenes: Vec<u32>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
}

impl MockOracle {
    /// Create a new mock oracle with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            failing_scenes: Vec::new(),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Fail every request about one of `scenes`
    pub fn failing_for_scenes(mut self, scenes: &[u32]) -> Self {
        self.failing_scenes = scenes.to_vec();
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were in progress at the same time
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Copy of every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Enrich the scene block found in a refinement prompt.
    ///
    /// Scene `n` gets the precise object `object_n`, exports it and imports
    /// `object_{n-1}`, so a fully refined outline has resolvable hooks.
    pub fn enriched_scene(request: &MockRequest) -> String {
        let number = request.scene_number().unwrap_or(0);
        let block = request
            .scene_block()
            .unwrap_or_else(|| format!("{} {} | Scene {}---\n{}", SCENE_START, number, number, SCENE_END));
        let body = block.trim_end().trim_end_matches(SCENE_END).trim_end();
        let import = if number > 1 {
            format!("object_{}", number - 1)
        } else {
            String::new()
        };

        format!(
            "{body}\n\
             **Precise objects (named ids):**\n\
             - object_{number}\n\
             **Ordered animation steps:**\n\
             - Create object_{number}\n\
             - FadeIn the label\n\
             **Timing hints:**\n\
             - 2 seconds per step\n\
             **Continuity hooks:**\n\
             export: [object_{number}]\n\
             import: [{import}]\n\
             **Tech notes (Manim classes/methods):**\n\
             - Use Create and FadeIn\n\
             {SCENE_END}"
        )
    }

    async fn respond(&self, request: &MockRequest, count: usize) -> Result<String, ProviderError> {
        if let Some(number) = request.scene_number() {
            if self.failing_scenes.contains(&number) {
                return Err(ProviderError::ApiError {
                    message: format!("Simulated failure for scene {}", number),
                    status_code: 500,
                });
            }
        }

        let answer = |request: &MockRequest| match self.custom_response {
            Some(generator) => generator(request),
            None => Self::enriched_scene(request),
        };

        match self.behavior {
            MockBehavior::Working => Ok(answer(request)),
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(answer(request))
                }
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::Empty => Err(ProviderError::EmptyResponse),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(answer(request))
            }
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let request = MockRequest {
            system: system.to_string(),
            prompt: prompt.to_string(),
        };
        self.requests.lock().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        // Yield so that concurrently started calls overlap
        tokio::task::yield_now().await;

        let result = self.respond(&request, count).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}
