/*!
 * Scene refinement merger.
 *
 * Every scene is sent to the oracle on its own and the answer is read back
 * into the enriched fields of the scene. Scenes are processed in batches:
 * all calls of a batch run concurrently and the batch settles before the next
 * one starts. Batch starts are paced by a `RateLimiter`.
 *
 * A scene whose call fails (or times out) keeps its original record. Only a
 * batch of two or more scenes in which every call failed aborts the pass; a
 * lone failing scene is never treated as a systemic failure.
 */

use futures::future::join_all;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{ProviderError, RefinementError, SceneFailure};
use crate::providers::Oracle;

use super::model::{assemble_outline, OutlineDocument, SceneRecord};
use super::prompts::{refinement_prompt, REFINEMENT_SYSTEM_PROMPT};
use super::rate_limit::RateLimiter;
use super::sections::read_sections;

/// Refinement settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinerOptions {
    /// Scenes per batch
    pub max_concurrency: usize,
    /// Minimum time between two batch starts
    pub batch_delay: Duration,
    /// Timeout for a single oracle call
    pub call_timeout: Duration,
    /// Fail the pass when every scene of a multi-scene batch fails
    pub abort_on_failed_batch: bool,
}

impl Default for RefinerOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            batch_delay: Duration::from_millis(1000),
            call_timeout: Duration::from_secs(60),
            abort_on_failed_batch: true,
        }
    }
}

impl From<crate::app_config::RefinementConfig> for RefinerOptions {
    fn from(config: crate::app_config::RefinementConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            abort_on_failed_batch: config.abort_on_failed_batch,
        }
    }
}

/// Result of a refinement pass
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    /// All scenes, sorted by number; failed scenes are unchanged
    pub scenes: Vec<SceneRecord>,
    /// Reassembled refined outline
    pub raw_refined_outline: String,
    /// Scenes that kept their original version
    pub failures: Vec<SceneFailure>,
    /// Aggregate warnings
    pub warnings: Vec<String>,
}

impl RefinementOutcome {
    /// Number of scenes whose refinement succeeded
    pub fn refined_count(&self) -> usize {
        self.scenes.len() - self.failures.len()
    }
}

/// Merge an oracle answer into a copy of `original`.
///
/// The scene keeps its number. Fields the answer does not restate keep their
/// original values, and `raw_content` is regenerated from the merged record.
/// An answer without any readable scene content is rejected.
pub fn merge_refinement(original: &SceneRecord, answer: &str) -> Result<SceneRecord, ProviderError> {
    let enriched = read_sections(answer);
    if enriched == Default::default() {
        return Err(ProviderError::ParseError(format!(
            "No scene content found in refinement of scene {}",
            original.number
        )));
    }

    let mut scene = original.clone();
    enriched.apply_to(&mut scene);
    scene.number = original.number;
    scene.raw_content = scene.render_block();
    Ok(scene)
}

/// Runs the refinement pass
#[derive(Debug, Clone)]
pub struct SceneRefiner {
    oracle: Arc<dyn Oracle>,
    options: RefinerOptions,
    limiter: RateLimiter,
}

impl SceneRefiner {
    pub fn new(oracle: Arc<dyn Oracle>, options: RefinerOptions) -> Self {
        let limiter = RateLimiter::new(options.batch_delay);
        Self {
            oracle,
            options,
            limiter,
        }
    }

    pub fn options(&self) -> &RefinerOptions {
        &self.options
    }

    /// Whether a batch outcome should abort the pass
    fn is_systemic_failure(&self, batch_len: usize, failed: usize) -> bool {
        self.options.abort_on_failed_batch && batch_len > 1 && failed == batch_len
    }

    /// Refine a single scene.
    pub async fn refine_scene(&self, scene: &SceneRecord) -> Result<SceneRecord, ProviderError> {
        let prompt = refinement_prompt(scene);
        let call = self.oracle.generate(REFINEMENT_SYSTEM_PROMPT, &prompt);

        let answer = match tokio::time::timeout(self.options.call_timeout, call).await {
            Ok(result) => result?,
            Err(_) => return Err(ProviderError::Timeout(self.options.call_timeout)),
        };

        merge_refinement(scene, &answer)
    }

    /// Refine the scenes of a document in place.
    ///
    /// On success the document holds the sorted, merged scenes and the
    /// reassembled refined text. On failure the document is left untouched.
    pub async fn refine(
        &self,
        document: &mut OutlineDocument,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> Result<RefinementOutcome, RefinementError> {
        let outcome = self
            .refine_scenes(&document.video_title, &document.scenes, progress_callback)
            .await?;

        document.scenes = outcome.scenes.clone();
        document.refined_text = Some(outcome.raw_refined_outline.clone());
        Ok(outcome)
    }

    /// Refine a scene sequence.
    pub async fn refine_scenes(
        &self,
        video_title: &str,
        scenes: &[SceneRecord],
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> Result<RefinementOutcome, RefinementError> {
        if scenes.is_empty() {
            return Err(RefinementError::NoScenes);
        }

        let batch_size = self.options.max_concurrency.max(1);
        let total = scenes.len();
        let total_batches = total.div_ceil(batch_size);
        let completed = AtomicUsize::new(0);

        let mut refined = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (batch_index, batch) in scenes.chunks(batch_size).enumerate() {
            self.limiter.acquire().await;
            info!(
                "Refining batch {}/{} ({} scene(s))",
                batch_index + 1,
                total_batches,
                batch.len()
            );

            let results = join_all(batch.iter().map(|scene| {
                let completed = &completed;
                let progress_callback = &progress_callback;
                async move {
                    let result = self.refine_scene(scene).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);
                    result
                }
            }))
            .await;

            let mut batch_failures = Vec::new();
            for (scene, result) in batch.iter().zip(results) {
                match result {
                    Ok(merged) => {
                        debug!("Refined scene {}: {}", merged.number, merged.title);
                        refined.push(merged);
                    }
                    Err(e) => {
                        warn!("Scene {} refinement failed, using original: {}", scene.number, e);
                        batch_failures.push(SceneFailure {
                            scene_number: scene.number,
                            message: e.to_string(),
                        });
                        refined.push(scene.clone());
                    }
                }
            }

            if self.is_systemic_failure(batch.len(), batch_failures.len()) {
                let err = RefinementError::BatchFailed {
                    batch: batch_index + 1,
                    failures: batch_failures,
                };
                error!("{}", err);
                return Err(err);
            }
            failures.extend(batch_failures);
        }

        refined.sort_by_key(|scene| scene.number);

        let mut warnings = Vec::new();
        if !failures.is_empty() {
            warnings.push(format!(
                "{} scene(s) had refinement errors, using original versions",
                failures.len()
            ));
        }

        let raw_refined_outline = assemble_outline(video_title, &refined);
        info!(
            "Refinement finished: {}/{} scene(s) refined",
            total - failures.len(),
            total
        );

        Ok(RefinementOutcome {
            scenes: refined,
            raw_refined_outline,
            failures,
            warnings,
        })
    }
}
