/*!
 * Integration tests for the refinement pass against the mock oracle
 */

use std::sync::Arc;
use std::time::Duration;

use scenecraft::errors::RefinementError;
use scenecraft::outline::model::SceneRecord;
use scenecraft::outline::parser::{parse_outline, parse_refined_outline};
use scenecraft::outline::validator::validate_outline;
use scenecraft::outline::{RefinerOptions, SceneRefiner};
use scenecraft::providers::MockOracle;

use crate::common::{build_scene, DEMORGAN_OUTLINE};

fn options(max_concurrency: usize) -> RefinerOptions {
    RefinerOptions {
        max_concurrency,
        batch_delay: Duration::ZERO,
        call_timeout: Duration::from_secs(30),
        abort_on_failed_batch: true,
    }
}

fn first_pass_scenes(count: u32) -> Vec<SceneRecord> {
    (1..=count)
        .map(|n| {
            let mut scene = build_scene(n);
            scene.ordered_steps = None;
            scene.tech_notes = None;
            scene.raw_content = scene.render_block();
            scene
        })
        .collect()
}

/// A single failing scene keeps its original form and is counted once
#[tokio::test]
async fn test_single_failure_should_not_drop_scenes() {
    let scenes = first_pass_scenes(6);

    for failing in 1..=6u32 {
        let oracle = MockOracle::working().failing_for_scenes(&[failing]);
        let refiner = SceneRefiner::new(Arc::new(oracle), options(3));

        let outcome = refiner
            .refine_scenes("Resilience", &scenes, |_, _| {})
            .await
            .expect("one failure per batch must not abort");

        assert_eq!(outcome.scenes.len(), 6);
        assert_eq!(outcome.scenes[failing as usize - 1], scenes[failing as usize - 1]);
        for scene in outcome.scenes.iter().filter(|s| s.number != failing) {
            assert!(scene.is_enriched(), "scene {} was not refined", scene.number);
        }
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.refined_count(), 5);
        assert_eq!(
            outcome.warnings,
            vec!["1 scene(s) had refinement errors, using original versions".to_string()]
        );
    }
}

/// A failing scene alone in the trailing batch keeps the pass alive
#[tokio::test]
async fn test_failure_in_trailing_single_scene_batch_should_not_abort() {
    let scenes = first_pass_scenes(5);
    let refiner = SceneRefiner::new(
        Arc::new(MockOracle::working().failing_for_scenes(&[5])),
        RefinerOptions {
            batch_delay: Duration::ZERO,
            ..RefinerOptions::default()
        },
    );

    let outcome = refiner
        .refine_scenes("Trailing", &scenes, |_, _| {})
        .await
        .expect("a lone failing scene must not abort");

    assert_eq!(outcome.scenes.len(), 5);
    assert_eq!(outcome.scenes[4], scenes[4]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].scene_number, 5);
    assert_eq!(outcome.refined_count(), 4);
}

/// A one-scene outline whose call fails keeps its original scene
#[tokio::test]
async fn test_failure_in_single_scene_outline_should_keep_original() {
    let scenes = first_pass_scenes(1);
    let refiner = SceneRefiner::new(Arc::new(MockOracle::working().failing_for_scenes(&[1])), options(4));

    let outcome = refiner
        .refine_scenes("Alone", &scenes, |_, _| {})
        .await
        .expect("a lone failing scene must not abort");

    assert_eq!(outcome.scenes, scenes);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(
        outcome.warnings,
        vec!["1 scene(s) had refinement errors, using original versions".to_string()]
    );
}

/// Never more calls in flight than the configured concurrency
#[tokio::test(start_paused = true)]
async fn test_concurrency_should_be_bounded() {
    let scenes = first_pass_scenes(10);
    let oracle = Arc::new(MockOracle::slow(200));
    let refiner = SceneRefiner::new(oracle.clone(), options(3));

    let outcome = refiner.refine_scenes("Bounded", &scenes, |_, _| {}).await.unwrap();

    assert_eq!(outcome.refined_count(), 10);
    assert_eq!(oracle.request_count(), 10);
    assert_eq!(oracle.max_concurrent_requests(), 3);
}

/// Output is sorted by scene number whatever the input order
#[tokio::test]
async fn test_output_should_be_sorted_by_number() {
    let mut scenes = first_pass_scenes(5);
    scenes.reverse();
    let refiner = SceneRefiner::new(Arc::new(MockOracle::working()), options(2));

    let outcome = refiner.refine_scenes("Sorted", &scenes, |_, _| {}).await.unwrap();

    let numbers: Vec<u32> = outcome.scenes.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

/// Intermittent failures degrade some scenes but never the pass
#[tokio::test]
async fn test_intermittent_failures_should_be_aggregated() {
    let scenes = first_pass_scenes(6);
    let refiner = SceneRefiner::new(Arc::new(MockOracle::intermittent(3)), options(2));

    let outcome = refiner.refine_scenes("Flaky", &scenes, |_, _| {}).await.unwrap();

    assert_eq!(outcome.scenes.len(), 6);
    assert_eq!(outcome.failures.len(), 2);
    assert_eq!(
        outcome.warnings,
        vec!["2 scene(s) had refinement errors, using original versions".to_string()]
    );
}

/// Empty answers count as failures
#[tokio::test]
async fn test_empty_answers_should_abort_first_batch() {
    let scenes = first_pass_scenes(4);
    let oracle = Arc::new(MockOracle::empty());
    let refiner = SceneRefiner::new(oracle.clone(), options(2));

    let result = refiner.refine_scenes("Silent", &scenes, |_, _| {}).await;

    match result {
        Err(RefinementError::BatchFailed { batch, failures }) => {
            assert_eq!(batch, 1);
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected a failed batch, got {:?}", other.map(|o| o.scenes.len())),
    }
    // The second batch is never dispatched
    assert_eq!(oracle.request_count(), 2);
}

/// Batch starts are spaced by the batch delay
#[tokio::test(start_paused = true)]
async fn test_batches_should_be_paced() {
    let scenes = first_pass_scenes(4);
    let mut opts = options(1);
    opts.batch_delay = Duration::from_secs(1);
    let refiner = SceneRefiner::new(Arc::new(MockOracle::working()), opts);

    let start = tokio::time::Instant::now();
    refiner.refine_scenes("Paced", &scenes, |_, _| {}).await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(3));
}

/// The refined text parses back to the refined scenes and validates
#[tokio::test]
async fn test_refined_outline_should_parse_and_validate() {
    let mut document = parse_outline(DEMORGAN_OUTLINE);
    let refiner = SceneRefiner::new(Arc::new(MockOracle::working()), options(4));

    let outcome = refiner.refine(&mut document, |_, _| {}).await.unwrap();

    let reparsed = parse_refined_outline(&outcome.raw_refined_outline);
    assert_eq!(reparsed.video_title, "De Morgan's Laws");
    assert_eq!(reparsed.scenes.len(), 4);
    for (parsed, refined) in reparsed.scenes.iter().zip(&document.scenes) {
        assert_eq!(parsed.title, refined.title);
        assert_eq!(parsed.continuity_hooks, refined.continuity_hooks);
    }

    let report = validate_outline(&reparsed.scenes, &reparsed.video_title);
    assert!(report.is_valid, "{:?}", report.errors);
    assert!(report.warnings.is_empty());
    assert_eq!(report.object_names.len(), 4);
}
