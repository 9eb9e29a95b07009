/*!
 * End-to-end tests of the controller workflow with a mock oracle
 */

use anyhow::Result;
use std::sync::Arc;

use scenecraft::app_config::Config;
use scenecraft::app_controller::{Controller, GenerationRequest};
use scenecraft::file_utils::{OUTLINE_FILE, OUTLINE_JSON_FILE, REFINED_OUTLINE_FILE, VALIDATION_FILE};
use scenecraft::outline::prompts::OUTLINE_SYSTEM_PROMPT;
use scenecraft::outline::{OutlineJson, ValidationReport};
use scenecraft::providers::mock::MockRequest;
use scenecraft::providers::MockOracle;

use crate::common::{create_temp_dir, create_test_file, DEMORGAN_OUTLINE};

fn test_config() -> Config {
    let mut config = Config::default();
    config.refinement.batch_delay_ms = 0;
    config
}

/// Answers generation requests with a fixed outline and refines scenes as usual
fn scripted_answer(request: &MockRequest) -> String {
    if request.system == OUTLINE_SYSTEM_PROMPT {
        DEMORGAN_OUTLINE.to_string()
    } else {
        MockOracle::enriched_scene(request)
    }
}

#[tokio::test]
async fn test_refine_file_should_write_all_artifacts() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "demorgan.txt", DEMORGAN_OUTLINE)?;
    let output_dir = temp_dir.path().join("out");

    let oracle = Arc::new(MockOracle::working());
    let controller = Controller::with_oracle(test_config(), oracle.clone())?;
    let result = controller.refine_file(&input, &output_dir, false).await?;

    assert_eq!(oracle.request_count(), 4);
    assert!(result.report.is_valid, "{:?}", result.report.errors);
    assert!(result.refinement_warnings.is_empty());
    assert_eq!(result.artifacts.len(), 4);
    for name in [OUTLINE_FILE, REFINED_OUTLINE_FILE, VALIDATION_FILE, OUTLINE_JSON_FILE] {
        assert!(output_dir.join(name).exists(), "{} was not written", name);
    }

    let report: ValidationReport =
        serde_json::from_str(&std::fs::read_to_string(output_dir.join(VALIDATION_FILE))?)?;
    assert_eq!(report, result.report);
    assert_eq!(report.scene_count, 4);

    let outline_json: OutlineJson =
        serde_json::from_str(&std::fs::read_to_string(output_dir.join(OUTLINE_JSON_FILE))?)?;
    assert_eq!(outline_json.video_title, "De Morgan's Laws");
    assert_eq!(outline_json.scenes.len(), 4);
    assert_eq!(outline_json.scenes[1].continuity_hooks.import, vec!["object_1"]);
    assert_eq!(outline_json.scenes[0].animation_plan[0].action, "Create object_1");

    let refined_text = std::fs::read_to_string(output_dir.join(REFINED_OUTLINE_FILE))?;
    assert_eq!(refined_text, result.document.current_text());
    assert_ne!(refined_text, result.document.raw_text);
    Ok(())
}

#[tokio::test]
async fn test_generate_should_run_full_workflow() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let output_dir = temp_dir.path().join("generated");

    let oracle = Arc::new(MockOracle::working().with_custom_response(scripted_answer));
    let controller = Controller::with_oracle(test_config(), oracle.clone())?;
    let request = GenerationRequest::from_config("De Morgan's laws", controller.config());

    let result = controller.generate(&request, &output_dir, false).await?;

    assert_eq!(oracle.request_count(), 5);
    assert_eq!(oracle.requests()[0].system, OUTLINE_SYSTEM_PROMPT);
    assert!(oracle.requests()[0].prompt.contains("about \"De Morgan's laws\""));
    assert_eq!(result.document.len(), 4);
    assert!(result.outline_json.is_some());
    assert_eq!(
        std::fs::read_to_string(output_dir.join(OUTLINE_FILE))?,
        DEMORGAN_OUTLINE
    );
    Ok(())
}

#[tokio::test]
async fn test_existing_artifacts_should_block_without_force() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "demorgan.txt", DEMORGAN_OUTLINE)?;
    let output_dir = temp_dir.path().join("out");
    create_test_file(&output_dir, VALIDATION_FILE, "{}")?;

    let oracle = Arc::new(MockOracle::working());
    let controller = Controller::with_oracle(test_config(), oracle.clone())?;

    assert!(controller.refine_file(&input, &output_dir, false).await.is_err());
    assert_eq!(oracle.request_count(), 0);

    let result = controller.refine_file(&input, &output_dir, true).await?;
    assert!(result.report.is_valid);
    Ok(())
}

#[tokio::test]
async fn test_partial_refinement_failure_should_still_validate() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "demorgan.txt", DEMORGAN_OUTLINE)?;
    let output_dir = temp_dir.path().join("out");

    // Scene 2 keeps its first-pass form, so scene 3 cannot resolve object_2
    let oracle = Arc::new(MockOracle::working().failing_for_scenes(&[2]));
    let controller = Controller::with_oracle(test_config(), oracle)?;
    let result = controller.refine_file(&input, &output_dir, false).await?;

    assert_eq!(
        result.refinement_warnings,
        vec!["1 scene(s) had refinement errors, using original versions".to_string()]
    );
    assert!(!result.report.is_valid);
    assert!(result
        .report
        .errors
        .contains(&"Scene 3: Imported object 'object_2' not defined in previous scenes".to_string()));
    assert!(result.outline_json.is_none());
    assert!(!output_dir.join(OUTLINE_JSON_FILE).exists());
    assert!(output_dir.join(VALIDATION_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn test_failing_oracle_should_abort_workflow() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "demorgan.txt", DEMORGAN_OUTLINE)?;
    let output_dir = temp_dir.path().join("out");

    let controller = Controller::with_oracle(test_config(), Arc::new(MockOracle::failing()))?;
    let error = controller
        .refine_file(&input, &output_dir, false)
        .await
        .expect_err("every scene failing must abort");

    assert!(error.to_string().contains("Scene refinement failed"));
    assert!(!output_dir.join(REFINED_OUTLINE_FILE).exists());
    Ok(())
}

#[test]
fn test_offline_controller_should_not_refine() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "demorgan.txt", DEMORGAN_OUTLINE)?;
    let output_dir = temp_dir.path().join("out");
    let controller = Controller::offline(test_config())?;

    let result = tokio_test::block_on(async { controller.refine_file(&input, &output_dir, false).await });

    assert!(result.is_err());
    // The first-pass outline is written before refinement starts
    assert!(output_dir.join(OUTLINE_FILE).exists());
    assert!(!output_dir.join(VALIDATION_FILE).exists());
    Ok(())
}

#[test]
fn test_validate_folder_should_report_each_outline() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    create_test_file(temp_dir.path(), "good.txt", DEMORGAN_OUTLINE)?;
    create_test_file(
        temp_dir.path(),
        "nested/broken.md",
        "Broken\n---SCENE: 2 | Late start---\nObjectives: x\n---ENDSCENE---",
    )?;
    create_test_file(temp_dir.path(), "notes.json", "{}")?;

    let controller = Controller::offline(test_config())?;
    let reports = controller.validate_folder(temp_dir.path())?;

    assert_eq!(reports.len(), 2);
    let valid = reports.iter().filter(|(_, report)| report.is_valid).count();
    assert_eq!(valid, 1);
    Ok(())
}

#[test]
fn test_convert_file_should_refuse_invalid_outline() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let broken = create_test_file(
        temp_dir.path(),
        "broken.txt",
        "Broken\n---SCENE: 1 | Empty---\nObjectives: x\n---ENDSCENE---",
    )?;
    let good = create_test_file(temp_dir.path(), "good.txt", DEMORGAN_OUTLINE)?;

    let controller = Controller::offline(test_config())?;

    let error = controller.convert_file(&broken).unwrap_err();
    assert!(error.to_string().contains("Scene 1: Missing or empty visual plan"));

    let (outline_json, report) = controller.convert_file(&good)?;
    assert!(report.is_valid);
    assert_eq!(outline_json.scenes[3].title, "Venn diagrams");
    assert!(outline_json.scenes[3].dependencies.is_empty());
    Ok(())
}
