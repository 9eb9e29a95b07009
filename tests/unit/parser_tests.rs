/*!
 * Tests for the scene block parser and the refinement section reader
 */

use scenecraft::outline::model::{assemble_outline, SceneRecord, DEFAULT_VIDEO_TITLE};
use scenecraft::outline::parser::{parse_outline, parse_refined_outline};
use scenecraft::outline::sections::read_sections;

use crate::common::{build_scene, with_hooks, DEMORGAN_OUTLINE};

fn core_fields(scene: &SceneRecord) -> (u32, &str, &str, &str, &str, &str) {
    (
        scene.number,
        scene.title.as_str(),
        scene.objectives.as_str(),
        scene.narration.as_str(),
        scene.visual_plan.as_str(),
        scene.animation_plan.as_str(),
    )
}

#[test]
fn test_parse_demorgan_outline_should_read_all_scenes() {
    let document = parse_outline(DEMORGAN_OUTLINE);

    assert_eq!(document.video_title, "De Morgan's Laws");
    assert_eq!(document.len(), 4);
    assert!(document.diagnostics.is_empty());

    let first = &document.scenes[0];
    assert_eq!(first.title, "Logic symbols");
    assert_eq!(first.dependencies, "None");
    assert_eq!(first.assessment_hook.as_deref(), Some("Which symbol means \"either one\"?"));
    assert!(first.raw_content.starts_with("---SCENE: 1 | Logic symbols---"));
    assert!(first.raw_content.ends_with("---ENDSCENE---"));
    assert_eq!(document.scenes[1].assessment_hook, None);
}

#[test]
fn test_render_then_parse_should_round_trip_core_fields() {
    let scene_sets: Vec<Vec<SceneRecord>> = vec![
        vec![build_scene(1)],
        vec![build_scene(1), build_scene(2), build_scene(3)],
        vec![build_scene(5), build_scene(2), build_scene(9)],
        vec![SceneRecord::new(1), SceneRecord::new(2)],
    ];

    for scenes in scene_sets {
        let text = assemble_outline("Round trip", &scenes);
        let document = parse_outline(&text);

        assert_eq!(document.video_title, "Round trip");
        assert_eq!(document.len(), scenes.len());
        for (parsed, original) in document.scenes.iter().zip(&scenes) {
            assert_eq!(core_fields(parsed), core_fields(original));
        }
    }
}

#[test]
fn test_render_then_refined_parse_should_round_trip_enrichment() {
    let mut scene = with_hooks(build_scene(2), &["graph_f"], &["axes_main"]);
    scene.precise_objects = Some(vec!["graph_f".to_string(), "label_f".to_string()]);
    scene.timing_hints = Some(vec!["3s".to_string()]);

    let text = assemble_outline("Enriched", std::slice::from_ref(&scene));
    let parsed = &parse_refined_outline(&text).scenes[0];

    assert_eq!(parsed.precise_objects, scene.precise_objects);
    assert_eq!(parsed.ordered_steps, scene.ordered_steps);
    assert_eq!(parsed.timing_hints, scene.timing_hints);
    assert_eq!(parsed.continuity_hooks, scene.continuity_hooks);
    assert_eq!(parsed.tech_notes, scene.tech_notes);
}

#[test]
fn test_scenes_should_keep_match_order() {
    let text = "---SCENE: 3 | C---\n---ENDSCENE---\n---SCENE: 1 | A---\n---ENDSCENE---";
    let numbers: Vec<u32> = parse_outline(text).scenes.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![3, 1]);
}

#[test]
fn test_header_without_title_should_get_default_title() {
    let document = parse_outline("---SCENE: 4---\nObjectives: x\n---ENDSCENE---");
    assert_eq!(document.scenes[0].title, "Scene 4");
}

#[test]
fn test_malformed_and_unterminated_blocks_should_be_skipped_with_diagnostics() {
    let text = "Title\n\
                ---SCENE: one | Bad number---\n\
                Objectives: lost\n\
                ---ENDSCENE---\n\
                ---SCENE: 2 | Good---\n\
                Objectives: kept\n\
                ---ENDSCENE---\n\
                ---SCENE: 3 | Never closed---\n\
                Objectives: lost too\n";

    let document = parse_outline(text);

    assert_eq!(document.len(), 1);
    assert_eq!(document.scenes[0].number, 2);
    assert_eq!(document.diagnostics.len(), 2);
    assert_eq!(document.diagnostics[0].line, 2);
    assert!(document.diagnostics[0].message.contains("Malformed scene header"));
    assert_eq!(document.diagnostics[1].line, 8);
}

#[test]
fn test_unknown_lines_should_stay_in_raw_content_only() {
    let text = "---SCENE: 1 | T---\nObjectives: learn\nSpeaker notes: keep calm\n---ENDSCENE---";
    let scene = &parse_outline(text).scenes[0];
    assert_eq!(scene.objectives, "learn");
    assert!(scene.raw_content.contains("Speaker notes: keep calm"));
}

#[test]
fn test_outline_without_title_line_should_use_default_title() {
    let text = "\n---SCENE: 1 | T---\n---ENDSCENE---";
    assert_eq!(parse_outline(text).video_title, DEFAULT_VIDEO_TITLE);
}

#[test]
fn test_read_sections_should_switch_lists_on_headers() {
    let text = "**Ordered animation steps:**\n\
                - Create axes\n\
                - Plot curve\n\
                **Timing hints:**\n\
                - 2s\n\
                **Continuity hooks:**\n\
                export: [axes, curve]\n\
                import: [\"grid\"]\n\
                - stray bullet\n\
                **Tech notes (Manim classes/methods):**\n\
                - Axes.plot";
    let fields = read_sections(text);

    assert_eq!(fields.ordered_steps, vec!["Create axes", "Plot curve"]);
    assert_eq!(fields.timing_hints, vec!["2s"]);
    assert_eq!(fields.continuity_hooks.export, vec!["axes", "curve"]);
    assert_eq!(fields.continuity_hooks.import, vec!["grid"]);
    assert_eq!(fields.tech_notes, vec!["Axes.plot"]);
    assert!(fields.precise_objects.is_empty());
}
