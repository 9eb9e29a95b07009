/*!
 * Outline to structured data conversion.
 *
 * Turns the free-text fields of each scene into normalized arrays that
 * downstream tooling can consume as JSON. Conversion never fails: absent or
 * malformed input degrades to empty collections.
 */

use serde::{Deserialize, Serialize};

use super::model::{ContinuityHooks, OutlineDocument, SceneRecord, NO_DEPENDENCIES};

/// Manim classes and animations recognised in step text, in reporting order
pub const MANIM_KEYWORDS: [&str; 23] = [
    "Axes",
    "NumberLine",
    "Graph",
    "Plot",
    "Text",
    "MathTex",
    "Tex",
    "VGroup",
    "Rectangle",
    "Circle",
    "Arrow",
    "Line",
    "Polygon",
    "Create",
    "FadeIn",
    "FadeOut",
    "Transform",
    "ReplacementTransform",
    "Write",
    "DrawBorderThenFill",
    "Succession",
    "AnimationGroup",
    "Wait",
];

/// Separator between steps of a free-text animation plan
const STEP_SEPARATOR: &str = "->";

/// One animation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationStep {
    /// 1-based position
    pub step: usize,
    pub action: String,
    /// Keywords found in `action`
    pub manim: Vec<String>,
}

/// Structured form of one scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneJson {
    pub number: u32,
    pub title: String,
    pub objectives: Vec<String>,
    pub narration: Vec<String>,
    pub visual_plan: Vec<String>,
    pub animation_plan: Vec<AnimationStep>,
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub continuity_hooks: ContinuityHooks,
    #[serde(default)]
    pub tech_notes: Vec<String>,
}

/// Structured form of a whole outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineJson {
    pub video_title: String,
    pub scenes: Vec<SceneJson>,
}

/// Find the keywords contained in `text`, case-insensitively.
pub fn extract_manim_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    MANIM_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.to_string())
        .collect()
}

fn split_trimmed(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn build_steps<'a>(actions: impl IntoIterator<Item = &'a str>) -> Vec<AnimationStep> {
    actions
        .into_iter()
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .enumerate()
        .map(|(index, action)| AnimationStep {
            step: index + 1,
            action: action.to_string(),
            manim: extract_manim_keywords(action),
        })
        .collect()
}

fn split_dependencies(text: &str) -> Vec<String> {
    if text.trim() == NO_DEPENDENCIES {
        return Vec::new();
    }
    split_trimmed(text, ",")
        .into_iter()
        .filter(|dep| dep != NO_DEPENDENCIES)
        .collect()
}

/// Convert one scene.
///
/// Ordered steps from refinement are preferred; otherwise the free-text
/// animation plan is split on `->`.
pub fn convert_scene(scene: &SceneRecord) -> SceneJson {
    let animation_plan = match scene.ordered_steps.as_deref() {
        Some(steps) if !steps.is_empty() => build_steps(steps.iter().map(String::as_str)),
        _ => build_steps(scene.animation_plan.split(STEP_SEPARATOR)),
    };

    let continuity_hooks = scene
        .continuity_hooks
        .as_ref()
        .map(|hooks| ContinuityHooks {
            export: clean_list(&hooks.export),
            import: clean_list(&hooks.import),
        })
        .unwrap_or_default();

    SceneJson {
        number: scene.number,
        title: scene.title.trim().to_string(),
        objectives: split_trimmed(&scene.objectives, "."),
        narration: split_trimmed(&scene.narration, ","),
        visual_plan: split_trimmed(&scene.visual_plan, ","),
        animation_plan,
        dependencies: split_dependencies(&scene.dependencies),
        continuity_hooks,
        tech_notes: clean_list(scene.tech_notes.as_deref().unwrap_or_default()),
    }
}

/// Convert a whole document
pub fn convert_outline(document: &OutlineDocument) -> OutlineJson {
    OutlineJson {
        video_title: document.video_title.clone(),
        scenes: document.scenes.iter().map(convert_scene).collect(),
    }
}

impl SceneJson {
    /// Re-apply the normalization rules to already structured data.
    pub fn normalized(&self) -> Self {
        let split_all = |items: &[String], separator: &str| -> Vec<String> {
            items.iter().flat_map(|item| split_trimmed(item, separator)).collect()
        };

        Self {
            number: self.number,
            title: self.title.trim().to_string(),
            objectives: split_all(&self.objectives, "."),
            narration: split_all(&self.narration, ","),
            visual_plan: split_all(&self.visual_plan, ","),
            animation_plan: build_steps(self.animation_plan.iter().map(|s| s.action.as_str())),
            dependencies: self
                .dependencies
                .iter()
                .flat_map(|dep| split_dependencies(dep))
                .collect(),
            continuity_hooks: ContinuityHooks {
                export: clean_list(&self.continuity_hooks.export),
                import: clean_list(&self.continuity_hooks.import),
            },
            tech_notes: clean_list(&self.tech_notes),
        }
    }
}

impl OutlineJson {
    /// Normalize every scene; applying this twice changes nothing.
    pub fn normalized(&self) -> Self {
        Self {
            video_title: self.video_title.clone(),
            scenes: self.scenes.iter().map(SceneJson::normalized).collect(),
        }
    }
}
