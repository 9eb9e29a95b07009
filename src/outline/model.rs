/*!
 * Core outline model types.
 *
 * A scene outline is a sequence of delimited scene blocks. These types hold the
 * parsed first-pass fields of every scene plus the optional fields added by the
 * refinement pass, and know how to render themselves back into the block format.
 */

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Header delimiter opening a scene block
pub const SCENE_START: &str = "---SCENE:";

/// Delimiter closing a scene block
pub const SCENE_END: &str = "---ENDSCENE---";

/// Title used when the document has no title line
pub const DEFAULT_VIDEO_TITLE: &str = "Educational Video";

/// Dependency value meaning "this scene builds on nothing"
pub const NO_DEPENDENCIES: &str = "None";

/// Labeled first-pass fields of a scene block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneField {
    Objectives,
    Narration,
    VisualPlan,
    AnimationPlan,
    Dependencies,
    AssessmentHook,
}

impl SceneField {
    /// All fields, in prefix priority order.
    pub const ALL: [SceneField; 6] = [
        SceneField::Objectives,
        SceneField::Narration,
        SceneField::VisualPlan,
        SceneField::AnimationPlan,
        SceneField::Dependencies,
        SceneField::AssessmentHook,
    ];

    /// Line prefix introducing the field
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Objectives => "Objectives:",
            Self::Narration => "Narration/On-screen:",
            Self::VisualPlan => "Visual plan:",
            Self::AnimationPlan => "Animation plan:",
            Self::Dependencies => "Dependencies:",
            Self::AssessmentHook => "Assessment hook:",
        }
    }

    /// Human readable name used in findings
    pub fn label(self) -> &'static str {
        match self {
            Self::Objectives => "objectives",
            Self::Narration => "narration",
            Self::VisualPlan => "visual plan",
            Self::AnimationPlan => "animation plan",
            Self::Dependencies => "dependencies",
            Self::AssessmentHook => "assessment hook",
        }
    }

    /// Match a trimmed line against the field prefixes in priority order.
    ///
    /// Returns the field and the trimmed remainder of the line.
    pub fn match_line(line: &str) -> Option<(SceneField, &str)> {
        Self::ALL.iter().find_map(|field| {
            line.strip_prefix(field.prefix())
                .map(|rest| (*field, rest.trim()))
        })
    }
}

/// Objects handed from one scene to later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuityHooks {
    /// Identifiers this scene makes available to later scenes
    #[serde(default)]
    pub export: Vec<String>,

    /// Identifiers this scene expects from earlier scenes
    #[serde(default)]
    pub import: Vec<String>,
}

impl ContinuityHooks {
    /// True when neither side declares anything
    pub fn is_empty(&self) -> bool {
        self.export.is_empty() && self.import.is_empty()
    }
}

/// One scene of an outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    /// Declared scene number
    pub number: u32,

    /// Scene title
    pub title: String,

    pub objectives: String,
    pub narration: String,
    pub visual_plan: String,
    pub animation_plan: String,
    pub dependencies: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_hook: Option<String>,

    /// The delimited block this record was read from (or rendered to)
    pub raw_content: String,

    // Added by the refinement pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precise_objects: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_steps: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_hints: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuity_hooks: Option<ContinuityHooks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_notes: Option<Vec<String>>,
}

impl SceneRecord {
    /// Create an empty scene with the default title.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            title: default_scene_title(number),
            ..Default::default()
        }
    }

    /// Read a first-pass field
    pub fn field(&self, field: SceneField) -> &str {
        match field {
            SceneField::Objectives => &self.objectives,
            SceneField::Narration => &self.narration,
            SceneField::VisualPlan => &self.visual_plan,
            SceneField::AnimationPlan => &self.animation_plan,
            SceneField::Dependencies => &self.dependencies,
            SceneField::AssessmentHook => self.assessment_hook.as_deref().unwrap_or(""),
        }
    }

    /// Overwrite a first-pass field. An empty assessment hook clears it.
    pub fn set_field(&mut self, field: SceneField, value: &str) {
        let value = value.to_string();
        match field {
            SceneField::Objectives => self.objectives = value,
            SceneField::Narration => self.narration = value,
            SceneField::VisualPlan => self.visual_plan = value,
            SceneField::AnimationPlan => self.animation_plan = value,
            SceneField::Dependencies => self.dependencies = value,
            SceneField::AssessmentHook => {
                self.assessment_hook = if value.is_empty() { None } else { Some(value) };
            }
        }
    }

    /// Whether the refinement pass has added anything to this scene
    pub fn is_enriched(&self) -> bool {
        self.precise_objects.is_some()
            || self.ordered_steps.is_some()
            || self.timing_hints.is_some()
            || self.continuity_hooks.is_some()
            || self.tech_notes.is_some()
    }

    /// Exported identifiers, empty when the scene declares no hooks
    pub fn exports(&self) -> &[String] {
        self.continuity_hooks.as_ref().map(|h| h.export.as_slice()).unwrap_or(&[])
    }

    /// Imported identifiers, empty when the scene declares no hooks
    pub fn imports(&self) -> &[String] {
        self.continuity_hooks.as_ref().map(|h| h.import.as_slice()).unwrap_or(&[])
    }

    /// Precise object identifiers, empty before refinement
    pub fn objects(&self) -> &[String] {
        self.precise_objects.as_deref().unwrap_or(&[])
    }

    /// Whether `name` is introduced by this scene, as a precise object or an export
    pub fn introduces(&self, name: &str) -> bool {
        self.objects().iter().any(|o| o == name) || self.exports().iter().any(|e| e == name)
    }

    /// Render the scene in the delimited block format.
    ///
    /// Enrichment sections are emitted after the first-pass fields when present,
    /// so the output can be read back by either parser.
    pub fn render_block(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {} | {}---", SCENE_START, self.number, self.title);
        for field in SceneField::ALL {
            if field == SceneField::AssessmentHook && self.assessment_hook.is_none() {
                continue;
            }
            let _ = writeln!(out, "{} {}", field.prefix(), self.field(field));
        }

        render_list(&mut out, "**Precise objects (named ids):**", self.precise_objects.as_deref());
        render_list(&mut out, "**Ordered animation steps:**", self.ordered_steps.as_deref());
        render_list(&mut out, "**Timing hints:**", self.timing_hints.as_deref());
        if let Some(hooks) = &self.continuity_hooks {
            out.push_str("**Continuity hooks:**\n");
            let _ = writeln!(out, "export: [{}]", hooks.export.join(", "));
            let _ = writeln!(out, "import: [{}]", hooks.import.join(", "));
        }
        render_list(&mut out, "**Tech notes (Manim classes/methods):**", self.tech_notes.as_deref());

        out.push_str(SCENE_END);
        out
    }
}

fn render_list(out: &mut String, header: &str, items: Option<&[String]>) {
    if let Some(items) = items {
        out.push_str(header);
        out.push('\n');
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
    }
}

/// Title given to a scene whose header carries none
pub fn default_scene_title(number: u32) -> String {
    format!("Scene {}", number)
}

/// Something the parser had to skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    /// 1-based line of the offending scene header
    pub line: usize,
    /// What was wrong with the block
    pub message: String,
}

/// A parsed outline document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineDocument {
    /// Title of the whole video
    pub video_title: String,

    /// Scenes in the order they were matched (sorted by number after refinement)
    pub scenes: Vec<SceneRecord>,

    /// The raw text the document was parsed from
    pub raw_text: String,

    /// Reassembled outline produced by the refinement pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_text: Option<String>,

    /// Blocks the parser skipped
    #[serde(default)]
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl OutlineDocument {
    /// Create a document from already built scenes.
    pub fn new(video_title: impl Into<String>, scenes: Vec<SceneRecord>) -> Self {
        let video_title = video_title.into();
        let raw_text = assemble_outline(&video_title, &scenes);
        Self {
            video_title,
            scenes,
            raw_text,
            refined_text: None,
            diagnostics: Vec::new(),
        }
    }

    /// Look up a scene by its declared number
    pub fn scene(&self, number: u32) -> Option<&SceneRecord> {
        self.scenes.iter().find(|s| s.number == number)
    }

    /// Number of scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the document has no scenes
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// The most recent textual form of the outline
    pub fn current_text(&self) -> &str {
        self.refined_text.as_deref().unwrap_or(&self.raw_text)
    }
}

/// Reassemble an outline from a title and scene blocks.
///
/// The title becomes a `# ` heading line, followed by each scene's raw content,
/// separated by blank lines.
pub fn assemble_outline(video_title: &str, scenes: &[SceneRecord]) -> String {
    let mut out = format!("# {}\n\n", video_title);
    for scene in scenes {
        let block = if scene.raw_content.trim().is_empty() {
            scene.render_block()
        } else {
            scene.raw_content.clone()
        };
        out.push_str(block.trim());
        out.push_str("\n\n");
    }
    out
}
