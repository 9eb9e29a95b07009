/*!
 * Prompt templates sent to the oracle.
 *
 * Two prompts are needed: one that asks for a first-pass outline in the
 * delimited scene format, and one per scene that asks for the refinement
 * sections read back by `outline::sections`.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::SceneRecord;

/// Target audience level of the lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// Depth of coverage of the lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Overview,
    #[default]
    Detailed,
    Comprehensive,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Overview => "overview",
            Self::Detailed => "detailed",
            Self::Comprehensive => "comprehensive",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Complexity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(anyhow::anyhow!("Invalid complexity: {}", s)),
        }
    }
}

impl FromStr for Depth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "overview" => Ok(Self::Overview),
            "detailed" => Ok(Self::Detailed),
            "comprehensive" => Ok(Self::Comprehensive),
            _ => Err(anyhow::anyhow!("Invalid depth: {}", s)),
        }
    }
}

/// System prompt for first-pass outline generation
pub const OUTLINE_SYSTEM_PROMPT: &str = "You are an expert educational content creator who writes \
scene-based outlines for Manim explainer videos. Never write Manim code. Always use the exact \
scene delimiter format so the outline can be parsed by a machine:
---SCENE: <number> | <short title>---
<fields>
---ENDSCENE---";

/// System prompt for per-scene refinement
pub const REFINEMENT_SYSTEM_PROMPT: &str = "You are an expert Manim developer refining scene \
outlines for direct implementation. Keep the scene number, title and delimiter format unchanged. \
Give every visual element a unique, descriptive identifier, break animations into ordered atomic \
steps, suggest timings, declare which objects are exported to or imported from other scenes, and \
name the Manim classes and methods to use.";

/// Build the prompt requesting a first-pass outline.
pub fn outline_prompt(topic: &str, complexity: Complexity, depth: Depth, style: &str) -> String {
    format!(
        "Create a comprehensive scene-based outline for a Manim educational video about \"{topic}\".

The lesson should be appropriate for {complexity} level learners with {depth} depth of coverage.

Requirements:
1. Generate 3-5 scenes using the exact delimiter format
2. Each scene must include all required fields (Objectives, Narration/On-screen, Visual plan, Animation plan, Dependencies, Assessment hook)
3. Scenes should flow logically and build upon each other
4. Duration should be realistic for educational content (3-8 minutes total)

Style preference: {style}

Start with a single title line, then use this exact format:

---SCENE: 1 | <title>---
Objectives: <what this scene teaches>
Narration/On-screen: <key phrases, equations, labels>
Visual plan: <shapes, graphs, axes, constructions, highlights>
Animation plan: <entrances, transforms, reveals, timings, transitions>
Dependencies: <objects from prior scenes, or None>
Assessment hook: <quick check, intuition prompt>
---ENDSCENE---

Repeat the block for every scene. Do NOT generate any Manim code, only the structured outline."
    )
}

/// Build the refinement prompt for one scene.
pub fn refinement_prompt(scene: &SceneRecord) -> String {
    let block = if scene.raw_content.trim().is_empty() {
        scene.render_block()
    } else {
        scene.raw_content.clone()
    };

    format!(
        "You are refining Scene {number} of a Manim video. Take the scene below and return the same scene with a deeper Visual plan and Animation plan suitable for direct Manim implementation. Keep the delimiter format.

Inside the scene block, after the fields, add these sections exactly:

**Precise objects (named ids):**
- <unique_identifier>
**Ordered animation steps:**
- <step>
**Timing hints:**
- <hint>
**Continuity hooks:**
export: [<identifiers later scenes may reuse>]
import: [<identifiers from earlier scenes>]
**Tech notes (Manim classes/methods):**
- <note>

{block}

Enhance the scene while keeping the exact delimiter format and the core educational objectives.",
        number = scene.number,
        block = block.trim(),
    )
}
