/*!
 * Common test utilities for the scenecraft test suite
 */

use anyhow::Result;
use scenecraft::outline::model::{ContinuityHooks, SceneRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Four-scene first-pass outline about De Morgan's laws
pub const DEMORGAN_OUTLINE: &str = "De Morgan's Laws

---SCENE: 1 | Logic symbols---
Objectives: Introduce AND, OR and NOT. Connect symbols to everyday language.
Narration/On-screen: AND, OR, NOT, truth values
Visual plan: Three large symbol cards arranged in a row, each with an English label underneath
Animation plan: Write each symbol -> FadeIn its label -> Transform the labels into truth values
Dependencies: None
Assessment hook: Which symbol means \"either one\"?
---ENDSCENE---

---SCENE: 2 | Truth tables---
Objectives: Build the truth table for NOT (A AND B).
Narration/On-screen: rows, columns, NOT (A AND B)
Visual plan: A four row truth table grid with columns A, B, A AND B, NOT (A AND B)
Animation plan: Create the grid -> Write the inputs row by row -> Fill the derived columns
Dependencies: Scene 1 symbols
---ENDSCENE---

---SCENE: 3 | The first law---
Objectives: Show NOT (A AND B) equals NOT A OR NOT B.
Narration/On-screen: NOT (A AND B) = NOT A OR NOT B
Visual plan: Two truth tables side by side with matching columns highlighted in yellow
Animation plan: Create the second table -> Highlight matching columns -> Wait for emphasis
Dependencies: Scene 2 truth table
---ENDSCENE---

---SCENE: 4 | Venn diagrams---
Objectives: Visualise the law with sets.
Narration/On-screen: union, intersection, complement
Visual plan: Two overlapping circles inside a rectangle universe, shaded regions for the complement
Animation plan: Create the circles -> Shade the complement -> Transform the shading into the formula
Dependencies: None
---ENDSCENE---
";

/// Build a complete scene with long plans and enrichment
pub fn build_scene(number: u32) -> SceneRecord {
    let mut scene = SceneRecord::new(number);
    scene.title = format!("Scene title {}", number);
    scene.objectives = format!("Learn concept {}.", number);
    scene.narration = "Key phrase, equation".to_string();
    scene.visual_plan = "A labelled coordinate plane with a highlighted region and two markers".to_string();
    scene.animation_plan = "Create the plane -> FadeIn the markers -> Transform the region slowly".to_string();
    scene.dependencies = if number == 1 {
        "None".to_string()
    } else {
        format!("Scene {} objects", number - 1)
    };
    scene.ordered_steps = Some(vec!["Create the plane".to_string()]);
    scene.tech_notes = Some(vec!["Axes and Create".to_string()]);
    scene
}

/// Set the continuity hooks of a scene
pub fn with_hooks(mut scene: SceneRecord, export: &[&str], import: &[&str]) -> SceneRecord {
    scene.continuity_hooks = Some(ContinuityHooks {
        export: export.iter().map(|s| s.to_string()).collect(),
        import: import.iter().map(|s| s.to_string()).collect(),
    });
    scene
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}
