/*!
 * Outline validator.
 *
 * Checks a (possibly refined) scene sequence for structural problems and
 * produces a `ValidationReport`. Validation is pure and deterministic.
 *
 * Findings are appended in a fixed order:
 * - numbering
 * - required fields
 * - object name conflicts
 * - imports
 * - soft quality checks (warnings and suggestions only)
 *
 * Within each category scenes are visited in ascending number order.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::model::{SceneField, SceneRecord, NO_DEPENDENCIES};

/// Fields every scene must carry
const REQUIRED_FIELDS: [SceneField; 3] = [
    SceneField::Objectives,
    SceneField::VisualPlan,
    SceneField::AnimationPlan,
];

/// Frequency map of introduced object names.
///
/// Names are counted once per scene, so a scene that lists an identifier both
/// as a precise object and as an export introduces it only once. Conflicts are
/// reported all at once, in the order the names first appeared.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every scene's precise objects and exports
    pub fn from_scenes<'a>(scenes: impl IntoIterator<Item = &'a SceneRecord>) -> Self {
        let mut registry = Self::new();
        for scene in scenes {
            registry.register_scene(scene);
        }
        registry
    }

    /// Record the names introduced by one scene
    pub fn register_scene(&mut self, scene: &SceneRecord) {
        let mut seen = BTreeSet::new();
        for name in scene.objects().iter().chain(scene.exports()) {
            let name = name.trim();
            if name.is_empty() || !seen.insert(name) {
                continue;
            }
            self.record(name);
        }
    }

    /// Count one introduction of `name`
    pub fn record(&mut self, name: &str) {
        match self.counts.get_mut(name) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(name.to_string(), 1);
                self.order.push(name.to_string());
            }
        }
    }

    /// How many scenes introduce `name`
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Names introduced more than once, in first-appearance order
    pub fn conflicts(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| self.count(name) > 1)
            .map(String::as_str)
            .collect()
    }

    /// Every distinct name
    pub fn names(&self) -> BTreeSet<String> {
        self.order.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Validator thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Plans shorter than this get a suggestion
    pub min_plan_chars: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self { min_plan_chars: 50 }
    }
}

impl From<crate::app_config::ValidationConfig> for ValidatorOptions {
    fn from(config: crate::app_config::ValidationConfig) -> Self {
        Self {
            min_plan_chars: config.min_plan_chars,
        }
    }
}

/// Result of one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub scene_count: usize,
    pub object_names: BTreeSet<String>,
    pub dependencies: BTreeSet<String>,
}

impl ValidationReport {
    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        format!(
            "{} scene(s): {} error(s), {} warning(s), {} suggestion(s)",
            self.scene_count,
            self.errors.len(),
            self.warnings.len(),
            self.suggestions.len()
        )
    }
}

/// Findings collected during a pass
#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
}

/// Outline validator
#[derive(Debug, Clone, Default)]
pub struct OutlineValidator {
    options: ValidatorOptions,
}

impl OutlineValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Validate a scene sequence.
    ///
    /// The video title is only used for logging.
    pub fn validate(&self, scenes: &[SceneRecord], video_title: &str) -> ValidationReport {
        let mut findings = Findings::default();

        let mut ordered: Vec<&SceneRecord> = scenes.iter().collect();
        ordered.sort_by_key(|scene| scene.number);

        let registry = ObjectRegistry::from_scenes(ordered.iter().copied());

        if scenes.is_empty() {
            findings.errors.push("No scenes found in outline".to_string());
        } else {
            check_numbering(&ordered, &mut findings);
            check_required_fields(&ordered, &mut findings);
            check_conflicts(&registry, &mut findings);
            check_imports(&ordered, &mut findings);
            self.check_quality(&ordered, &mut findings);
        }

        let dependencies = ordered
            .iter()
            .map(|scene| scene.dependencies.trim())
            .filter(|dep| !dep.is_empty() && *dep != NO_DEPENDENCIES)
            .map(str::to_string)
            .collect();

        let report = ValidationReport {
            is_valid: findings.errors.is_empty(),
            errors: findings.errors,
            warnings: findings.warnings,
            suggestions: findings.suggestions,
            scene_count: scenes.len(),
            object_names: registry.names(),
            dependencies,
        };

        debug!("Validated \"{}\": {}", video_title, report.summary());
        report
    }

    fn check_quality(&self, ordered: &[&SceneRecord], findings: &mut Findings) {
        for scene in ordered {
            if scene.ordered_steps.as_ref().is_none_or(|steps| steps.is_empty()) {
                findings
                    .warnings
                    .push(format!("Scene {}: No ordered animation steps provided", scene.number));
            }
            if scene.tech_notes.as_ref().is_none_or(|notes| notes.is_empty()) {
                findings
                    .warnings
                    .push(format!("Scene {}: No technical notes provided", scene.number));
            }
        }

        for scene in ordered {
            if scene.animation_plan.trim().chars().count() < self.options.min_plan_chars {
                findings.suggestions.push(format!(
                    "Scene {}: Animation plan could be more detailed",
                    scene.number
                ));
            }
            if scene.visual_plan.trim().chars().count() < self.options.min_plan_chars {
                findings.suggestions.push(format!(
                    "Scene {}: Visual plan could be more detailed",
                    scene.number
                ));
            }
        }

        for pair in ordered.windows(2) {
            let (previous, current) = (pair[0], pair[1]);
            if is_none_dependency(&current.dependencies) && !is_none_dependency(&previous.dependencies) {
                findings.suggestions.push(format!(
                    "Scene {}: Consider building on previous scene's concepts",
                    current.number
                ));
            }
        }
    }
}

/// Validate with default options
pub fn validate_outline(scenes: &[SceneRecord], video_title: &str) -> ValidationReport {
    OutlineValidator::new().validate(scenes, video_title)
}

fn is_none_dependency(value: &str) -> bool {
    value.trim() == NO_DEPENDENCIES
}

fn check_numbering(ordered: &[&SceneRecord], findings: &mut Findings) {
    for (index, scene) in ordered.iter().enumerate() {
        let expected = index as u64 + 1;
        if u64::from(scene.number) != expected {
            findings.errors.push(format!(
                "Scene numbering is not contiguous. Expected {}, found {}",
                expected, scene.number
            ));
        }
    }

    let mut declared: BTreeMap<u32, usize> = BTreeMap::new();
    for scene in ordered {
        *declared.entry(scene.number).or_insert(0) += 1;
    }

    for k in 1..=ordered.len() as u64 {
        let present = u32::try_from(k).is_ok_and(|k| declared.contains_key(&k));
        if !present {
            findings.errors.push(format!("Scene numbering is missing scene {}", k));
        }
    }

    for (number, count) in &declared {
        if *count > 1 {
            findings
                .errors
                .push(format!("Scene number {} is declared {} times", number, count));
        }
    }
}

fn check_required_fields(ordered: &[&SceneRecord], findings: &mut Findings) {
    for scene in ordered {
        if scene.title.trim().is_empty() {
            findings
                .errors
                .push(format!("Scene {}: Missing or empty title", scene.number));
        }
        for field in REQUIRED_FIELDS {
            if scene.field(field).trim().is_empty() {
                findings.errors.push(format!(
                    "Scene {}: Missing or empty {}",
                    scene.number,
                    field.label()
                ));
            }
        }
    }
}

fn check_conflicts(registry: &ObjectRegistry, findings: &mut Findings) {
    let conflicts = registry.conflicts();
    if !conflicts.is_empty() {
        findings.errors.push(format!(
            "Conflicting object names found: {}",
            conflicts.join(", ")
        ));
    }
}

fn check_imports(ordered: &[&SceneRecord], findings: &mut Findings) {
    for scene in ordered {
        let imports: Vec<&str> = scene
            .imports()
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if imports.is_empty() {
            continue;
        }

        let earlier: Vec<&SceneRecord> = ordered
            .iter()
            .copied()
            .filter(|other| other.number < scene.number)
            .collect();

        if earlier.is_empty() {
            findings.warnings.push(format!(
                "Scene {}: Imports objects but has no previous scenes",
                scene.number
            ));
            continue;
        }

        for name in imports {
            if !earlier.iter().any(|other| other.introduces(name)) {
                findings.errors.push(format!(
                    "Scene {}: Imported object '{}' not defined in previous scenes",
                    scene.number, name
                ));
            }
        }
    }
}
