/*!
 * Reader for the refinement output format.
 *
 * Refined scenes carry bold section headers followed by bullet lists:
 *
 * ```text
 * **Precise objects (named ids):**
 * - axes_main
 * **Continuity hooks:**
 * export: [axes_main]
 * import: []
 * ```
 *
 * Every line is first classified into a `LineKind`; the current `Section` is then
 * advanced by `Section::next`, and the line's payload is applied against the
 * section that is current at that point. Keeping the grammar in these two small
 * tables makes it testable apart from the merge logic.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{ContinuityHooks, SceneField, SceneRecord, SCENE_START};
use super::parser;

// @const: Bracketed identifier list after `export:` / `import:`
static BRACKET_LIST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[(.*?)\]").unwrap()
});

/// Section the reader is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Before any field or header
    None,
    /// Inside a first-pass field line
    Field(SceneField),
    PreciseObjects,
    OrderedSteps,
    TimingHints,
    ContinuityHooks,
    TechNotes,
}

/// Bold header prefixes and the section they open.
const SECTION_HEADERS: [(&str, Section); 5] = [
    ("**Precise objects", Section::PreciseObjects),
    ("**Ordered animation steps", Section::OrderedSteps),
    ("**Timing hints", Section::TimingHints),
    ("**Continuity hooks", Section::ContinuityHooks),
    ("**Tech notes", Section::TechNotes),
];

/// Classification of a single trimmed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `---SCENE: ...---`
    SceneHeader(&'a str),
    /// `---ENDSCENE---`
    SceneEnd,
    /// A first-pass field line and its value
    Field(SceneField, &'a str),
    /// One of the bold section headers
    SectionHeader(Section),
    /// Remainder of an `export:` line
    Export(&'a str),
    /// Remainder of an `import:` line
    Import(&'a str),
    /// Text of a `- ` bullet
    Bullet(&'a str),
    /// Anything else
    Other,
}

impl<'a> LineKind<'a> {
    /// Classify a line. Leading and trailing whitespace is ignored.
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.starts_with(SCENE_START) {
            return LineKind::SceneHeader(line);
        }
        if line == super::model::SCENE_END {
            return LineKind::SceneEnd;
        }
        if let Some((field, value)) = SceneField::match_line(line) {
            return LineKind::Field(field, value);
        }
        if let Some((_, section)) = SECTION_HEADERS.iter().find(|(prefix, _)| line.starts_with(prefix)) {
            return LineKind::SectionHeader(*section);
        }
        if let Some(rest) = line.strip_prefix("export:") {
            return LineKind::Export(rest);
        }
        if let Some(rest) = line.strip_prefix("import:") {
            return LineKind::Import(rest);
        }
        if let Some(rest) = line.strip_prefix("- ") {
            return LineKind::Bullet(rest.trim());
        }
        LineKind::Other
    }
}

impl Section {
    /// Transition on a classified line.
    pub fn next(self, line: &LineKind<'_>) -> Section {
        match line {
            LineKind::SceneHeader(_) | LineKind::SceneEnd => Section::None,
            LineKind::Field(field, _) => Section::Field(*field),
            LineKind::SectionHeader(section) => *section,
            LineKind::Export(_) | LineKind::Import(_) | LineKind::Bullet(_) | LineKind::Other => self,
        }
    }

    /// Whether bullets in this section are collected
    pub fn collects_bullets(self) -> bool {
        matches!(
            self,
            Section::PreciseObjects | Section::OrderedSteps | Section::TimingHints | Section::TechNotes
        )
    }
}

/// Everything read from one refined scene text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedFields {
    /// Title from a scene header, if the text had one
    pub title: Option<String>,
    /// First-pass fields restated by the text, last occurrence wins
    pub fields: Vec<(SceneField, String)>,
    pub precise_objects: Vec<String>,
    pub ordered_steps: Vec<String>,
    pub timing_hints: Vec<String>,
    pub continuity_hooks: ContinuityHooks,
    pub tech_notes: Vec<String>,
}

impl EnrichedFields {
    fn set_field(&mut self, field: SceneField, value: &str) {
        self.fields.retain(|(f, _)| *f != field);
        self.fields.push((field, value.to_string()));
    }

    fn push_bullet(&mut self, section: Section, text: &str) {
        if text.is_empty() {
            return;
        }
        let list = match section {
            Section::PreciseObjects => &mut self.precise_objects,
            Section::OrderedSteps => &mut self.ordered_steps,
            Section::TimingHints => &mut self.timing_hints,
            Section::TechNotes => &mut self.tech_notes,
            _ => return,
        };
        list.push(text.to_string());
    }

    /// Merge into a scene record.
    ///
    /// Restated fields overwrite the record's values; enrichment lists replace the
    /// record's lists only when non-empty, so a sparse answer never erases data.
    pub fn apply_to(self, scene: &mut SceneRecord) {
        if let Some(title) = self.title {
            scene.title = title;
        }
        for (field, value) in &self.fields {
            if !value.is_empty() {
                scene.set_field(*field, value);
            }
        }
        if !self.precise_objects.is_empty() {
            scene.precise_objects = Some(self.precise_objects);
        }
        if !self.ordered_steps.is_empty() {
            scene.ordered_steps = Some(self.ordered_steps);
        }
        if !self.timing_hints.is_empty() {
            scene.timing_hints = Some(self.timing_hints);
        }
        if !self.continuity_hooks.is_empty() {
            scene.continuity_hooks = Some(self.continuity_hooks);
        }
        if !self.tech_notes.is_empty() {
            scene.tech_notes = Some(self.tech_notes);
        }
    }
}

/// Read a refined scene text into its enriched fields.
pub fn read_sections(text: &str) -> EnrichedFields {
    let mut fields = EnrichedFields::default();
    let mut section = Section::None;

    for raw_line in text.lines() {
        let line = LineKind::classify(raw_line);
        section = section.next(&line);

        match line {
            LineKind::SceneHeader(header) => {
                if let Some(title) = parser::parse_header(header).and_then(|h| h.title) {
                    fields.title = Some(title);
                }
            }
            LineKind::Field(field, value) => fields.set_field(field, value),
            LineKind::Export(rest) if section == Section::ContinuityHooks => {
                if let Some(ids) = parse_identifier_list(rest) {
                    fields.continuity_hooks.export = ids;
                }
            }
            LineKind::Import(rest) if section == Section::ContinuityHooks => {
                if let Some(ids) = parse_identifier_list(rest) {
                    fields.continuity_hooks.import = ids;
                }
            }
            LineKind::Bullet(text) if section.collects_bullets() => fields.push_bullet(section, text),
            _ => {}
        }
    }

    fields
}

/// Parse `[a, "b", 'c']` into identifiers, stripping quotes and dropping empties.
///
/// Returns `None` when the text has no bracketed list.
pub fn parse_identifier_list(text: &str) -> Option<Vec<String>> {
    let captures = BRACKET_LIST_REGEX.captures(text)?;
    let inner = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let mut ids: Vec<String> = Vec::new();
    for item in inner.split(',') {
        let id: String = item.trim().chars().filter(|c| *c != '"' && *c != '\'').collect();
        let id = id.trim().to_string();
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ids)
}
