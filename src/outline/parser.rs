/*!
 * Scene block parser.
 *
 * Splits a raw outline into scene records. The grammar is line based:
 *
 * ```text
 * ---SCENE: <number> | <title>---
 * Objectives: ...
 * ...
 * ---ENDSCENE---
 * ```
 *
 * The parser is lenient. Blocks with a malformed header or no closing
 * delimiter are skipped and recorded as diagnostics; parsing itself never fails.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{
    default_scene_title, OutlineDocument, ParseDiagnostic, SceneField, SceneRecord,
    DEFAULT_VIDEO_TITLE, SCENE_END, SCENE_START,
};
use super::sections;

// @const: Scene header, pipe and title optional
static HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^---SCENE:\s*(\d+)\s*(?:\|\s*(.*?))?\s*---$").unwrap()
});

/// Number and title read from a scene header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneHeader {
    pub number: u32,
    /// `None` when the header has no pipe or an empty title
    pub title: Option<String>,
}

/// Parse a single `---SCENE: n | title---` line.
pub fn parse_header(line: &str) -> Option<SceneHeader> {
    let captures = HEADER_REGEX.captures(line.trim())?;
    let number = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let title = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());
    Some(SceneHeader { number, title })
}

/// A block between a header and its closing delimiter
struct OpenBlock<'a> {
    /// 1-based line of the header
    line: usize,
    header_text: &'a str,
    header: Option<SceneHeader>,
    body: Vec<&'a str>,
}

/// Outline parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineParser {
    /// Also read refinement sections (precise objects, hooks, ...) inside blocks
    read_enrichment: bool,
}

impl OutlineParser {
    /// Parser for first-pass outlines
    pub fn new() -> Self {
        Self { read_enrichment: false }
    }

    /// Parser that also reads refinement sections
    pub fn with_enrichment() -> Self {
        Self { read_enrichment: true }
    }

    /// Parse a complete outline document.
    pub fn parse(&self, text: &str) -> OutlineDocument {
        let (scenes, diagnostics) = self.parse_scenes(text);
        debug!(
            "Parsed outline with {} scene(s), {} skipped block(s)",
            scenes.len(),
            diagnostics.len()
        );
        OutlineDocument {
            video_title: extract_video_title(text),
            scenes,
            raw_text: text.to_string(),
            refined_text: None,
            diagnostics,
        }
    }

    /// Parse scene blocks in the order they appear.
    pub fn parse_scenes(&self, text: &str) -> (Vec<SceneRecord>, Vec<ParseDiagnostic>) {
        let mut scenes = Vec::new();
        let mut diagnostics = Vec::new();
        let mut open: Option<OpenBlock<'_>> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = raw_line.trim();

            if trimmed.starts_with(SCENE_START) {
                if let Some(block) = open.take() {
                    diagnostics.push(ParseDiagnostic {
                        line: block.line,
                        message: format!(
                            "Scene block is not terminated before the next scene header at line {}",
                            line_number
                        ),
                    });
                }
                open = Some(OpenBlock {
                    line: line_number,
                    header_text: trimmed,
                    header: parse_header(trimmed),
                    body: Vec::new(),
                });
            } else if trimmed == SCENE_END {
                match open.take() {
                    Some(OpenBlock { header: Some(header), header_text, body, .. }) => {
                        scenes.push(self.build_scene(header, header_text, &body));
                    }
                    Some(block) => diagnostics.push(ParseDiagnostic {
                        line: block.line,
                        message: format!("Malformed scene header: {}", block.header_text),
                    }),
                    None => diagnostics.push(ParseDiagnostic {
                        line: line_number,
                        message: "Closing delimiter without a scene header".to_string(),
                    }),
                }
            } else if let Some(block) = open.as_mut() {
                block.body.push(raw_line.trim_end());
            }
        }

        if let Some(block) = open {
            diagnostics.push(ParseDiagnostic {
                line: block.line,
                message: "Scene block is not terminated before the end of the outline".to_string(),
            });
        }

        (scenes, diagnostics)
    }

    fn build_scene(&self, header: SceneHeader, header_text: &str, body: &[&str]) -> SceneRecord {
        let mut scene = SceneRecord::new(header.number);
        scene.title = header.title.unwrap_or_else(|| default_scene_title(header.number));

        for line in body {
            if let Some((field, value)) = SceneField::match_line(line.trim()) {
                scene.set_field(field, value);
            }
        }

        let body_text = body.join("\n");
        let body_text = body_text.trim();
        scene.raw_content = if body_text.is_empty() {
            format!("{}\n{}", header_text, SCENE_END)
        } else {
            format!("{}\n{}\n{}", header_text, body_text, SCENE_END)
        };

        if self.read_enrichment {
            sections::read_sections(body_text).apply_to(&mut scene);
        }

        debug!("Parsed scene {}: {}", scene.number, scene.title);
        scene
    }
}

/// Parse a first-pass outline.
pub fn parse_outline(text: &str) -> OutlineDocument {
    OutlineParser::new().parse(text)
}

/// Parse an outline that may already contain refinement sections.
pub fn parse_refined_outline(text: &str) -> OutlineDocument {
    OutlineParser::with_enrichment().parse(text)
}

/// Extract the video title from the first non-empty line.
///
/// A line that looks like a scene delimiter means the outline has no title.
/// A leading Markdown heading marker is dropped.
pub fn extract_video_title(text: &str) -> String {
    let first = text.lines().map(str::trim).find(|line| !line.is_empty());
    match first {
        Some(line) if !line.starts_with(SCENE_START) => {
            let title = line.trim_start_matches('#').trim();
            if title.is_empty() {
                DEFAULT_VIDEO_TITLE.to_string()
            } else {
                title.to_string()
            }
        }
        _ => DEFAULT_VIDEO_TITLE.to_string(),
    }
}
