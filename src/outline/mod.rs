/*!
 * Outline structuring and validation engine.
 *
 * - `parser`: raw outline text to scene records
 * - `sections`: reader for the refinement sections of a scene
 * - `refinement`: concurrent per-scene enrichment through an oracle
 * - `validator`: structural checks producing a `ValidationReport`
 * - `converter`: scene records to normalized, JSON-ready data
 */

pub mod converter;
pub mod model;
pub mod parser;
pub mod prompts;
pub mod rate_limit;
pub mod refinement;
pub mod sections;
pub mod validator;

pub use converter::{convert_outline, convert_scene, OutlineJson, SceneJson};
pub use model::{assemble_outline, ContinuityHooks, OutlineDocument, ParseDiagnostic, SceneRecord};
pub use parser::{parse_outline, parse_refined_outline, OutlineParser};
pub use refinement::{RefinementOutcome, RefinerOptions, SceneRefiner};
pub use validator::{validate_outline, OutlineValidator, ValidationReport, ValidatorOptions};
