/*!
 * # scenecraft - scene outlines for educational animations
 *
 * A Rust library that turns semi-structured, delimiter-based scene outlines
 * into validated, strongly typed data.
 *
 * ## Features
 *
 * - Parse `---SCENE: n | title---` blocks into scene records
 * - Refine every scene through a text-generation oracle, concurrently and
 *   with per-scene fallback:
 *   - OpenAI API
 *   - Anthropic API
 *   - Ollama (local LLM)
 * - Validate numbering, required fields, object-name uniqueness and
 *   cross-scene imports
 * - Convert outlines to normalized JSON
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `outline`: The structuring engine:
 *   - `outline::parser`: Scene block parser
 *   - `outline::sections`: Refinement section reader
 *   - `outline::refinement`: Scene refinement merger
 *   - `outline::validator`: Outline validator
 *   - `outline::converter`: Structured data conversion
 * - `providers`: Oracle trait and client implementations
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod outline;
pub mod providers;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, GenerationRequest, WorkflowResult};
pub use errors::{ProviderError, RefinementError};
pub use outline::{
    convert_outline, parse_outline, parse_refined_outline, validate_outline, OutlineDocument,
    OutlineJson, SceneRecord, ValidationReport,
};
pub use providers::{MockOracle, Oracle, OracleClient};
