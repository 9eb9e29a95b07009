use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::{
    FileManager, OUTLINE_FILE, OUTLINE_JSON_FILE, REFINED_OUTLINE_FILE, VALIDATION_FILE,
};
use crate::outline::prompts::{outline_prompt, Complexity, Depth, OUTLINE_SYSTEM_PROMPT};
use crate::outline::{
    convert_outline, parse_outline, parse_refined_outline, OutlineDocument, OutlineJson,
    OutlineValidator, SceneRefiner, ValidationReport,
};
use crate::providers::{Oracle, OracleClient};

// @module: Application controller for the outline workflow

/// What to generate an outline about
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub complexity: Complexity,
    pub depth: Depth,
    pub style: String,
}

impl GenerationRequest {
    /// Request using the generation defaults of the configuration
    pub fn from_config(topic: impl Into<String>, config: &Config) -> Self {
        Self {
            topic: topic.into(),
            complexity: config.generation.complexity,
            depth: config.generation.depth,
            style: config.generation.style.clone(),
        }
    }
}

/// Everything produced by one workflow run
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    /// Final document, refined when refinement ran
    pub document: OutlineDocument,
    pub report: ValidationReport,
    /// Present only when the outline validated
    pub outline_json: Option<OutlineJson>,
    /// Aggregate warnings from the refinement pass
    pub refinement_warnings: Vec<String>,
    /// Files written
    pub artifacts: Vec<PathBuf>,
}

/// Main application controller for outline generation, refinement and validation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Text-generation backend
    oracle: Arc<dyn Oracle>,
    // @field: Draw progress bars
    show_progress: bool,
}

impl Controller {
    /// Create a controller talking to the configured provider
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        config.validate_oracle().context("Configuration validation failed")?;
        let oracle: Arc<dyn Oracle> = Arc::new(OracleClient::from_config(&config.oracle));
        Ok(Self {
            config,
            oracle,
            show_progress: true,
        })
    }

    /// Create a controller with an explicit oracle
    pub fn with_oracle(config: Config, oracle: Arc<dyn Oracle>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self {
            config,
            oracle,
            show_progress: false,
        })
    }

    /// Create a controller that needs no oracle (parse, validate, convert)
    pub fn offline(config: Config) -> Result<Self> {
        Self::with_oracle(config, Arc::new(NoOracle))
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate a new outline for a topic and run the full workflow on it
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        output_dir: &Path,
        force_overwrite: bool,
    ) -> Result<WorkflowResult> {
        FileManager::check_overwrite(output_dir, &Self::artifact_names(), force_overwrite)?;
        let start_time = Instant::now();

        info!(
            "Generating outline for \"{}\" with {} ({} / {})",
            request.topic,
            self.oracle.name(),
            request.complexity,
            request.depth
        );
        let prompt = outline_prompt(&request.topic, request.complexity, request.depth, &request.style);
        let text = self
            .oracle
            .generate(OUTLINE_SYSTEM_PROMPT, &prompt)
            .await
            .context("Outline generation failed")?;

        let document = parse_outline(&text);
        if document.is_empty() {
            return Err(anyhow!("Outline generation produced no parsable scenes"));
        }

        let result = self.process_document(document, output_dir).await?;
        info!("Workflow completed in {}.", Self::format_duration(start_time.elapsed()));
        Ok(result)
    }

    /// Refine, validate and convert an outline file
    pub async fn refine_file(
        &self,
        input_file: &Path,
        output_dir: &Path,
        force_overwrite: bool,
    ) -> Result<WorkflowResult> {
        FileManager::check_overwrite(output_dir, &Self::artifact_names(), force_overwrite)?;
        let start_time = Instant::now();

        let document = self.parse_file(input_file)?;
        if document.is_empty() {
            return Err(anyhow!("No scenes found in outline: {:?}", input_file));
        }

        let result = self.process_document(document, output_dir).await?;
        info!("Workflow completed in {}.", Self::format_duration(start_time.elapsed()));
        Ok(result)
    }

    /// Parse an outline file, refinement sections included
    pub fn parse_file(&self, input_file: &Path) -> Result<OutlineDocument> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        let text = FileManager::read_to_string(input_file)?;
        let document = parse_refined_outline(&text);
        Self::log_diagnostics(&document);
        debug!("Parsed {:?}: {} scene(s)", input_file, document.len());
        Ok(document)
    }

    /// Validate one outline file
    pub fn validate_file(&self, input_file: &Path) -> Result<ValidationReport> {
        let document = self.parse_file(input_file)?;
        Ok(self.validator().validate(&document.scenes, &document.video_title))
    }

    /// Validate every outline file below a directory
    pub fn validate_folder(&self, input_dir: &Path) -> Result<Vec<(PathBuf, ValidationReport)>> {
        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_outline_files(input_dir)?;
        if files.is_empty() {
            warn!("No outline files found in {:?}", input_dir);
        }

        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            match self.validate_file(&file) {
                Ok(report) => reports.push((file, report)),
                Err(e) => error!("Error validating {:?}: {}", file, e),
            }
        }

        let valid = reports.iter().filter(|(_, r)| r.is_valid).count();
        info!("Validated {} file(s), {} valid", reports.len(), valid);
        Ok(reports)
    }

    /// Convert an outline file to structured data.
    ///
    /// Conversion is refused when the outline does not validate.
    pub fn convert_file(&self, input_file: &Path) -> Result<(OutlineJson, ValidationReport)> {
        let document = self.parse_file(input_file)?;
        let report = self.validator().validate(&document.scenes, &document.video_title);
        if !report.is_valid {
            return Err(anyhow!(
                "Outline is not valid, fix these errors first: {}",
                report.errors.join("; ")
            ));
        }
        Ok((convert_outline(&document), report))
    }

    fn validator(&self) -> OutlineValidator {
        OutlineValidator::with_options(self.config.validation.clone().into())
    }

    fn artifact_names() -> [&'static str; 4] {
        [OUTLINE_FILE, REFINED_OUTLINE_FILE, OUTLINE_JSON_FILE, VALIDATION_FILE]
    }

    /// Refinement, validation and conversion, writing artifacts along the way
    async fn process_document(
        &self,
        mut document: OutlineDocument,
        output_dir: &Path,
    ) -> Result<WorkflowResult> {
        Self::log_diagnostics(&document);
        info!("Outline \"{}\" has {} scene(s)", document.video_title, document.len());

        FileManager::ensure_dir(output_dir)?;
        let mut artifacts = Vec::new();

        let outline_path = output_dir.join(OUTLINE_FILE);
        FileManager::write_to_file(&outline_path, &document.raw_text)?;
        artifacts.push(outline_path);

        let refiner = SceneRefiner::new(self.oracle.clone(), self.config.refinement.clone().into());
        let progress_bar = self.refinement_progress_bar(document.len());

        let outcome = refiner
            .refine(&mut document, |done, _total| progress_bar.set_position(done as u64))
            .await;
        progress_bar.finish_and_clear();
        let outcome = outcome.context("Scene refinement failed")?;

        for warning in &outcome.warnings {
            warn!("{}", warning);
        }
        info!("Refined {}/{} scene(s)", outcome.refined_count(), outcome.scenes.len());

        let refined_path = output_dir.join(REFINED_OUTLINE_FILE);
        FileManager::write_to_file(&refined_path, document.current_text())?;
        artifacts.push(refined_path);

        let report = self.validator().validate(&document.scenes, &document.video_title);
        Self::log_report(&report);

        let validation_path = output_dir.join(VALIDATION_FILE);
        let report_json =
            serde_json::to_string_pretty(&report).context("Failed to serialize validation report")?;
        FileManager::write_to_file(&validation_path, &report_json)?;
        artifacts.push(validation_path);

        let outline_json = if report.is_valid {
            let outline_json = convert_outline(&document);
            let json_path = output_dir.join(OUTLINE_JSON_FILE);
            let json =
                serde_json::to_string_pretty(&outline_json).context("Failed to serialize outline")?;
            FileManager::write_to_file(&json_path, &json)?;
            artifacts.push(json_path);
            Some(outline_json)
        } else {
            warn!("Outline needs revision, structured output was not written");
            None
        };

        Ok(WorkflowResult {
            document,
            report,
            outline_json,
            refinement_warnings: outcome.warnings,
            artifacts,
        })
    }

    fn refinement_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scenes ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Refining");
        progress_bar
    }

    fn log_diagnostics(document: &OutlineDocument) {
        for diagnostic in &document.diagnostics {
            warn!("Skipped scene block at line {}: {}", diagnostic.line, diagnostic.message);
        }
    }

    /// Log the findings of a report
    pub fn log_report(report: &ValidationReport) {
        for finding in &report.errors {
            error!("{}", finding);
        }
        for finding in &report.warnings {
            warn!("{}", finding);
        }
        for finding in &report.suggestions {
            debug!("{}", finding);
        }
        if report.is_valid {
            info!("Outline is valid: {}", report.summary());
        } else {
            warn!("Outline is not valid: {}", report.summary());
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Oracle used by offline controllers; every call fails
#[derive(Debug)]
struct NoOracle;

#[async_trait::async_trait]
impl Oracle for NoOracle {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, crate::errors::ProviderError> {
        Err(crate::errors::ProviderError::ConnectionError(
            "No oracle configured for offline commands".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
