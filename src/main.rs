// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use scenecraft::app_config::{self, Config, OracleProvider};
use scenecraft::app_controller::{Controller, GenerationRequest};
use scenecraft::file_utils::FileManager;
use scenecraft::outline::prompts::{Complexity, Depth};
use scenecraft::providers::OracleClient;

/// CLI Wrapper for OracleProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOracleProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
}

impl From<CliOracleProvider> for OracleProvider {
    fn from(cli_provider: CliOracleProvider) -> Self {
        match cli_provider {
            CliOracleProvider::OpenAI => OracleProvider::OpenAI,
            CliOracleProvider::Anthropic => OracleProvider::Anthropic,
            CliOracleProvider::Ollama => OracleProvider::Ollama,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new outline for a topic, then refine, validate and convert it
    Generate {
        /// Topic of the lesson
        topic: String,

        /// Output directory for the artifacts
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Audience level
        #[arg(long)]
        complexity: Option<String>,

        /// Depth of coverage
        #[arg(long)]
        depth: Option<String>,

        /// Visual style preference
        #[arg(long)]
        style: Option<String>,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Parse an outline file and print its scenes as JSON
    Parse {
        /// Outline file
        input: PathBuf,
    },

    /// Refine an existing outline file, then validate and convert it
    Refine {
        /// Outline file
        input: PathBuf,

        /// Output directory for the artifacts
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Validate an outline file, or every outline file in a directory
    Validate {
        /// Outline file or directory
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a valid outline file to structured JSON
    Convert {
        /// Outline file
        input: PathBuf,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the configured provider is reachable
    Check,

    /// Generate shell completions for scenecraft
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// scenecraft - scene outlines for educational animations
///
/// Generates, refines and validates delimiter-based scene outlines and turns
/// them into structured JSON.
#[derive(Parser, Debug)]
#[command(name = "scenecraft")]
#[command(version)]
#[command(about = "Scene outline structuring and validation for educational animations")]
#[command(long_about = "scenecraft turns semi-structured scene outlines into validated, structured data.

EXAMPLES:
    scenecraft generate \"De Morgan's laws\"          # Generate, refine, validate, convert
    scenecraft -p ollama generate \"Vectors\" -o out  # Use a local model
    scenecraft refine outline.txt -f                # Refine an existing outline
    scenecraft validate outlines/                   # Validate a directory of outlines
    scenecraft convert refined_outline.txt          # Print structured JSON
    scenecraft -p anthropic check                   # Test the provider connection
    scenecraft completions bash > scenecraft.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    openai    - OpenAI API (default: gpt-4o-mini, requires API key)
    anthropic - Anthropic API (requires API key)
    ollama    - Local Ollama server")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Oracle provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliOracleProvider>,

    /// Model name to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Installed with the most verbose level; the effective level is set below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "scenecraft", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(cmd_log_level) = &cli.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config = load_config(&cli)?;
    if cli.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    match cli.command {
        Commands::Generate {
            topic,
            output_dir,
            complexity,
            depth,
            style,
            force_overwrite,
        } => {
            let mut request = GenerationRequest::from_config(topic, &config);
            if let Some(complexity) = complexity {
                request.complexity = complexity.parse::<Complexity>()?;
            }
            if let Some(depth) = depth {
                request.depth = depth.parse::<Depth>()?;
            }
            if let Some(style) = style {
                request.style = style;
            }

            let controller = Controller::with_config(config)?;
            let result = controller.generate(&request, &output_dir, force_overwrite).await?;
            print_artifacts(&result.artifacts);
            if !result.report.is_valid {
                return Err(anyhow!("Generated outline needs revision, see {}", output_dir.display()));
            }
        }
        Commands::Refine {
            input,
            output_dir,
            force_overwrite,
        } => {
            let controller = Controller::with_config(config)?;
            let result = controller.refine_file(&input, &output_dir, force_overwrite).await?;
            print_artifacts(&result.artifacts);
            if !result.report.is_valid {
                return Err(anyhow!("Refined outline needs revision, see {}", output_dir.display()));
            }
        }
        Commands::Parse { input } => {
            let controller = Controller::offline(config)?;
            let document = controller.parse_file(&input)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Commands::Validate { input, json } => {
            let controller = Controller::offline(config)?;
            let reports = if input.is_dir() {
                controller.validate_folder(&input)?
            } else {
                vec![(input.clone(), controller.validate_file(&input)?)]
            };

            for (path, report) in &reports {
                if json {
                    println!("{}", serde_json::to_string_pretty(report)?);
                } else {
                    println!("{}: {}", path.display(), report.summary());
                    Controller::log_report(report);
                }
            }

            let invalid = reports.iter().filter(|(_, r)| !r.is_valid).count();
            if invalid > 0 {
                return Err(anyhow!("{} outline(s) failed validation", invalid));
            }
        }
        Commands::Convert { input, output } => {
            let controller = Controller::offline(config)?;
            let (outline_json, _) = controller.convert_file(&input)?;
            let json = serde_json::to_string_pretty(&outline_json)?;
            match output {
                Some(path) => {
                    FileManager::write_to_file(&path, &json)?;
                    info!("Success: {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Check => {
            config.validate_oracle().context("Configuration validation failed")?;
            let client = OracleClient::from_config(&config.oracle);
            client
                .test_connection()
                .await
                .context(format!("Could not reach {}", config.oracle.provider.display_name()))?;
            info!(
                "{} is reachable, using model {}",
                config.oracle.provider.display_name(),
                client.model()
            );
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn print_artifacts(artifacts: &[PathBuf]) {
    for artifact in artifacts {
        info!("Success: {}", artifact.display());
    }
}

/// Load the configuration file, creating a default one if missing, and apply CLI overrides
fn load_config(options: &CommandLineOptions) -> Result<Config> {
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(provider) = &options.provider {
        config.oracle.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        if let Some(provider_config) = config.oracle.get_active_provider_config_mut() {
            provider_config.model = model.clone();
        } else {
            let mut provider_config = app_config::ProviderConfig::new(config.oracle.provider);
            provider_config.model = model.clone();
            config.oracle.available_providers.push(provider_config);
        }
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
