/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use scenecraft::app_config::{Config, LogLevel, OracleProvider, ProviderConfig};
use scenecraft::outline::prompts::{Complexity, Depth};
use scenecraft::outline::validator::ValidatorOptions;
use scenecraft::outline::RefinerOptions;
use std::time::Duration;

use crate::common::{create_temp_dir, create_test_file};

/// Test that a saved configuration loads back unchanged
#[test]
fn test_config_file_round_trip_should_preserve_values() -> Result<()> {
    let temp_dir = create_temp_dir()?;

    let mut config = Config::default();
    config.oracle.provider = OracleProvider::Anthropic;
    config.refinement.max_concurrency = 2;
    config.generation.complexity = Complexity::Beginner;
    config.log_level = LogLevel::Warn;

    let json = serde_json::to_string_pretty(&config)?;
    let path = create_test_file(temp_dir.path(), "conf.json", &json)?;

    let loaded: Config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    assert_eq!(loaded.oracle.provider, OracleProvider::Anthropic);
    assert_eq!(loaded.oracle.get_model(), "claude-3-5-haiku-latest");
    assert_eq!(loaded.refinement.max_concurrency, 2);
    assert_eq!(loaded.generation.complexity, Complexity::Beginner);
    assert_eq!(loaded.generation.depth, Depth::Detailed);
    assert_eq!(loaded.log_level, LogLevel::Warn);
    Ok(())
}

/// Test that an empty object deserializes to the defaults
#[test]
fn test_empty_json_should_give_default_sections() -> Result<()> {
    let config: Config = serde_json::from_str("{}")?;

    assert_eq!(config.oracle.provider, OracleProvider::OpenAI);
    assert!(config.oracle.available_providers.is_empty());
    assert_eq!(config.oracle.get_model(), "gpt-4o-mini");
    assert_eq!(config.oracle.get_rate_limit(), Some(60));
    assert_eq!(config.oracle.common.retry_count, 2);
    assert_eq!(config.generation.style, "clean and modern");
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that provider entries override the built-in defaults
#[test]
fn test_provider_entry_should_override_defaults() -> Result<()> {
    let json = r#"{
        "oracle": {
            "provider": "ollama",
            "available_providers": [
                { "type": "ollama", "model": "qwen2.5:7b", "endpoint": "http://gpu-box:11434", "rate_limit": 30 }
            ]
        }
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.oracle.get_model(), "qwen2.5:7b");
    assert_eq!(config.oracle.get_endpoint(), "http://gpu-box:11434");
    assert_eq!(config.oracle.get_timeout_secs(), 120);
    assert_eq!(config.oracle.get_rate_limit(), Some(30));
    Ok(())
}

/// Test configuration validation
#[test]
fn test_config_validation_should_reject_zero_timeout() {
    let mut config = Config::default();
    config.refinement.call_timeout_secs = 0;
    assert!(config.validate().is_err());

    config.refinement.call_timeout_secs = 1;
    assert!(config.validate().is_ok());
}

/// Test that a configured key satisfies the oracle check
#[test]
fn test_validate_oracle_should_accept_configured_key() {
    let mut config = Config::default();
    config.oracle.provider = OracleProvider::Anthropic;
    if let Some(provider) = config.oracle.get_active_provider_config_mut() {
        provider.api_key = "sk-ant-test".to_string();
    }

    assert!(config.validate_oracle().is_ok());
    assert_eq!(config.oracle.get_api_key(), "sk-ant-test");
}

/// Test that new provider configs carry per-provider defaults
#[test]
fn test_provider_config_new_should_use_provider_defaults() {
    let openai = ProviderConfig::new(OracleProvider::OpenAI);
    assert_eq!(openai.provider_type, "openai");
    assert_eq!(openai.endpoint, "https://api.openai.com/v1");
    assert_eq!(openai.rate_limit, Some(60));

    let anthropic = ProviderConfig::new(OracleProvider::Anthropic);
    assert_eq!(anthropic.rate_limit, Some(45));
    assert_eq!(anthropic.timeout_secs, 120);
}

/// Test that configuration sections convert to engine options
#[test]
fn test_sections_should_convert_to_engine_options() {
    let mut config = Config::default();
    config.refinement.batch_delay_ms = 250;
    config.refinement.abort_on_failed_batch = false;
    config.validation.min_plan_chars = 80;

    let refiner: RefinerOptions = config.refinement.clone().into();
    assert_eq!(refiner.max_concurrency, 4);
    assert_eq!(refiner.batch_delay, Duration::from_millis(250));
    assert_eq!(refiner.call_timeout, Duration::from_secs(60));
    assert!(!refiner.abort_on_failed_batch);

    let validator: ValidatorOptions = config.validation.clone().into();
    assert_eq!(validator.min_plan_chars, 80);
}
