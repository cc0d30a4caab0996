/*!
 * Unit tests for configuration loading and validation
 */

use crate::common;

use yantwai::app_config::{Config, FilterMode, Provider};

#[test]
fn test_default_config_should_validate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_should_round_trip_through_file() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.content.provider = Provider::Gemini;
    config.content.model = "gemini-2.5-pro".to_string();
    config.content.thinking_budget = Some(2048);
    config.save(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.content.provider, Provider::Gemini);
    assert_eq!(loaded.content.model, "gemini-2.5-pro");
    assert_eq!(loaded.content.thinking_budget, Some(2048));
}

#[test]
fn test_from_file_with_missing_file_should_create_default() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::from_file(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.content.provider, Provider::OpenAi);
}

#[test]
fn test_partial_config_should_fill_defaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        &dir.path().to_path_buf(),
        "conf.json",
        r#"{"source_language": "Japanese", "content": {"provider": "vertex"}}"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.source_language, "Japanese");
    assert_eq!(config.content.provider, Provider::Vertex);
    // Untouched sections keep their defaults
    assert_eq!(config.target_language, "Vietnamese");
    assert_eq!(config.content.concurrent_requests, 4);
    assert_eq!(config.filtering.mode, FilterMode::Off);
    assert!(config.title.enabled);
}

#[test]
fn test_validate_should_reject_zero_concurrency() {
    let mut config = Config::default();
    config.content.concurrent_requests = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_should_reject_out_of_range_temperature() {
    let mut config = Config::default();
    config.retry.temperature = 3.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_required_providers_should_dedup_across_tasks() {
    let mut config = Config::default();
    config.content.provider = Provider::Gemini;
    config.retry.provider = Provider::Gemini;
    config.title.task.provider = Provider::Gemini;
    assert_eq!(config.required_providers(), vec![Provider::Gemini]);

    config.retry.provider = Provider::OpenAi;
    let providers = config.required_providers();
    assert_eq!(providers.len(), 2);
    assert!(providers.contains(&Provider::Gemini));
    assert!(providers.contains(&Provider::OpenAi));
}

#[test]
fn test_required_providers_should_skip_disabled_title_task() {
    let mut config = Config::default();
    config.content.provider = Provider::OpenAi;
    config.retry.provider = Provider::OpenAi;
    config.title.enabled = false;
    config.title.task.provider = Provider::Vertex;
    assert_eq!(config.required_providers(), vec![Provider::OpenAi]);
}

#[test]
fn test_provider_sdk_codes_should_be_stable() {
    // Output and log file names embed these; they must not drift
    assert_eq!(Provider::OpenAi.sdk_code(), "oai");
    assert_eq!(Provider::Gemini.sdk_code(), "gmn");
    assert_eq!(Provider::Vertex.sdk_code(), "vtx");
}

#[test]
fn test_model_name_should_fall_back_per_provider() {
    let mut config = Config::default();
    config.content.model = String::new();
    config.content.provider = Provider::OpenAi;
    assert_eq!(config.content.model_name(), "deepseek-chat");
    config.content.provider = Provider::Gemini;
    assert_eq!(config.content.model_name(), "gemini-2.5-flash");
}
