/*!
 * Tests for configuration loading and validation
 */

use bubblefish::app_config::{Config, LogLevel};

use crate::common::create_temp_dir;

#[test]
fn test_defaultConfig_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "zh-tw");
    assert_eq!(config.provider.model, "gemini-2.0-flash");
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_fromFileOrDefault_withMissingFile_shouldFallBackToDefaults() {
    let dir = create_temp_dir().unwrap();
    let config = Config::from_file_or_default(dir.path().join("missing.json")).unwrap();
    assert_eq!(config.source_language, Config::default().source_language);
}

#[test]
fn test_saveAndReload_shouldRoundTrip() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "en".to_string();
    config.provider.timeout_secs = 30;
    config.save_to_file(&path).unwrap();

    let reloaded = Config::from_file(&path).unwrap();
    assert_eq!(reloaded.target_language, "en");
    assert_eq!(reloaded.provider.timeout_secs, 30);
}

#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, r#"{ "target_language": "en" }"#).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.target_language, "en");
    assert_eq!(config.source_language, "ja");
    assert_eq!(config.provider.model, "gemini-2.0-flash");
}

#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut same_languages = Config::default();
    same_languages.target_language = same_languages.source_language.clone();
    assert!(same_languages.validate().is_err());

    let mut bad_code = Config::default();
    bad_code.source_language = "xx".to_string();
    assert!(bad_code.validate().is_err());

    let mut empty_model = Config::default();
    empty_model.provider.model = "  ".to_string();
    assert!(empty_model.validate().is_err());

    let mut zero_timeout = Config::default();
    zero_timeout.provider.timeout_secs = 0;
    assert!(zero_timeout.validate().is_err());
}

#[test]
fn test_resolveApiKey_shouldPreferConfigValue() {
    let mut config = Config::default();
    config.provider.api_key = "from-config".to_string();
    assert_eq!(config.resolve_api_key().as_deref(), Some("from-config"));
}
