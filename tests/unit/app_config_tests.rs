/*!
 * Tests for configuration loading and conversion
 */

use anyhow::Result;
use sermonscribe::app_config::{Config, LogLevel, LookupProvider};
use sermonscribe::detection::InterjectionScoring;

use crate::common::{create_temp_dir, create_test_file, create_verses_file};

#[test]
fn test_loadOrCreate_existingFile_shouldReadEverySection() -> Result<()> {
    let dir = create_temp_dir()?;
    let verses = create_verses_file(dir.path())?;
    let json = serde_json::json!({
        "normalizer": { "preserve_verbose_speech": true },
        "detector": { "confidence_floor": 0.5, "interjection_scoring": "penalize" },
        "segmentation": { "enabled": false },
        "lookup": { "provider": "json_file", "verses_file": verses, "translation": "KJV" },
        "scorer": { "timeout_ms": 250 },
        "log_level": "debug"
    });
    let path = create_test_file(dir.path(), "conf.json", &json.to_string())?;

    let config = Config::load_or_create(&path)?;
    config.validate()?;

    assert!(config.normalizer.enabled);
    assert!(config.normalizer.preserve_verbose_speech);
    assert_eq!(config.detector.interjection_scoring, InterjectionScoring::Penalize);
    assert_eq!(config.lookup.provider, LookupProvider::JsonFile);
    assert_eq!(config.log_level, LogLevel::Debug);

    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.detector.confidence_floor, 0.5);
    assert!(!pipeline.segmentation.enabled);
    assert_eq!(pipeline.scorer_timeout_ms, 250);
    assert_eq!(pipeline.translation.as_deref(), Some("KJV"));
    assert!(pipeline.lookup_timeout_ms >= config.lookup.timeout_secs * 1000);
    Ok(())
}

#[test]
fn test_loadOrCreate_invalidJson_shouldFail() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = create_test_file(dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_validate_badEndpoint_shouldFail() {
    let mut config = Config::default();
    config.lookup.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}
