/*!
 * Tests for the application lifecycle: configuration, controller, outputs
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use sermonscribe::app_config::{Config, LookupProvider};
use sermonscribe::app_controller::{Controller, FolderSummary};

use crate::common::{SAMPLE_SERMON, create_temp_dir, create_test_file, create_verses_file};

fn json_file_controller(dir: &Path) -> Result<Controller> {
    let mut config = Config::default();
    config.lookup.provider = LookupProvider::JsonFile;
    config.lookup.verses_file = Some(create_verses_file(dir)?);
    config.validate()?;
    Controller::with_config(config)
}

fn read_record(path: &Path) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[tokio::test]
async fn test_run_sampleSermon_shouldWriteSermonDocument() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = json_file_controller(dir.path())?;
    let input = create_test_file(dir.path(), "sunday.txt", SAMPLE_SERMON)?;
    let output_dir = dir.path().join("out");

    let written = controller.run(input, output_dir.clone(), None, false).await?;

    let path = written.expect("output written");
    assert_eq!(path, output_dir.join("sunday.sermon.json"));
    let record = read_record(&path)?;
    assert_eq!(record["document"]["type"], "document");
    assert_eq!(record["references"].as_array().map(Vec::len), Some(2));
    assert_eq!(record["report"]["passages"], 2);
    Ok(())
}

#[tokio::test]
async fn test_run_existingOutput_shouldSkipUnlessForced() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = json_file_controller(dir.path())?;
    let input = create_test_file(dir.path(), "sunday.txt", SAMPLE_SERMON)?;
    let existing = create_test_file(dir.path(), "sunday.sermon.json", "{}")?;

    let skipped = controller.run(input.clone(), dir.path().to_path_buf(), None, false).await?;
    assert!(skipped.is_none());
    assert_eq!(fs::read_to_string(&existing)?, "{}");

    let forced = controller.run(input, dir.path().to_path_buf(), None, true).await?;
    assert_eq!(forced, Some(existing.clone()));
    assert_eq!(read_record(&existing)?["report"]["passages"], 2);
    Ok(())
}

#[tokio::test]
async fn test_run_siblingCandidates_shouldReplaceScanning() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = json_file_controller(dir.path())?;
    let input = create_test_file(dir.path(), "sunday.txt", SAMPLE_SERMON)?;
    let position = SAMPLE_SERMON.find("Psalm 23:1").unwrap();
    let candidates = serde_json::json!([{ "reference": "Psalm 23:1", "position": position }]);
    create_test_file(dir.path(), "sunday.candidates.json", &candidates.to_string())?;

    let path = controller.run(input, dir.path().join("out"), None, false).await?.expect("output written");

    let record = read_record(&path)?;
    assert_eq!(record["report"]["candidates"], 1);
    assert_eq!(record["references"][0]["reference"]["book"], "Psalms");
    Ok(())
}

#[tokio::test]
async fn test_runFolder_mixedInputs_shouldSummarize() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = json_file_controller(dir.path())?;
    let sermons = dir.path().join("sermons");
    fs::create_dir_all(sermons.join("older"))?;
    create_test_file(&sermons, "a.txt", SAMPLE_SERMON)?;
    create_test_file(&sermons.join("older"), "b.txt", "No scripture this week. Let us pray.")?;
    create_test_file(&sermons, "b.sermon.json", "{}")?;
    create_test_file(&sermons, "notes.md", "not a transcript")?;
    fs::write(sermons.join("c.txt"), [0xff_u8, 0xfe, 0x00])?;

    let summary = controller.run_folder(sermons.clone(), None, false).await?;

    assert_eq!(summary, FolderSummary { processed: 2, skipped: 0, errors: 1 });
    assert!(sermons.join("a.sermon.json").is_file());
    assert!(sermons.join("older").join("b.sermon.json").is_file());
    assert_eq!(fs::read_to_string(sermons.join("b.sermon.json"))?, "{}");
    Ok(())
}

#[tokio::test]
async fn test_runFolder_noTranscripts_shouldFail() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = json_file_controller(dir.path())?;
    assert!(controller.run_folder(dir.path().to_path_buf(), None, false).await.is_err());
    Ok(())
}

#[test]
fn test_withConfig_jsonProviderWithoutFile_shouldFail() {
    let mut config = Config::default();
    config.lookup.provider = LookupProvider::JsonFile;
    assert!(Controller::with_config(config).is_err());
}
