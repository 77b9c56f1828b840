/*!
 * Common test utilities for the sermonscribe test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use sermonscribe::document::{DocumentTree, NodeKind};
use sermonscribe::pipeline::{PipelineConfig, SermonPipeline};
use sermonscribe::providers::mock::{ScriptedSimilarity, StaticVerseLookup};

pub const JOHN_3_16: &str =
    "For God so loved the world, that he gave his only begotten Son, that whosoever believeth in him should not perish, but have everlasting life.";

pub const ROMANS_12_1: &str = "I beseech you therefore, brethren, by the mercies of God, that ye present your bodies a living sacrifice, holy, acceptable unto God, which is your reasonable service.";

pub const PSALM_23_1: &str = "The LORD is my shepherd; I shall not want.";

/// Transcript with two quotes, an interjection and a closing prayer.
pub const SAMPLE_SERMON: &str = "Good morning church. It is good to see every one of you. \
Last week my son came home with a smile on his face. \
Romans 12 one says Paul writes I beseech you therefore brethren by the mercies of God that ye present your bodies a living, a what? sacrifice holy acceptable unto God which is your reasonable service. \
What is Paul saying here. He is saying give everything. Hold nothing back. \
Psalm 23:1 the Lord is my shepherd I shall not want. \
Let us pray. Father we thank you for this day.";

/// Routes crate logging to the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes a verse JSON file with the sample verses
pub fn create_verses_file(dir: &Path) -> Result<PathBuf> {
    let verses = serde_json::json!({
        "John 3:16": JOHN_3_16,
        "Romans 12:1": ROMANS_12_1,
        "Psalm 23:1": PSALM_23_1,
    });
    create_test_file(dir, "verses.json", &serde_json::to_string_pretty(&verses)?)
}

/// Verse lookup that knows the sample verses
pub fn sample_lookup() -> StaticVerseLookup {
    StaticVerseLookup::new()
        .with_verse("John 3:16", JOHN_3_16)
        .with_verse("Romans 12:1", ROMANS_12_1)
        .with_verse("Psalm 23:1", PSALM_23_1)
}

/// Pipeline over the sample verses with a uniformly high similarity score
pub fn sample_pipeline(config: PipelineConfig) -> SermonPipeline {
    SermonPipeline::new(config, Arc::new(sample_lookup()), Arc::new(ScriptedSimilarity::new(0.9)))
}

/// Text of every passage, in document order
pub fn passage_texts(tree: &DocumentTree) -> Vec<String> {
    tree.passages()
        .into_iter()
        .map(|id| {
            tree.children(id)
                .iter()
                .filter_map(|child| tree.text_of(*child))
                .collect::<String>()
        })
        .collect()
}

/// Text of every paragraph, in document order
pub fn paragraph_texts(tree: &DocumentTree) -> Vec<String> {
    tree.paragraphs()
        .iter()
        .map(|paragraph| {
            let mut text = String::new();
            for child in tree.children(*paragraph) {
                match &tree.node(*child).map(|n| n.kind.clone()) {
                    Ok(NodeKind::Passage(_)) => {
                        for leaf in tree.children(*child) {
                            text.push_str(tree.text_of(*leaf).unwrap_or_default());
                        }
                    }
                    _ => text.push_str(tree.text_of(*child).unwrap_or_default()),
                }
            }
            text
        })
        .collect()
}

/// Asserts every structural invariant plus conservation of `source`
pub fn assert_tree_sound(tree: &DocumentTree, source: &str) {
    tree.validate().expect("tree invariants");
    assert_eq!(tree.render_text(), source);
    for paragraph in tree.paragraphs() {
        let children = tree.children(*paragraph);
        let has_passage = children
            .iter()
            .any(|c| matches!(tree.node(*c).map(|n| &n.kind), Ok(NodeKind::Passage(_))));
        if has_passage {
            assert_eq!(children.len(), 1, "passage must be the sole child of {}", paragraph);
        }
    }
}
