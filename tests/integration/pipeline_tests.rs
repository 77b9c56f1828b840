/*!
 * End-to-end tests: transcript in, document tree out
 */

use std::sync::Arc;

use sermonscribe::document::{DocumentTree, NodeKind};
use sermonscribe::pipeline::{PipelineConfig, ReferenceCandidate, SermonPipeline};
use sermonscribe::providers::mock::{ScriptedSimilarity, StaticVerseLookup};

use crate::common::{SAMPLE_SERMON, assert_tree_sound, init_test_logging, paragraph_texts, passage_texts, sample_pipeline};

#[tokio::test]
async fn test_process_sampleSermon_shouldIsolateBothPassages() {
    init_test_logging();
    let pipeline = sample_pipeline(PipelineConfig::default());
    let normalized = pipeline.normalize(SAMPLE_SERMON).text;

    let sermon = pipeline.process(SAMPLE_SERMON, None).await.unwrap();

    assert_eq!(sermon.tree.source(), normalized);
    assert_tree_sound(&sermon.tree, &normalized);

    let canonical: Vec<String> = sermon.references.iter().map(|r| r.reference.canonical()).collect();
    assert_eq!(canonical, vec!["Romans 12:1", "Psalms 23:1"]);
    assert!(sermon.report.dropped.is_empty(), "dropped: {:?}", sermon.report.dropped);

    let passages = passage_texts(&sermon.tree);
    assert!(passages[0].starts_with("I beseech"));
    assert!(passages[0].ends_with("reasonable service."));
    assert!(!passages[0].contains("his face"));
    assert!(!passages[0].contains("What is Paul"));
    assert!(passages[1].ends_with("I shall not want."));

    assert!(
        paragraph_texts(&sermon.tree)
            .iter()
            .any(|p| p.trim_start().starts_with("Let us pray."))
    );
}

#[tokio::test]
async fn test_process_interjection_shouldBecomeInterjectionNode() {
    let pipeline = sample_pipeline(PipelineConfig::passages_only());
    let sermon = pipeline.process(SAMPLE_SERMON, None).await.unwrap();

    let romans = sermon.tree.passages()[0];
    let interjections: Vec<&str> = sermon
        .tree
        .children(romans)
        .iter()
        .filter(|id| matches!(sermon.tree.node(**id).map(|n| &n.kind), Ok(NodeKind::Interjection { .. })))
        .filter_map(|id| sermon.tree.text_of(*id))
        .collect();
    assert_eq!(interjections, vec!["a what?"]);
}

#[tokio::test]
async fn test_process_unmatchedVerse_shouldLeaveTextUntouched() {
    init_test_logging();
    let lookup = StaticVerseLookup::new().with_verse("John 3:16", "In the beginning God created the heaven and the earth.");
    let pipeline = SermonPipeline::new(
        PipelineConfig::passages_only(),
        Arc::new(lookup),
        Arc::new(ScriptedSimilarity::new(0.9)),
    );
    let transcript = "Open to John 3:16 and we will talk about the weather and football today.";

    let sermon = pipeline.process(transcript, None).await.unwrap();

    assert!(sermon.references.is_empty());
    assert_eq!(sermon.report.dropped.len(), 1);
    assert_eq!(sermon.report.dropped[0].kind, "alignment_not_found");
    assert_eq!(sermon.tree.to_record(), DocumentTree::from_text(transcript).to_record());
}

#[tokio::test]
async fn test_process_suppliedCandidates_shouldRemapThroughNormalization() {
    let pipeline = sample_pipeline(PipelineConfig::passages_only());
    let position = SAMPLE_SERMON.find("Romans 12 one").unwrap();
    let candidates = vec![
        ReferenceCandidate::new("Romans 12 one", position),
        ReferenceCandidate::new("Hezekiah 4:2", 0),
        ReferenceCandidate::new("John 3:16", 5),
    ];

    let sermon = pipeline.process(SAMPLE_SERMON, Some(&candidates)).await.unwrap();

    assert_eq!(sermon.report.candidates, 3);
    assert_eq!(sermon.references.len(), 1);
    assert_eq!(sermon.references[0].reference.canonical(), "Romans 12:1");
    let kinds: Vec<&str> = sermon.report.dropped.iter().map(|d| d.kind.as_str()).collect();
    assert!(kinds.contains(&"invalid_reference"));
    assert_eq!(sermon.report.dropped.len(), 2);
    assert_tree_sound(&sermon.tree, sermon.tree.source());
}

#[tokio::test]
async fn test_process_twice_shouldProduceSameDocument() {
    let pipeline = sample_pipeline(PipelineConfig::default());
    let first = pipeline.process(SAMPLE_SERMON, None).await.unwrap();
    let second = pipeline.process(SAMPLE_SERMON, None).await.unwrap();

    assert_eq!(first.tree.to_record(), second.tree.to_record());
    assert_eq!(first.references, second.references);
}

#[tokio::test]
async fn test_process_normalizationDisabled_shouldKeepRawSource() {
    let mut config = PipelineConfig::passages_only();
    config.normalizer.enabled = false;
    let pipeline = sample_pipeline(config);

    let sermon = pipeline.process(SAMPLE_SERMON, None).await.unwrap();

    assert_eq!(sermon.tree.source(), SAMPLE_SERMON);
    assert_tree_sound(&sermon.tree, SAMPLE_SERMON);
    let canonical: Vec<String> = sermon.references.iter().map(|r| r.reference.canonical()).collect();
    assert!(canonical.contains(&"Psalms 23:1".to_string()));
    assert!(sermon.tree.source().contains("Psalm 23:1 the Lord"));
}
