/*!
 * Tests for the document tree passes and their invariants
 */

use sermonscribe::detection::{QuoteBoundary, SearchDirection};
use sermonscribe::document::{
    AdjacencyScores, DocumentTree, NodeKind, SegmentationConfig, apply_passages_to_ast, extract_references,
    plan_segmentation, segment_ast_paragraphs,
};
use sermonscribe::providers::LexicalSimilarity;
use sermonscribe::scripture::BibleReference;

use crate::common::{assert_tree_sound, paragraph_texts, passage_texts};

const SERMON: &str = "Grace is a gift. God gives grace freely. We cannot earn grace. \
For God so loved the world. Love sent the Son. \
Money can be a trap. Wealth fades fast. Riches do not last. Greed destroys. \
Let us pray. Lord, teach us to give.";

fn boundary(text: &str, quote: &str, reference: &str, confidence: f32) -> QuoteBoundary {
    let start = text.find(quote).expect("quote present");
    QuoteBoundary {
        reference: BibleReference::parse(reference).unwrap(),
        start,
        end: start + quote.len(),
        confidence,
        verse_text: quote.to_string(),
        translation: None,
        interjections: Vec::new(),
        commentary: Vec::new(),
        direction: SearchDirection::Forward,
    }
}

fn lexical_scores(tree: &DocumentTree, config: &SegmentationConfig) -> AdjacencyScores {
    let scorer = LexicalSimilarity::new();
    let plan = plan_segmentation(tree, config);
    let mut scores = AdjacencyScores::default();
    for comparison in plan.comparisons(tree.source(), config.window_sentences) {
        scores.insert(comparison.paragraph, comparison.index, scorer.score(&comparison.before, &comparison.after));
    }
    scores
}

fn breaks_at(threshold: f32) -> usize {
    let mut tree = DocumentTree::from_text(SERMON);
    let config = SegmentationConfig::default().with_threshold(threshold);
    let plan = plan_segmentation(&tree, &config);
    let scores = lexical_scores(&tree, &config);
    let outcome = segment_ast_paragraphs(&mut tree, &plan, &scores, &config).unwrap();
    assert_tree_sound(&tree, SERMON);
    outcome.breaks
}

#[test]
fn test_passes_shouldConserveTextAndIsolatePassages() {
    let mut tree = DocumentTree::from_text(SERMON);
    let quote = boundary(SERMON, "For God so loved the world.", "John 3:16", 0.95);
    let outcome = apply_passages_to_ast(&mut tree, vec![quote]).unwrap();
    assert_eq!(outcome.applied.len(), 1);
    assert_tree_sound(&tree, SERMON);

    let config = SegmentationConfig::default();
    let plan = plan_segmentation(&tree, &config);
    let scores = lexical_scores(&tree, &config);
    segment_ast_paragraphs(&mut tree, &plan, &scores, &config).unwrap();
    assert_tree_sound(&tree, SERMON);

    assert_eq!(passage_texts(&tree), vec!["For God so loved the world."]);
    assert!(paragraph_texts(&tree).iter().any(|p| p.trim_start().starts_with("Let us pray.")));
    let references = extract_references(&tree);
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].reference.canonical(), "John 3:16");
}

#[test]
fn test_segmentation_lowerThreshold_shouldNeverAddBreaks() {
    let thresholds = [0.0, 0.05, 0.1, 0.2, 0.3, 0.5, 0.8, 1.0];
    let counts: Vec<usize> = thresholds.iter().map(|t| breaks_at(*t)).collect();
    for pair in counts.windows(2) {
        assert!(pair[0] <= pair[1], "breaks not monotonic: {:?}", counts);
    }
    // The call to prayer breaks regardless of threshold.
    assert!(counts[0] >= 1);
}

#[test]
fn test_passagePass_rejectedBoundary_shouldLeaveTreeUntouched() {
    let mut tree = DocumentTree::from_text(SERMON);
    let before = tree.to_record();

    let mut bad = boundary(SERMON, "Wealth fades fast.", "Proverbs 23:5", 0.7);
    bad.end = SERMON.len() + 10;
    let outcome = apply_passages_to_ast(&mut tree, vec![bad]).unwrap();

    assert!(outcome.applied.is_empty());
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(tree.to_record(), before);
}

#[test]
fn test_passagePass_overlap_shouldKeepHigherConfidence() {
    let mut tree = DocumentTree::from_text(SERMON);
    let strong = boundary(SERMON, "For God so loved the world.", "John 3:16", 0.9);
    let weak = boundary(SERMON, "the world. Love sent the Son.", "1 John 4:9", 0.6);

    let outcome = apply_passages_to_ast(&mut tree, vec![weak, strong]).unwrap();

    assert_eq!(outcome.applied.len(), 1);
    assert_eq!(outcome.rejected[0].error.kind(), "overlap_conflict");
    assert_eq!(passage_texts(&tree), vec!["For God so loved the world."]);
    assert_tree_sound(&tree, SERMON);
}

#[test]
fn test_passagePass_adjacentPassages_shouldEachOwnParagraph() {
    let text = "Psalm 23:1 The LORD is my shepherd. I shall not want. Amen.";
    let mut tree = DocumentTree::from_text(text);
    let first = boundary(text, "The LORD is my shepherd.", "Psalm 23:1", 0.9);
    let second = boundary(text, "I shall not want.", "Psalm 23:1", 0.8);

    apply_passages_to_ast(&mut tree, vec![first, second]).unwrap();

    assert_tree_sound(&tree, text);
    for id in tree.passages() {
        let parent = tree.node(id).unwrap().parent.unwrap();
        assert!(matches!(tree.node(parent).unwrap().kind, NodeKind::Paragraph));
        assert_eq!(tree.children(parent), &[id]);
    }
    assert_eq!(tree.passages().len(), 2);
}
