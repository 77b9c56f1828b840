/*!
 * Pass B: topic segmentation of plain-text paragraphs.
 *
 * Segmentation is split in two so the async scorer stays outside the tree:
 * `plan_segmentation` reads the tree and lists the sentence pairs to
 * compare, the caller fills `AdjacencyScores`, and
 * `segment_ast_paragraphs` applies the resulting breaks. Paragraphs that
 * hold a passage are never touched.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::document::model::{DocumentTree, NodeId, NodeKind};
use crate::document::sentences::sentence_spans;
use crate::errors::TreeError;
use crate::span::Span;

static CALL_TO_PRAYER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?i:let\s+us\s+pray|let's\s+pray|lets\s+pray|shall\s+we\s+pray|would\s+you\s+pray|pray\s+with\s+me|bow\s+(?:your|our)\s+heads|father\s+god|heavenly\s+father|father\s+in\s+heaven)\b",
    )
    .unwrap()
});

/// Configuration for topic segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Adjacent sentences scoring below this are a topic break
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Minimum sentences between two similarity breaks
    #[serde(default = "default_min_sentences_per_paragraph")]
    pub min_sentences_per_paragraph: usize,

    /// Sentences on each side of a candidate break that are compared
    #[serde(default = "default_window_sentences")]
    pub window_sentences: usize,

    /// Unpunctuated runs are cut into pseudo-sentences of this many words
    #[serde(default = "default_max_sentence_words")]
    pub max_sentence_words: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_similarity_threshold() -> f32 {
    0.3
}

fn default_min_sentences_per_paragraph() -> usize {
    3
}

fn default_window_sentences() -> usize {
    1
}

fn default_max_sentence_words() -> usize {
    40
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            similarity_threshold: default_similarity_threshold(),
            min_sentences_per_paragraph: default_min_sentences_per_paragraph(),
            window_sentences: default_window_sentences(),
            max_sentence_words: default_max_sentence_words(),
        }
    }
}

impl SegmentationConfig {
    /// Fewer, longer paragraphs.
    pub fn coarse() -> Self {
        Self {
            similarity_threshold: 0.15,
            min_sentences_per_paragraph: 6,
            window_sentences: 2,
            ..Self::default()
        }
    }

    /// More, shorter paragraphs.
    pub fn detailed() -> Self {
        Self {
            similarity_threshold: 0.4,
            min_sentences_per_paragraph: 2,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "segmentation.similarity_threshold must be between 0.0 and 1.0, got {}",
                self.similarity_threshold
            ));
        }
        if self.min_sentences_per_paragraph == 0 || self.window_sentences == 0 {
            return Err("segmentation.min_sentences_per_paragraph and window_sentences must be at least 1".to_string());
        }
        Ok(())
    }
}

/// One segmentable paragraph and its sentences.
#[derive(Debug, Clone)]
pub struct ParagraphPlan {
    pub paragraph: NodeId,
    pub text_node: NodeId,
    pub sentences: Vec<Span>,
}

/// A pair of texts to score for the break before sentence `index`.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub paragraph: NodeId,
    pub index: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentationPlan {
    pub paragraphs: Vec<ParagraphPlan>,
}

impl SegmentationPlan {
    /// Every comparison the scorer has to answer.
    pub fn comparisons(&self, source: &str, window: usize) -> Vec<Comparison> {
        let window = window.max(1);
        let mut out = Vec::new();
        for plan in &self.paragraphs {
            for index in 1..plan.sentences.len() {
                let lo = index.saturating_sub(window);
                let hi = (index + window).min(plan.sentences.len());
                out.push(Comparison {
                    paragraph: plan.paragraph,
                    index,
                    before: join_spans(source, &plan.sentences[lo..index]),
                    after: join_spans(source, &plan.sentences[index..hi]),
                });
            }
        }
        out
    }
}

fn join_spans(source: &str, spans: &[Span]) -> String {
    match (spans.first(), spans.last()) {
        (Some(first), Some(last)) => source[first.start..last.end].trim().to_string(),
        _ => String::new(),
    }
}

/// Similarity scores keyed by paragraph and sentence index. A missing
/// entry means the scorer failed or timed out.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyScores {
    scores: HashMap<(NodeId, usize), f32>,
}

impl AdjacencyScores {
    pub fn insert(&mut self, paragraph: NodeId, index: usize, score: f32) {
        self.scores.insert((paragraph, index), score.clamp(0.0, 1.0));
    }

    pub fn get(&self, paragraph: NodeId, index: usize) -> Option<f32> {
        self.scores.get(&(paragraph, index)).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Outcome of Pass B.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentationOutcome {
    pub paragraphs_examined: usize,
    pub breaks: usize,
}

/// Collect paragraphs made of a single text node, with their sentences.
pub fn plan_segmentation(tree: &DocumentTree, config: &SegmentationConfig) -> SegmentationPlan {
    if !config.enabled {
        return SegmentationPlan::default();
    }

    let paragraphs = tree
        .paragraphs()
        .iter()
        .filter_map(|paragraph| {
            let [child] = tree.children(*paragraph) else {
                return None;
            };
            match tree.get(*child).map(|n| &n.kind) {
                Some(NodeKind::Text { span }) => Some(ParagraphPlan {
                    paragraph: *paragraph,
                    text_node: *child,
                    sentences: sentence_spans(tree.source(), *span, config.max_sentence_words),
                }),
                _ => None,
            }
        })
        .filter(|plan| plan.sentences.len() > 1)
        .collect();

    SegmentationPlan { paragraphs }
}

/// True when the sentence opens with call-to-prayer phrasing.
pub fn is_call_to_prayer(sentence: &str) -> bool {
    CALL_TO_PRAYER.is_match(sentence)
}

/// Sentence indices that start a new paragraph.
pub fn break_points(sentences: &[&str], score: impl Fn(usize) -> Option<f32>, config: &SegmentationConfig) -> Vec<usize> {
    let mut breaks = Vec::new();
    let mut since_break = 0;

    for index in 1..sentences.len() {
        since_break += 1;
        let forced = is_call_to_prayer(sentences[index]);
        let dissimilar = score(index).is_some_and(|s| s < config.similarity_threshold);
        if forced || (dissimilar && since_break >= config.min_sentences_per_paragraph) {
            breaks.push(index);
            since_break = 0;
        }
    }

    breaks
}

/// Split planned paragraphs at their break points.
pub fn segment_ast_paragraphs(
    tree: &mut DocumentTree,
    plan: &SegmentationPlan,
    scores: &AdjacencyScores,
    config: &SegmentationConfig,
) -> Result<SegmentationOutcome, TreeError> {
    let mut outcome = SegmentationOutcome::default();

    for paragraph in &plan.paragraphs {
        outcome.paragraphs_examined += 1;
        let texts: Vec<&str> = paragraph
            .sentences
            .iter()
            .map(|s| s.slice(tree.source()).unwrap_or_default())
            .collect();
        let breaks = break_points(&texts, |i| scores.get(paragraph.paragraph, i), config);
        if breaks.is_empty() {
            continue;
        }

        let sentences = &paragraph.sentences;
        let last = sentences[sentences.len() - 1].end;
        let first_cut = sentences[breaks[0]].start;
        tree.set_leaf_span(paragraph.text_node, Span::new(sentences[0].start, first_cut))?;

        let mut created = Vec::with_capacity(breaks.len());
        for (n, index) in breaks.iter().enumerate() {
            let start = sentences[*index].start;
            let end = breaks.get(n + 1).map_or(last, |next| sentences[*next].start);
            let text = tree.create(NodeKind::Text { span: Span::new(start, end) });
            let new_paragraph = tree.create(NodeKind::Paragraph);
            tree.set_children(new_paragraph, vec![text])?;
            created.push(new_paragraph);
        }
        tree.insert_after(paragraph.paragraph, &created)?;

        debug!("{} split into {} paragraphs", paragraph.paragraph, created.len() + 1);
        outcome.breaks += breaks.len();
    }

    tree.validate()?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERMON: &str = "God loves you. His love never fails. Love is patient. \
        Taxes are due in April. Money is tight for many. Budgets matter. \
        Let us pray. Lord we thank you.";

    fn scores_for(tree: &DocumentTree, plan: &SegmentationPlan, low_at: &[usize]) -> AdjacencyScores {
        let mut scores = AdjacencyScores::default();
        for comparison in plan.comparisons(tree.source(), 1) {
            let score = if low_at.contains(&comparison.index) { 0.05 } else { 0.8 };
            scores.insert(comparison.paragraph, comparison.index, score);
        }
        scores
    }

    #[test]
    fn test_segment_lowSimilarity_shouldBreakParagraph() {
        let mut tree = DocumentTree::from_text(SERMON);
        let config = SegmentationConfig::default();
        let plan = plan_segmentation(&tree, &config);
        assert_eq!(plan.paragraphs[0].sentences.len(), 8);

        let scores = scores_for(&tree, &plan, &[3]);
        let outcome = segment_ast_paragraphs(&mut tree, &plan, &scores, &config).unwrap();

        assert_eq!(outcome.breaks, 2);
        assert_eq!(tree.paragraphs().len(), 3);
        let second = tree.children(tree.paragraphs()[1])[0];
        assert!(tree.text_of(second).unwrap().starts_with("Taxes"));
        let third = tree.children(tree.paragraphs()[2])[0];
        assert!(tree.text_of(third).unwrap().starts_with("Let us pray"));
        assert_eq!(tree.render_text(), SERMON);
    }

    #[test]
    fn test_segment_missingScores_shouldOnlyForcePrayerBreak() {
        let mut tree = DocumentTree::from_text(SERMON);
        let config = SegmentationConfig::default();
        let plan = plan_segmentation(&tree, &config);
        let outcome = segment_ast_paragraphs(&mut tree, &plan, &AdjacencyScores::default(), &config).unwrap();
        assert_eq!(outcome.breaks, 1);
    }

    #[test]
    fn test_breakPoints_lowerThreshold_shouldNotAddBreaks() {
        let sentences = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];
        let scores = [0.0, 0.5, 0.2, 0.1, 0.25, 0.05, 0.3, 0.15, 0.22];
        let mut previous = usize::MAX;
        for threshold in [0.6, 0.4, 0.26, 0.21, 0.12, 0.0] {
            let config = SegmentationConfig::default().with_threshold(threshold);
            let breaks = break_points(&sentences, |i| Some(scores[i]), &config);
            assert!(breaks.len() <= previous);
            previous = breaks.len();
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_breakPoints_minSentences_shouldSuppressEarlyBreak() {
        let sentences = ["a", "b", "c", "d"];
        let config = SegmentationConfig::default();
        let breaks = break_points(&sentences, |_| Some(0.0), &config);
        assert_eq!(breaks, vec![3]);
    }

    #[test]
    fn test_plan_passageParagraph_shouldBeSkipped() {
        let text = "Intro here. For God so loved the world. After that.";
        let mut tree = DocumentTree::from_text(text);
        let start = text.find("For God").unwrap();
        let boundary = crate::detection::QuoteBoundary {
            reference: crate::scripture::BibleReference::parse("John 3:16").unwrap(),
            start,
            end: start + "For God so loved the world.".len(),
            confidence: 0.9,
            verse_text: String::new(),
            translation: None,
            interjections: Vec::new(),
            commentary: Vec::new(),
            direction: crate::detection::SearchDirection::Forward,
        };
        crate::document::passage_pass::apply_passages_to_ast(&mut tree, vec![boundary]).unwrap();
        let plan = plan_segmentation(&tree, &SegmentationConfig::default());
        let passage_paragraph = tree.paragraphs()[1];
        assert!(plan.paragraphs.iter().all(|p| p.paragraph != passage_paragraph));
    }

    #[test]
    fn test_isCallToPrayer_shouldMatchOpeningPhrase() {
        assert!(is_call_to_prayer(" Let us pray."));
        assert!(is_call_to_prayer("Father God we come to you"));
        assert!(!is_call_to_prayer("We should pray more often."));
    }
}
