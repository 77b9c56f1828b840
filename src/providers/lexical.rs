/*!
 * Bag-of-words similarity scorer.
 *
 * Cosine similarity over content-word frequencies, with a crude suffix
 * stem so "loves" and "love" count together. Deterministic and local;
 * the default scorer when no semantic model is attached.
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::errors::ProviderError;
use crate::providers::SimilarityScorer;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}']+").unwrap());

const STOPWORDS: &[&str] = &[
    "a", "about", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be", "because", "been", "but", "by",
    "can", "could", "did", "do", "does", "for", "from", "get", "go", "going", "got", "had", "has", "have", "he",
    "her", "here", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "know", "like", "me",
    "my", "no", "not", "now", "of", "on", "one", "or", "our", "out", "say", "see", "she", "so", "some", "that",
    "the", "their", "them", "then", "there", "they", "this", "to", "up", "us", "was", "we", "well", "were", "what",
    "when", "which", "who", "will", "with", "would", "you", "your",
];

/// Score returned when either side has no content words.
const NEUTRAL_SCORE: f32 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct LexicalSimilarity;

impl LexicalSimilarity {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous scoring, shared by the async trait impl.
    pub fn score(&self, a: &str, b: &str) -> f32 {
        let left = term_frequencies(a);
        let right = term_frequencies(b);
        if left.is_empty() || right.is_empty() {
            return NEUTRAL_SCORE;
        }

        let dot: f32 = left
            .iter()
            .filter_map(|(term, count)| right.get(term).map(|other| count * other))
            .sum();
        let norm = |tf: &HashMap<String, f32>| tf.values().map(|v| v * v).sum::<f32>().sqrt();

        (dot / (norm(&left) * norm(&right))).clamp(0.0, 1.0)
    }
}

fn stem(word: &str) -> &str {
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(stripped) = word.strip_suffix(suffix) {
            if stripped.chars().count() >= 3 {
                return stripped;
            }
        }
    }
    word
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut tf = HashMap::new();
    for m in WORD.find_iter(text) {
        let word = m.as_str().trim_matches('\'').to_lowercase();
        if word.chars().count() < 2 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        *tf.entry(stem(&word).to_string()).or_insert(0.0) += 1.0;
    }
    tf
}

#[async_trait]
impl SimilarityScorer for LexicalSimilarity {
    async fn similarity(&self, a: &str, b: &str) -> Result<f32, ProviderError> {
        Ok(self.score(a, b))
    }
}
