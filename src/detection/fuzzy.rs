/*!
 * Word-level matching between verse text and transcript.
 *
 * Speakers and transcription engines rarely reproduce a translation
 * verbatim. Words are compared in three tiers: exact, equivalent
 * (homophones and archaic/modern pairs across translations) and fuzzy
 * (normalized Levenshtein similarity, long words only).
 */

use serde::{Deserialize, Serialize};

/// How two words matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Equivalent,
    Fuzzy,
}

impl MatchKind {
    /// Contribution of one matched word to confidence (0.0-1.0)
    pub fn weight(self) -> f32 {
        match self {
            MatchKind::Exact => 1.0,
            MatchKind::Equivalent => 0.9,
            MatchKind::Fuzzy => 0.75,
        }
    }
}

/// Word groups treated as interchangeable.
const EQUIVALENTS: &[&[&str]] = &[
    &["to", "too", "two", "unto"],
    &["there", "their", "theyre"],
    &["you", "ye", "thee", "thou"],
    &["your", "yours", "thy", "thine"],
    &["has", "hath"],
    &["does", "doth", "doeth"],
    &["shall", "shalt"],
    &["will", "wilt"],
    &["says", "saith"],
    &["are", "art"],
    &["were", "wast", "wert"],
    &["know", "no"],
    &["knew", "new"],
    &["right", "write", "rite"],
    &["hear", "here"],
    &["whole", "hole"],
    &["peace", "piece"],
    &["son", "sun"],
    &["one", "won"],
    &["for", "four"],
    &["which", "that", "who"],
    &["brethren", "brothers"],
    &["saw", "seen"],
];

/// Compares lowercased words.
#[derive(Debug, Clone)]
pub struct WordMatcher {
    /// Minimum Levenshtein similarity for a fuzzy match (0.0-1.0)
    threshold: f32,
    /// Words shorter than this never fuzzy-match
    min_fuzzy_len: usize,
}

impl Default for WordMatcher {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            min_fuzzy_len: 4,
        }
    }
}

impl WordMatcher {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Compare two lowercased words.
    pub fn compare(&self, a: &str, b: &str) -> Option<MatchKind> {
        if a == b {
            return Some(MatchKind::Exact);
        }
        if are_equivalent(a, b) {
            return Some(MatchKind::Equivalent);
        }
        let long_enough = a.chars().count() >= self.min_fuzzy_len && b.chars().count() >= self.min_fuzzy_len;
        if long_enough && similarity(a, b) >= self.threshold {
            return Some(MatchKind::Fuzzy);
        }
        None
    }
}

fn are_equivalent(a: &str, b: &str) -> bool {
    EQUIVALENTS.iter().any(|group| group.contains(&a) && group.contains(&b))
}

/// Normalized Levenshtein similarity (0.0-1.0).
pub fn similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein_distance(a, b);
    let max_len = a.chars().count().max(b.chars().count());

    1.0 - (distance as f32 / max_len as f32)
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshteinDistance_oneEdit_shouldBeOne() {
        assert_eq!(levenshtein_distance("beseech", "beseach"), 1);
        assert_eq!(levenshtein_distance("", "abc"), 3);
    }

    #[test]
    fn test_compare_identical_shouldBeExact() {
        let matcher = WordMatcher::default();
        assert_eq!(matcher.compare("god", "god"), Some(MatchKind::Exact));
    }

    #[test]
    fn test_compare_archaicPronoun_shouldBeEquivalent() {
        let matcher = WordMatcher::default();
        assert_eq!(matcher.compare("ye", "you"), Some(MatchKind::Equivalent));
        assert_eq!(matcher.compare("unto", "to"), Some(MatchKind::Equivalent));
        assert_eq!(matcher.compare("there", "their"), Some(MatchKind::Equivalent));
    }

    #[test]
    fn test_compare_misspelledLongWord_shouldBeFuzzy() {
        let matcher = WordMatcher::default();
        assert_eq!(matcher.compare("sacrifice", "sacrafice"), Some(MatchKind::Fuzzy));
    }

    #[test]
    fn test_compare_shortWords_shouldNotFuzzyMatch() {
        let matcher = WordMatcher::default();
        assert_eq!(matcher.compare("cat", "hat"), None);
        assert_eq!(matcher.compare("holy", "wholly"), None);
    }
}
