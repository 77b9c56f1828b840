/*!
 * Gap classification inside an alignment.
 *
 * Runs of unmatched transcript words between matched verse words are
 * either short interruptive interjections ("a what?", "amen"), long
 * commentary that splits the quote, or plain noise (filler, stutter)
 * that stays part of the passage text.
 */

use serde::{Deserialize, Serialize};

use crate::detection::alignment::AlignedPair;
use crate::detection::tokens::WordToken;
use crate::span::Span;

const INTERROGATIVES: &[&str] = &["what", "who", "why", "how", "huh", "where", "when", "really"];

const EXCLAMATIONS: &[&str] = &[
    "amen", "hallelujah", "yes", "yeah", "okay", "ok", "oh", "somebody", "glory", "praise", "wow", "y'all",
];

/// Ordinary words that only interrupt when the gap holds nothing else
/// ("come on", "say amen", "look").
const CUES: &[&str] = &["right", "come", "on", "say", "listen", "look", "see", "church", "watch", "now"];

/// A span of transcript that interrupts a quoted verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterjectionSpan {
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapKind {
    Interjection,
    Commentary,
    Noise,
}

/// Unmatched words between two consecutive aligned pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    /// Index of the pair preceding the gap
    pub after_pair: usize,
    pub word_count: usize,
    /// From the first unmatched word up to the next matched word, trimmed
    pub span: Span,
    pub kind: GapKind,
}

/// Classify every interior gap of `pairs`.
pub fn segment_gaps(
    text: &str,
    window: &[WordToken],
    pairs: &[AlignedPair],
    max_interjection_words: usize,
    min_commentary_words: usize,
) -> Vec<Gap> {
    let mut gaps = Vec::new();

    for (index, pair) in pairs.windows(2).enumerate() {
        let (left, right) = (pair[0].window_index, pair[1].window_index);
        if right <= left + 1 {
            continue;
        }
        let words = &window[left + 1..right];
        let raw_start = window[left].span.end;
        let raw_end = window[right].span.start;
        let raw = &text[raw_start..raw_end];

        let kind = if words.len() >= min_commentary_words {
            GapKind::Commentary
        } else if words.len() <= max_interjection_words && is_interruptive(raw, words) {
            GapKind::Interjection
        } else {
            GapKind::Noise
        };

        let span = gap_span(text, words, raw_end);
        gaps.push(Gap {
            after_pair: index,
            word_count: words.len(),
            span,
            kind,
        });
    }

    gaps
}

/// Interjection spans of the given gaps.
pub fn interjections(text: &str, gaps: &[Gap]) -> Vec<InterjectionSpan> {
    gaps.iter()
        .filter(|g| g.kind == GapKind::Interjection && !g.span.is_empty())
        .map(|g| InterjectionSpan {
            span: g.span,
            text: text[g.span.start..g.span.end].to_string(),
        })
        .collect()
}

/// Split the alignment at commentary gaps, keeping the run of pairs with
/// the most matches. Returns the kept pair range and the commentary spans
/// that border it.
pub fn split_at_commentary(pairs: &[AlignedPair], gaps: &[Gap]) -> (std::ops::Range<usize>, Vec<Span>) {
    let cuts: Vec<&Gap> = gaps.iter().filter(|g| g.kind == GapKind::Commentary).collect();
    if cuts.is_empty() {
        return (0..pairs.len(), Vec::new());
    }

    let mut runs = Vec::new();
    let mut start = 0;
    for gap in &cuts {
        runs.push(start..gap.after_pair + 1);
        start = gap.after_pair + 1;
    }
    runs.push(start..pairs.len());

    // Earliest run wins ties
    let mut best = runs[0].clone();
    for run in &runs[1..] {
        if run.len() > best.len() {
            best = run.clone();
        }
    }

    let commentary = cuts
        .iter()
        .filter(|g| g.after_pair + 1 == best.start || g.after_pair + 1 == best.end)
        .map(|g| g.span)
        .collect();

    (best, commentary)
}

fn is_interruptive(raw: &str, words: &[WordToken]) -> bool {
    if raw.contains('?') || raw.contains('!') {
        return true;
    }
    if words.iter().any(|w| INTERROGATIVES.contains(&w.text.as_str())) {
        return true;
    }
    if words.first().is_some_and(|w| EXCLAMATIONS.contains(&w.text.as_str())) {
        return true;
    }
    !words.is_empty()
        && words
            .iter()
            .all(|w| CUES.contains(&w.text.as_str()) || EXCLAMATIONS.contains(&w.text.as_str()))
}

/// Span from the first gap word to the last, extended over punctuation
/// that belongs to it but never reaching the next matched word.
fn gap_span(text: &str, words: &[WordToken], limit: usize) -> Span {
    let (Some(first), Some(last)) = (words.first(), words.last()) else {
        return Span::new(limit, limit);
    };
    let mut end = last.span.end;
    for (offset, c) in text[end..limit].char_indices() {
        if matches!(c, '?' | '!' | '.' | ',' | ';' | ':' | '"' | '”' | '\'' | '’' | ')' | '-' | '—') {
            end = last.span.end + offset + c.len_utf8();
        } else if !c.is_whitespace() {
            break;
        }
    }
    Span::new(first.span.start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::alignment::align;
    use crate::detection::fuzzy::WordMatcher;
    use crate::detection::tokens::tokenize;

    fn gaps_for(verse: &str, text: &str) -> (Vec<AlignedPair>, Vec<Gap>) {
        let window = tokenize(text);
        let alignment = align(&tokenize(verse), &window, &WordMatcher::default());
        let gaps = segment_gaps(text, &window, &alignment.pairs, 5, 12);
        (alignment.pairs, gaps)
    }

    #[test]
    fn test_segmentGaps_questionInsideQuote_shouldBeInterjection() {
        let text = "that ye present your bodies a living, a what? sacrifice holy acceptable unto God";
        let (_, gaps) = gaps_for("that ye present your bodies a living sacrifice holy acceptable unto god", text);
        let found = interjections(text, &gaps);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "a what?");
    }

    #[test]
    fn test_segmentGaps_filler_shouldBeNoise() {
        let text = "for God so uh loved the world";
        let (_, gaps) = gaps_for("for god so loved the world", text);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].kind, GapKind::Noise);
    }

    #[test]
    fn test_segmentGaps_cueWordStartingPhrase_shouldBeNoise() {
        let text = "for God so loved see his people the world";
        let (_, gaps) = gaps_for("for god so loved the world", text);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].kind, GapKind::Noise);
    }

    #[test]
    fn test_segmentGaps_standaloneCue_shouldBeInterjection() {
        let text = "for God so loved, come on, the world";
        let (_, gaps) = gaps_for("for god so loved the world", text);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].kind, GapKind::Interjection);
        assert_eq!(interjections(text, &gaps)[0].text, "come on,");
    }

    #[test]
    fn test_splitAtCommentary_shouldKeepLargerRun() {
        let pairs: Vec<AlignedPair> = (0..6)
            .map(|i| AlignedPair {
                verse_index: i,
                window_index: if i < 2 { i } else { i + 20 },
                kind: crate::detection::fuzzy::MatchKind::Exact,
            })
            .collect();
        let gaps = vec![Gap {
            after_pair: 1,
            word_count: 20,
            span: Span::new(10, 90),
            kind: GapKind::Commentary,
        }];
        let (kept, commentary) = split_at_commentary(&pairs, &gaps);
        assert_eq!(kept, 2..6);
        assert_eq!(commentary, vec![Span::new(10, 90)]);
    }
}
