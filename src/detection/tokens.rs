/*!
 * Word tokenization with source offsets.
 *
 * Words are `\w+` runs, lowercased for comparison, each carrying the span
 * it occupies in the original text so alignments map straight back to
 * source positions.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::span::{Span, floor_char_boundary};

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// A word and where it sits in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken {
    /// Lowercased word
    pub text: String,
    /// Absolute span in the source text
    pub span: Span,
}

/// Tokenize a whole text.
pub fn tokenize(text: &str) -> Vec<WordToken> {
    tokenize_range(text, Span::new(0, text.len()))
}

/// Tokenize `text[range]`, keeping absolute offsets.
pub fn tokenize_range(text: &str, range: Span) -> Vec<WordToken> {
    let Some(slice) = range.slice(text) else {
        return Vec::new();
    };
    WORD_PATTERN
        .find_iter(slice)
        .map(|m| WordToken {
            text: m.as_str().to_lowercase(),
            span: Span::new(range.start + m.start(), range.start + m.end()),
        })
        .collect()
}

/// Tokenize forward from `from`, stopping once `limit` words have been taken
/// at or after `anchor`. Returns the tokens and the index of the first token
/// at or after `anchor`.
pub fn tokenize_forward(text: &str, from: usize, anchor: usize, limit: usize) -> (Vec<WordToken>, usize) {
    let from = floor_char_boundary(text, from);
    let mut tokens = Vec::new();
    let mut anchor_index = None;

    for m in WORD_PATTERN.find_iter(&text[from..]) {
        let span = Span::new(from + m.start(), from + m.end());
        if anchor_index.is_none() && span.start >= anchor {
            anchor_index = Some(tokens.len());
        }
        if let Some(first) = anchor_index {
            if tokens.len() - first >= limit {
                break;
            }
        }
        tokens.push(WordToken {
            text: m.as_str().to_lowercase(),
            span,
        });
    }

    let anchor_index = anchor_index.unwrap_or(tokens.len());
    (tokens, anchor_index)
}

/// The last `limit` words that end at or before `until`.
pub fn tokenize_backward(text: &str, until: usize, limit: usize) -> Vec<WordToken> {
    let until = floor_char_boundary(text, until);
    // Generous byte budget per word; a cut word at the low edge is discarded
    let lo = floor_char_boundary(text, until.saturating_sub(limit.saturating_mul(24)));
    let mut tokens = tokenize_range(text, Span::new(lo, until));
    if lo > 0 && tokens.first().is_some_and(|t| t.span.start == lo) {
        let cut = text[..lo].chars().next_back().is_some_and(|c| c.is_alphanumeric() || c == '_');
        if cut {
            tokens.remove(0);
        }
    }
    let skip = tokens.len().saturating_sub(limit);
    tokens.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_shouldLowercaseAndKeepOffsets() {
        let text = "For God so loved.";
        let tokens = tokenize(text);
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].text, "god");
        assert_eq!(&text[tokens[3].span.start..tokens[3].span.end], "loved");
    }

    #[test]
    fn test_tokenizeForward_shouldStopAfterLimitPastAnchor() {
        let text = "says Paul writes I beseech you therefore brethren";
        let anchor = text.find("I beseech").unwrap();
        let (tokens, anchor_index) = tokenize_forward(text, 0, anchor, 2);
        assert_eq!(anchor_index, 3);
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[4].text, "beseech");
    }

    #[test]
    fn test_tokenizeBackward_shouldReturnLastWords() {
        let text = "one two three four five";
        let until = text.find("five").unwrap();
        let tokens = tokenize_backward(text, until, 2);
        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["three", "four"]);
    }
}
