/*!
 * Sentence segmentation over source spans.
 *
 * Sentences partition the input span: each one runs from its first
 * character through its terminator, closing quotes and the whitespace
 * after it. Title and scripture-book abbreviations do not end a sentence.
 * Unpunctuated stretches are cut into pseudo-sentences of at most
 * `max_words` words.
 */

use crate::span::Span;

/// Abbreviations (without the period) that never end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "St", "Rev", "Jr", "Sr", "vs", "etc", "Gen", "Ex", "Lev", "Deut", "Matt",
    "Rom", "Cor", "Gal", "Eph", "Phil", "Col", "Thess", "Tim", "Heb", "Jas", "Pet",
];

const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', '»'];

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '?' | '!')
}

/// Split `span` of `text` into consecutive sentence spans.
pub fn sentence_spans(text: &str, span: Span, max_words: usize) -> Vec<Span> {
    let Some(slice) = span.slice(text) else {
        return Vec::new();
    };
    let chars: Vec<(usize, char)> = slice.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if !is_terminator(c) || (c == '.' && (ends_abbreviation(slice, pos) || is_decimal_point(slice, pos))) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && (is_terminator(chars[j].1) || CLOSERS.contains(&chars[j].1)) {
            j += 1;
        }
        if j < chars.len() && !chars[j].1.is_whitespace() {
            i = j;
            continue;
        }
        while j < chars.len() && chars[j].1.is_whitespace() {
            j += 1;
        }

        let end = chars.get(j).map_or(slice.len(), |(p, _)| *p);
        sentences.push(Span::new(span.start + start, span.start + end));
        start = end;
        i = j;
    }
    if start < slice.len() {
        sentences.push(Span::new(span.start + start, span.end));
    }

    sentences
        .into_iter()
        .flat_map(|s| chunk_words(text, s, max_words))
        .collect()
}

fn ends_abbreviation(slice: &str, dot: usize) -> bool {
    let word_start = slice[..dot]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic())
        .last()
        .map_or(dot, |(i, _)| i);
    let word = &slice[word_start..dot];
    if word.is_empty() {
        return false;
    }
    // Single capital initial such as "J."
    let initial = word.chars().count() == 1 && word.chars().all(char::is_uppercase);
    initial || ABBREVIATIONS.contains(&word)
}

fn is_decimal_point(slice: &str, dot: usize) -> bool {
    let before = slice[..dot].chars().next_back().is_some_and(|c| c.is_ascii_digit());
    let after = slice[dot + 1..].chars().next().is_some_and(|c| c.is_ascii_digit());
    before && after
}

/// Cut a sentence after every `max_words` words, at the next word start.
fn chunk_words(text: &str, sentence: Span, max_words: usize) -> Vec<Span> {
    if max_words == 0 {
        return vec![sentence];
    }
    let slice = &text[sentence.start..sentence.end];
    let mut chunks = Vec::new();
    let mut chunk_start = sentence.start;
    let mut words = 0;
    let mut in_word = false;

    for (pos, c) in slice.char_indices() {
        let starts_word = !c.is_whitespace() && !in_word;
        in_word = !c.is_whitespace();
        if starts_word {
            if words == max_words {
                let cut = sentence.start + pos;
                chunks.push(Span::new(chunk_start, cut));
                chunk_start = cut;
                words = 0;
            }
            words += 1;
        }
    }
    chunks.push(Span::new(chunk_start, sentence.end));
    chunks
}
