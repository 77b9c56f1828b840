/*!
 * Reference normalization for transcribed speech.
 *
 * Speech-to-text output rarely contains scripture references in canonical
 * form. This module recognizes the common spoken and mis-transcribed shapes
 * and rewrites them in place:
 *
 * - run-together digits: `John 316` -> `John 3:16`
 * - spoken or hyphenated separators: `John 3 dash 16`, `John 3-16`
 * - comma-separated verses: `Romans 12, 1` and `Romans 12:1, 2, 3` -> `Romans 12:1-3`
 * - ordinal and number words: `First Corinthians thirteen four` -> `1 Corinthians 13:4`
 * - verbose speech: `Romans chapter 12 verse 1 through 2` -> `Romans 12:1-2`
 * - single-chapter books: `Jude 5` -> `Jude 1:5`
 *
 * Nothing outside a recognized reference is touched, and the rewrite is
 * idempotent: canonical text parses back to itself.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ReferenceError;
use crate::scripture::books::{BOOK_PATTERN, find_book, parse_ordinal};
use crate::scripture::numbers::{is_number_word, parse_number_words, tens_value, unit_value};
use crate::scripture::reference::BibleReference;
use crate::span::Span;

/// Maximum number of tokens examined after a book name.
const MAX_TAIL_TOKENS: usize = 16;

/// Configuration for reference normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Whether normalization runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Leave "chapter ... verse ..." phrasing as spoken
    #[serde(default)]
    pub preserve_verbose_speech: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preserve_verbose_speech: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One rewritten region: `original` in the input became `replacement_len`
/// bytes in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetDelta {
    pub original: Span,
    pub replacement_len: usize,
}

/// Which side of a rewritten region an interior offset snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Start,
    End,
}

/// Normalized text plus the deltas that map input offsets to output offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub deltas: Vec<OffsetDelta>,
}

impl NormalizedText {
    /// Identity normalization.
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            deltas: Vec::new(),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Map an offset in the input text to the output text.
    ///
    /// Offsets strictly inside a rewritten region snap to its start or end
    /// depending on `bias`.
    pub fn map_offset(&self, pos: usize, bias: Bias) -> usize {
        let mut shift: isize = 0;
        for delta in &self.deltas {
            if pos >= delta.original.end {
                shift += delta.replacement_len as isize - delta.original.len() as isize;
                continue;
            }
            if pos <= delta.original.start {
                break;
            }
            let new_start = (delta.original.start as isize + shift) as usize;
            return match bias {
                Bias::Start => new_start,
                Bias::End => new_start + delta.replacement_len,
            };
        }
        (pos as isize + shift).max(0) as usize
    }

    /// Map a span from the input text to the output text.
    pub fn map_span(&self, span: Span) -> Span {
        let start = self.map_offset(span.start, Bias::Start);
        let end = self.map_offset(span.end, Bias::End).max(start);
        Span::new(start, end)
    }
}

/// A reference recognized in text, before any rewrite.
#[derive(Debug, Clone)]
pub(crate) struct ParsedReference {
    /// Span of the whole mention, book name included
    pub span: Span,
    /// Validation outcome against the canon table
    pub reference: Result<BibleReference, ReferenceError>,
    /// Mention used "chapter"/"verse" keywords
    pub verbose: bool,
}

/// Rewrites spoken and mis-transcribed references into canonical form.
#[derive(Debug, Clone, Default)]
pub struct ReferenceNormalizer {
    config: NormalizerConfig,
}

impl ReferenceNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(NormalizerConfig::default())
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Rewrite every recognized reference in `text`.
    pub fn normalize(&self, text: &str) -> NormalizedText {
        if !self.config.enabled {
            return NormalizedText::unchanged(text);
        }

        let mut output = String::with_capacity(text.len());
        let mut deltas = Vec::new();
        let mut cursor = 0;

        for parsed in parse_references(text) {
            let Ok(reference) = &parsed.reference else {
                continue;
            };
            if parsed.verbose && self.config.preserve_verbose_speech {
                continue;
            }

            let canonical = reference.canonical();
            let original = &text[parsed.span.start..parsed.span.end];
            if original == canonical {
                continue;
            }

            debug!("Normalized reference '{}' -> '{}'", original, canonical);
            output.push_str(&text[cursor..parsed.span.start]);
            output.push_str(&canonical);
            deltas.push(OffsetDelta {
                original: parsed.span,
                replacement_len: canonical.len(),
            });
            cursor = parsed.span.end;
        }

        output.push_str(&text[cursor..]);
        NormalizedText { text: output, deltas }
    }
}

/// Find every reference mention in `text`, left to right, non-overlapping.
pub(crate) fn parse_references(text: &str) -> Vec<ParsedReference> {
    let mut found = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(caps) = BOOK_PATTERN.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        match parse_mention(text, &caps) {
            Some(parsed) => {
                pos = parsed.span.end.max(whole.end());
                found.push(parsed);
            }
            None => pos = whole.end(),
        }
    }

    found
}

/// Parse a reference that starts at the very beginning of `text`.
pub(crate) fn parse_reference_at_start(text: &str) -> Option<ParsedReference> {
    let caps = BOOK_PATTERN.captures(text)?;
    if caps.get(0)?.start() != 0 {
        return None;
    }
    parse_mention(text, &caps)
}

#[derive(Debug, Clone, PartialEq)]
enum Lex {
    Digits(String),
    Word(String),
    Colon,
    Comma,
    Dash,
}

#[derive(Debug, Clone)]
struct Tok {
    lex: Lex,
    span: Span,
}

fn lex_tail(text: &str, from: usize) -> Vec<Tok> {
    let mut tokens = Vec::new();
    let mut chars = text[from..].char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if tokens.len() >= MAX_TAIL_TOKENS {
            break;
        }
        let start = from + offset;
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let lex = if ch.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                digits.push(c);
                chars.next();
            }
            Lex::Digits(digits)
        } else if ch.is_alphabetic() {
            let mut word = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !(c.is_alphabetic() || c == '\'') {
                    break;
                }
                word.extend(c.to_lowercase());
                chars.next();
            }
            Lex::Word(word)
        } else {
            chars.next();
            match ch {
                ':' => Lex::Colon,
                ',' => Lex::Comma,
                '-' | '\u{2013}' | '\u{2014}' => Lex::Dash,
                _ => break,
            }
        };

        let end = chars.peek().map(|&(o, _)| from + o).unwrap_or(text.len());
        tokens.push(Tok {
            lex,
            span: Span::new(start, end),
        });
    }

    tokens
}

struct TailParser<'a> {
    text: &'a str,
    tokens: Vec<Tok>,
    pos: usize,
}

/// A number read from the tail.
struct NumberTok {
    value: u16,
    digits: Option<String>,
}

impl<'a> TailParser<'a> {
    fn word_at(&self, i: usize) -> Option<&str> {
        match self.tokens.get(i).map(|t| &t.lex) {
            Some(Lex::Word(w)) => Some(w.as_str()),
            _ => None,
        }
    }

    fn lex_at(&self, i: usize) -> Option<&Lex> {
        self.tokens.get(i).map(|t| &t.lex)
    }

    /// True when the token at `i` begins another book mention ("2 Corinthians").
    fn starts_book(&self, i: usize) -> bool {
        let Some(tok) = self.tokens.get(i) else {
            return false;
        };
        BOOK_PATTERN
            .find_at(self.text, tok.span.start)
            .is_some_and(|m| m.start() == tok.span.start)
    }

    /// Read a number (digits or spoken words) at token `i`; returns the
    /// number and the index after it.
    fn number_at(&self, i: usize) -> Option<(NumberTok, usize)> {
        match self.lex_at(i)? {
            Lex::Digits(digits) => {
                let value = digits.parse::<u32>().ok()?.min(u16::MAX as u32) as u16;
                Some((
                    NumberTok {
                        value,
                        digits: Some(digits.clone()),
                    },
                    i + 1,
                ))
            }
            Lex::Word(first) if is_number_word(first) => {
                let mut words: Vec<&str> = Vec::new();
                let mut indices: Vec<usize> = Vec::new();
                let mut j = i;
                while words.len() < 6 {
                    match self.lex_at(j) {
                        Some(Lex::Word(w)) => {
                            words.push(w.as_str());
                            indices.push(j);
                            j += 1;
                        }
                        // "twenty-one"
                        Some(Lex::Dash)
                            if words.last().is_some_and(|w| tens_value(w).is_some())
                                && self.word_at(j + 1).is_some_and(|w| unit_value(w).is_some_and(|u| u < 10)) =>
                        {
                            j += 1;
                        }
                        _ => break,
                    }
                }
                let (value, used) = parse_number_words(&words)?;
                Some((NumberTok { value, digits: None }, indices[used - 1] + 1))
            }
            _ => None,
        }
    }

    /// Read a verse number at `i` unless it opens another book mention.
    fn verse_at(&self, i: usize) -> Option<(u16, usize)> {
        if self.starts_book(i) {
            return None;
        }
        self.number_at(i).map(|(n, next)| (n.value, next))
    }

    fn is_range_word(&self, i: usize) -> bool {
        matches!(self.lex_at(i), Some(Lex::Dash))
            || matches!(self.word_at(i), Some("dash" | "through" | "thru" | "to"))
    }
}

/// Parse the reference whose book name was matched by `caps`.
fn parse_mention(text: &str, caps: &regex::Captures<'_>) -> Option<ParsedReference> {
    let whole = caps.get(0)?;
    let base = caps.name("base")?.as_str();
    let ordinal = match caps.name("ordinal") {
        Some(m) => Some(parse_ordinal(m.as_str())?),
        None => None,
    };
    let book = find_book(ordinal, base)?;

    let mut parser = TailParser {
        text,
        tokens: lex_tail(text, whole.end()),
        pos: 0,
    };

    let mut verbose = false;
    let mut explicit_chapter = false;
    if parser.word_at(parser.pos) == Some("chapter") {
        verbose = true;
        explicit_chapter = true;
        parser.pos += 1;
    }

    let (chapter, after_chapter) = parser.number_at(parser.pos)?;
    parser.pos = after_chapter;

    // Separator between chapter and verse
    let mut verse: Option<u16> = None;
    let separator = match parser.lex_at(parser.pos) {
        Some(Lex::Colon) => Some(parser.pos + 1),
        Some(Lex::Comma) if matches!(parser.lex_at(parser.pos + 1), Some(Lex::Digits(_))) => Some(parser.pos + 1),
        Some(Lex::Dash) => Some(parser.pos + 1),
        Some(Lex::Word(w)) if w == "verse" || w == "verses" => {
            verbose = true;
            Some(parser.pos + 1)
        }
        Some(Lex::Word(w)) if w == "colon" || w == "dash" => Some(parser.pos + 1),
        Some(Lex::Digits(_)) => Some(parser.pos),
        Some(Lex::Word(w)) if is_number_word(w) => Some(parser.pos),
        _ => None,
    };
    if let Some(at) = separator {
        if let Some((value, next)) = parser.verse_at(at) {
            verse = Some(value);
            parser.pos = next;
        }
    }

    // Range end
    let mut verse_end: Option<u16> = None;
    if let Some(start) = verse {
        if parser.is_range_word(parser.pos) {
            if let Some((end, next)) = parser.verse_at(parser.pos + 1) {
                if end > start {
                    verse_end = Some(end);
                    parser.pos = next;
                }
            }
        }
        // "1, 2, 3" extends the range while the list stays consecutive
        let mut last = verse_end.unwrap_or(start);
        while matches!(parser.lex_at(parser.pos), Some(Lex::Comma))
            && matches!(parser.lex_at(parser.pos + 1), Some(Lex::Digits(_)))
        {
            match parser.verse_at(parser.pos + 1) {
                Some((end, next)) if end == last + 1 => {
                    last = end;
                    verse_end = Some(end);
                    parser.pos = next;
                }
                _ => break,
            }
        }
    }

    let (chapter_value, verse_start) = match verse {
        Some(v) => (chapter.value, v),
        None if book.is_single_chapter() && !explicit_chapter => (1, chapter.value),
        None => split_run_together(&chapter, book.chapters)?,
    };

    let last = parser.tokens.get(parser.pos.checked_sub(1)?)?;
    let span = Span::new(whole.start(), last.span.end);
    let reference = BibleReference::from_book(book, chapter_value, verse_start, verse_end).map(|r| r.with_span(span));

    Some(ParsedReference {
        span,
        reference,
        verbose,
    })
}

/// Split "316" into chapter 3, verse 16 using the longest chapter prefix the
/// book actually has.
fn split_run_together(chapter: &NumberTok, max_chapter: u16) -> Option<(u16, u16)> {
    let digits = chapter.digits.as_deref()?;
    if digits.len() < 3 {
        return None;
    }
    (1..digits.len()).rev().find_map(|k| {
        let (c, v) = digits.split_at(k);
        if v.starts_with('0') || c.starts_with('0') {
            return None;
        }
        let c: u16 = c.parse().ok()?;
        let v: u16 = v.parse().ok()?;
        (c >= 1 && c <= max_chapter && v >= 1).then_some((c, v))
    })
}
