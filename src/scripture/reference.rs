/*!
 * Structured scripture references.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ReferenceError;
use crate::scripture::books::{Book, book_by_name};
use crate::span::Span;

/// Longest chapter in the canon (Psalm 119).
pub const MAX_VERSE: u16 = 176;

/// A validated reference such as `Romans 12:1-2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BibleReference {
    /// Canonical book name
    pub book: String,

    /// Chapter number (1-based)
    pub chapter: u16,

    /// First verse
    pub verse_start: u16,

    /// Last verse of a range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_end: Option<u16>,

    /// Where the reference text was matched in the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl BibleReference {
    /// Build and validate a reference against the canon table.
    pub fn new(book: &str, chapter: u16, verse_start: u16, verse_end: Option<u16>) -> Result<Self, ReferenceError> {
        let resolved = book_by_name(book).ok_or_else(|| ReferenceError::UnknownBook(book.to_string()))?;
        Self::from_book(resolved, chapter, verse_start, verse_end)
    }

    pub(crate) fn from_book(book: &Book, chapter: u16, verse_start: u16, verse_end: Option<u16>) -> Result<Self, ReferenceError> {
        if chapter == 0 || chapter > book.chapters {
            return Err(ReferenceError::ChapterOutOfRange {
                book: book.name.to_string(),
                chapter,
                max: book.chapters,
            });
        }

        // A range ending where it starts is a single verse
        let verse_end = verse_end.filter(|end| *end != verse_start);
        let bad_end = verse_end.is_some_and(|end| end < verse_start || end > MAX_VERSE);
        if verse_start == 0 || verse_start > MAX_VERSE || bad_end {
            return Err(ReferenceError::VerseOutOfRange {
                book: book.name.to_string(),
                verse_start,
                verse_end,
            });
        }

        Ok(Self {
            book: book.name.to_string(),
            chapter,
            verse_start,
            verse_end,
            span: None,
        })
    }

    /// Attach the source span the reference was matched at.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Parse a whole string as one reference ("John 3:16", "Jude 5",
    /// "Romans 12 one"). Spoken forms are accepted.
    pub fn parse(text: &str) -> Result<Self, ReferenceError> {
        let trimmed = text.trim();
        let parsed = crate::scripture::normalizer::parse_reference_at_start(trimmed)
            .ok_or_else(|| ReferenceError::Malformed(text.to_string()))?;
        if parsed.span.end != trimmed.len() {
            return Err(ReferenceError::Malformed(text.to_string()));
        }
        parsed.reference
    }

    /// Canonical `Book chapter:verse[-end]` form.
    pub fn canonical(&self) -> String {
        match self.verse_end {
            Some(end) => format!("{} {}:{}-{}", self.book, self.chapter, self.verse_start, end),
            None => format!("{} {}:{}", self.book, self.chapter, self.verse_start),
        }
    }

    /// Same passage, ignoring where it was matched.
    pub fn same_passage(&self, other: &BibleReference) -> bool {
        self.book == other.book
            && self.chapter == other.chapter
            && self.verse_start == other.verse_start
            && self.verse_end == other.verse_end
    }

    /// Individual verse numbers covered.
    pub fn verses(&self) -> std::ops::RangeInclusive<u16> {
        self.verse_start..=self.verse_end.unwrap_or(self.verse_start)
    }
}

impl fmt::Display for BibleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
