/*!
 * Quote boundary detection.
 *
 * Given where a reference sits in the transcript and the canonical verse
 * text, find the transcript span the speaker actually read out:
 *
 * 1. Skip the introductory phrase after the reference ("says Paul writes")
 * 2. Align verse words against a forward window, falling back to a
 *    backward window ending at the reference when the forward match is weak
 * 3. Refine both ends (verse tail after an interjection, verse head eaten
 *    by the intro skip)
 * 4. Classify unmatched runs as interjection, commentary or noise
 * 5. Score, then trim the end over closing punctuation and quotes
 */

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::detection::alignment::{AlignedPair, align};
use crate::detection::fuzzy::WordMatcher;
use crate::detection::segments::{Gap, GapKind, InterjectionSpan, segment_gaps, interjections, split_at_commentary};
use crate::detection::tokens::{WordToken, tokenize, tokenize_backward, tokenize_forward};
use crate::errors::CandidateError;
use crate::scripture::BibleReference;
use crate::span::{Span, floor_char_boundary};

static INTRO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"^[\s,.:;"“”'‘’()\-—]+"#).unwrap(),
        Regex::new(
            r"^(?i:it|he|she|the\s+bible|the\s+apostle|the\s+scripture|scripture|the\s+word|the\s+lord|god)(?:\s+\w+)?\s+(?i:says|said|writes|wrote|tells\s+us|reads)\b",
        )
        .unwrap(),
        Regex::new(r"^[A-Z]\w+\s+(?i:says|said|writes|wrote|tells\s+us|puts\s+it)\b").unwrap(),
        Regex::new(r"^(?i:it\s+says|says|said|writes|wrote|reads|that|and|now|listen|look)\b").unwrap(),
    ]
});

/// Closing punctuation absorbed into the end of a quote.
const CLOSING_CHARS: &[char] = &['.', ',', ';', '!', '?', '"', '\'', '”', '’', '»'];

/// Closing marks that double as apostrophes inside a word.
const APOSTROPHES: &[char] = &['\'', '’'];

/// Opening quotation marks pulled in before the start of a quote.
const OPENING_CHARS: &[char] = &['"', '“', '\'', '‘', '«'];

/// Which side of the reference the quote was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Whether interjection words count toward the gap penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterjectionScoring {
    #[default]
    Neutral,
    Penalize,
}

/// Detector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Forward confidence at or above this skips the backward search
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f32,

    /// Minimum confidence for a quote to be reported at all
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f32,

    /// Longest introductory phrase skipped after a reference
    #[serde(default = "default_max_intro_skip_chars")]
    pub max_intro_skip_chars: usize,

    /// Extra words searched beyond twice the verse length
    #[serde(default = "default_window_padding_words")]
    pub window_padding_words: usize,

    /// Gaps up to this many words carry no penalty
    #[serde(default = "default_small_gap_words")]
    pub small_gap_words: usize,

    #[serde(default = "default_gap_penalty_weight")]
    pub gap_penalty_weight: f32,

    #[serde(default = "default_max_interjection_words")]
    pub max_interjection_words: usize,

    /// Interior runs this long split the quote
    #[serde(default = "default_min_commentary_words")]
    pub min_commentary_words: usize,

    /// How far past the last match the verse tail is looked for
    #[serde(default = "default_end_refinement_words")]
    pub end_refinement_words: usize,

    /// Levenshtein similarity for a fuzzy word match
    #[serde(default = "default_fuzzy_word_threshold")]
    pub fuzzy_word_threshold: f32,

    #[serde(default)]
    pub interjection_scoring: InterjectionScoring,
}

fn default_acceptance_threshold() -> f32 {
    0.6
}

fn default_confidence_floor() -> f32 {
    0.45
}

fn default_max_intro_skip_chars() -> usize {
    120
}

fn default_window_padding_words() -> usize {
    40
}

fn default_small_gap_words() -> usize {
    2
}

fn default_gap_penalty_weight() -> f32 {
    0.5
}

fn default_max_interjection_words() -> usize {
    5
}

fn default_min_commentary_words() -> usize {
    12
}

fn default_end_refinement_words() -> usize {
    8
}

fn default_fuzzy_word_threshold() -> f32 {
    0.75
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            confidence_floor: default_confidence_floor(),
            max_intro_skip_chars: default_max_intro_skip_chars(),
            window_padding_words: default_window_padding_words(),
            small_gap_words: default_small_gap_words(),
            gap_penalty_weight: default_gap_penalty_weight(),
            max_interjection_words: default_max_interjection_words(),
            min_commentary_words: default_min_commentary_words(),
            end_refinement_words: default_end_refinement_words(),
            fuzzy_word_threshold: default_fuzzy_word_threshold(),
            interjection_scoring: InterjectionScoring::default(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("acceptance_threshold", self.acceptance_threshold),
            ("confidence_floor", self.confidence_floor),
            ("fuzzy_word_threshold", self.fuzzy_word_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("detector.{} must be between 0.0 and 1.0, got {}", name, value));
            }
        }
        if self.gap_penalty_weight < 0.0 {
            return Err("detector.gap_penalty_weight must not be negative".to_string());
        }
        if self.max_interjection_words >= self.min_commentary_words {
            return Err(format!(
                "detector.max_interjection_words ({}) must be below min_commentary_words ({})",
                self.max_interjection_words, self.min_commentary_words
            ));
        }
        Ok(())
    }
}

/// Per-call search options.
#[derive(Debug, Clone, Copy)]
pub struct LocateOptions {
    pub forward: bool,
    pub backward: bool,
    /// Overrides `DetectorConfig::confidence_floor`
    pub confidence_floor: Option<f32>,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            forward: true,
            backward: true,
            confidence_floor: None,
        }
    }
}

impl LocateOptions {
    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = Some(floor);
        self
    }
}

/// Where a quote was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedQuote {
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
    pub direction: SearchDirection,
    pub skipped_intro_chars: usize,
}

/// A located quote plus its reference and segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBoundary {
    pub reference: BibleReference,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
    pub verse_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default)]
    pub interjections: Vec<InterjectionSpan>,
    #[serde(default)]
    pub commentary: Vec<Span>,
    pub direction: SearchDirection,
}

impl QuoteBoundary {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end.max(self.start))
    }
}

/// Best candidate from one search direction.
#[derive(Debug, Clone)]
struct Located {
    direction: SearchDirection,
    start: usize,
    end: usize,
    confidence: f32,
    skipped_intro_chars: usize,
    interjections: Vec<InterjectionSpan>,
    commentary: Vec<Span>,
}

impl Located {
    fn quote(&self) -> LocatedQuote {
        LocatedQuote {
            start: self.start,
            end: self.end,
            confidence: self.confidence,
            direction: self.direction,
            skipped_intro_chars: self.skipped_intro_chars,
        }
    }
}

/// Finds verse quotations around a reference.
#[derive(Debug, Clone)]
pub struct QuoteBoundaryDetector {
    config: DetectorConfig,
    matcher: WordMatcher,
}

impl Default for QuoteBoundaryDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl QuoteBoundaryDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let matcher = WordMatcher::new(config.fuzzy_word_threshold);
        Self { config, matcher }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Locate the quoted span for a reference at
    /// `[reference_position, reference_position + reference_length)`.
    pub fn locate(
        &self,
        transcript: &str,
        reference_position: usize,
        reference_length: usize,
        verse_text: &str,
        options: &LocateOptions,
    ) -> Option<LocatedQuote> {
        self.search(transcript, reference_position, reference_length, verse_text, options)
            .ok()
            .map(|located| located.quote())
    }

    /// Locate and segment the quote for `reference`, whose mention occupies
    /// `reference_span` in `transcript`.
    pub fn detect(
        &self,
        transcript: &str,
        reference: &BibleReference,
        reference_span: Span,
        verse_text: &str,
        translation: Option<&str>,
    ) -> Result<QuoteBoundary, CandidateError> {
        let located = self.search(
            transcript,
            reference_span.start,
            reference_span.len(),
            verse_text,
            &LocateOptions::default(),
        )?;

        debug!(
            "{}: quote {} ({:?}, confidence {:.2}, {} interjection(s))",
            reference,
            Span::new(located.start, located.end),
            located.direction,
            located.confidence,
            located.interjections.len()
        );

        Ok(QuoteBoundary {
            reference: reference.clone(),
            start: located.start,
            end: located.end,
            confidence: located.confidence,
            verse_text: verse_text.to_string(),
            translation: translation.map(str::to_string),
            interjections: located.interjections,
            commentary: located.commentary,
            direction: located.direction,
        })
    }

    fn search(
        &self,
        transcript: &str,
        reference_position: usize,
        reference_length: usize,
        verse_text: &str,
        options: &LocateOptions,
    ) -> Result<Located, CandidateError> {
        let floor = options.confidence_floor.unwrap_or(self.config.confidence_floor);
        let verse = tokenize(verse_text);
        if verse.is_empty() {
            return Err(CandidateError::AlignmentNotFound { best_confidence: 0.0 });
        }

        let ref_start = floor_char_boundary(transcript, reference_position);
        let ref_end = floor_char_boundary(transcript, reference_position.saturating_add(reference_length)).max(ref_start);
        let window_words = verse.len() * 2 + self.config.window_padding_words;

        let mut best: Option<Located> = None;

        if options.forward {
            let anchor = skip_intro(transcript, ref_end, self.config.max_intro_skip_chars);
            let (window, anchor_index) = tokenize_forward(transcript, ref_end, anchor, window_words);
            if let Some(mut found) = self.evaluate(transcript, &verse, &window, anchor_index, anchor, SearchDirection::Forward) {
                found.skipped_intro_chars = anchor - ref_end;
                trace!("forward confidence {:.2}", found.confidence);
                best = Some(found);
            }
        }

        let forward_weak = best.as_ref().is_none_or(|b| b.confidence < self.config.acceptance_threshold);
        if options.backward && forward_weak {
            let window = tokenize_backward(transcript, ref_start, window_words);
            if let Some(found) = self.evaluate(transcript, &verse, &window, 0, ref_start, SearchDirection::Backward) {
                trace!("backward confidence {:.2}", found.confidence);
                // Forward keeps exact ties
                if best.as_ref().is_none_or(|b| found.confidence > b.confidence) {
                    best = Some(found);
                }
            }
        }

        match best {
            Some(found) if found.confidence >= floor && found.start < found.end => Ok(found),
            other => Err(CandidateError::AlignmentNotFound {
                best_confidence: other.map_or(0.0, |b| b.confidence),
            }),
        }
    }

    /// Align, refine, segment and score within one window. `edge` is the
    /// skip point for forward windows and the reference start for backward ones.
    fn evaluate(
        &self,
        text: &str,
        verse: &[WordToken],
        window: &[WordToken],
        search_from: usize,
        edge: usize,
        direction: SearchDirection,
    ) -> Option<Located> {
        if search_from >= window.len() {
            return None;
        }
        let alignment = align(verse, &window[search_from..], &self.matcher).offset_window(search_from);
        if alignment.is_empty() {
            return None;
        }

        let mut pairs = alignment.pairs;
        self.refine_end(verse, window, &mut pairs);
        self.refine_start(verse, window, &mut pairs);

        let gaps = self.gaps(text, window, &pairs);
        let (kept, mut commentary) = split_at_commentary(&pairs, &gaps);
        // Matched words dropped by the split are neither quote nor commentary
        let dropped_before = kept.start.checked_sub(1).map(|i| window[pairs[i].window_index].span.end);
        let dropped_after = pairs.get(kept.end).map(|p| window[p.window_index].span.start);
        let pairs = pairs[kept].to_vec();
        let gaps = self.gaps(text, window, &pairs);

        let first = pairs.first()?;
        let last = pairs.last()?;
        let confidence = self.confidence(verse.len(), &pairs, &gaps);

        let start = include_opening_quote(text, window[first.window_index].span.start);
        let end = trim_quote_end(text, window[last.window_index].span.end);

        let (lead_floor, trail_ceiling) = match direction {
            SearchDirection::Forward => (edge, next_sentence_end(text, end)),
            SearchDirection::Backward => (sentence_start_before(text, start).max(window[0].span.start), edge),
        };
        let lead_floor = dropped_before.map_or(lead_floor, |floor| floor.max(lead_floor));
        let trail_ceiling = dropped_after.map_or(trail_ceiling, |ceiling| ceiling.min(trail_ceiling));
        commentary.extend(content_span(text, lead_floor, start));
        commentary.extend(content_span(text, end, trail_ceiling));
        let quote = Span::new(start, end);
        let commentary = merge_spans(commentary.into_iter().filter_map(|c| outside(c, quote)).collect());

        Some(Located {
            direction,
            start,
            end,
            confidence,
            skipped_intro_chars: 0,
            interjections: interjections(text, &gaps),
            commentary,
        })
    }

    fn gaps(&self, text: &str, window: &[WordToken], pairs: &[AlignedPair]) -> Vec<Gap> {
        segment_gaps(
            text,
            window,
            pairs,
            self.config.max_interjection_words,
            self.config.min_commentary_words,
        )
    }

    /// Matched fraction of the verse minus the large-gap penalty.
    fn confidence(&self, verse_len: usize, pairs: &[AlignedPair], gaps: &[Gap]) -> f32 {
        let (Some(first), Some(last)) = (pairs.first(), pairs.last()) else {
            return 0.0;
        };
        let matched: f32 = pairs.iter().map(|p| p.kind.weight()).sum();
        let base = matched / verse_len as f32;

        let span_words = (last.window_index - first.window_index + 1) as f32;
        let penalized: usize = gaps
            .iter()
            .filter(|g| g.kind != GapKind::Interjection || self.config.interjection_scoring == InterjectionScoring::Penalize)
            .filter(|g| g.word_count > self.config.small_gap_words)
            .map(|g| g.word_count)
            .sum();
        let penalty = self.config.gap_penalty_weight * penalized as f32 / span_words;

        (base - penalty).clamp(0.0, 1.0)
    }

    /// Look for the unmatched verse tail shortly after the last match.
    fn refine_end(&self, verse: &[WordToken], window: &[WordToken], pairs: &mut Vec<AlignedPair>) {
        let Some(last) = pairs.last().copied() else {
            return;
        };
        let tail_from = last.verse_index + 1;
        if tail_from >= verse.len() {
            return;
        }
        let tail = &verse[tail_from..];
        let lo = last.window_index + 1;
        let hi = (lo + self.config.end_refinement_words + tail.len()).min(window.len());

        let mut best: Vec<AlignedPair> = Vec::new();
        for resume in lo..hi.min(lo + self.config.end_refinement_words + 1) {
            let candidate = self.follow(tail, tail_from, window, resume, hi);
            if candidate.len() > best.len() {
                best = candidate;
            }
        }

        if best.len() >= tail.len().div_ceil(2) {
            trace!("verse tail resumed at window word {}", best[0].window_index);
            pairs.extend(best);
        }
    }

    /// Greedy match of `tail` starting exactly at `window[resume]`.
    fn follow(&self, tail: &[WordToken], offset: usize, window: &[WordToken], resume: usize, hi: usize) -> Vec<AlignedPair> {
        let mut pairs = Vec::new();
        let (mut v, mut w) = (0, resume);
        let mut misses = 0;

        while v < tail.len() && w < hi {
            if let Some(kind) = self.matcher.compare(&tail[v].text, &window[w].text) {
                pairs.push(AlignedPair {
                    verse_index: offset + v,
                    window_index: w,
                    kind,
                });
                v += 1;
                w += 1;
                misses = 0;
            } else if v + 1 < tail.len() && self.matcher.compare(&tail[v + 1].text, &window[w].text).is_some() {
                v += 1;
            } else if pairs.is_empty() {
                break;
            } else {
                w += 1;
                misses += 1;
                if misses > self.config.small_gap_words {
                    break;
                }
            }
        }

        pairs
    }

    /// Extend the head backwards over verse words the intro skip passed.
    fn refine_start(&self, verse: &[WordToken], window: &[WordToken], pairs: &mut Vec<AlignedPair>) {
        let Some(first) = pairs.first().copied() else {
            return;
        };
        let (mut v, mut w) = (first.verse_index, first.window_index);
        let mut head = Vec::new();
        while v > 0 && w > 0 {
            match self.matcher.compare(&verse[v - 1].text, &window[w - 1].text) {
                Some(kind) => {
                    head.push(AlignedPair {
                        verse_index: v - 1,
                        window_index: w - 1,
                        kind,
                    });
                    v -= 1;
                    w -= 1;
                }
                None => break,
            }
        }
        if !head.is_empty() {
            head.reverse();
            head.append(pairs);
            *pairs = head;
        }
    }
}

/// Skip introductory phrasing after `from`, bounded by `max_chars`.
pub fn skip_intro(text: &str, from: usize, max_chars: usize) -> usize {
    let from = floor_char_boundary(text, from);
    let limit = floor_char_boundary(text, from.saturating_add(max_chars));
    let mut pos = from;

    while pos < limit {
        let rest = &text[pos..limit];
        let step = INTRO_PATTERNS
            .iter()
            .find_map(|re| re.find(rest).map(|m| m.end()).filter(|len| *len > 0));
        match step {
            Some(len) => pos += len,
            None => break,
        }
    }

    pos
}

/// Extend a quote end over adjacent closing punctuation and quotation marks.
pub fn trim_quote_end(text: &str, end: usize) -> usize {
    let end = floor_char_boundary(text, end);
    let mut pos = end;
    let mut chars = text[end..].chars().peekable();
    while let Some(c) = chars.next() {
        if !CLOSING_CHARS.contains(&c) {
            break;
        }
        // "world's" keeps its apostrophe with the next word
        if APOSTROPHES.contains(&c) && chars.peek().is_some_and(|next| next.is_alphanumeric()) {
            break;
        }
        pos += c.len_utf8();
    }
    pos
}

/// Pull an opening quotation mark immediately before `start` into the quote.
pub fn include_opening_quote(text: &str, start: usize) -> usize {
    let start = floor_char_boundary(text, start);
    match text[..start].chars().next_back() {
        Some(c) if OPENING_CHARS.contains(&c) => start - c.len_utf8(),
        _ => start,
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '?' | '!')
}

fn sentence_start_before(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .rev()
        .find(|(_, c)| is_terminator(*c))
        .map_or(0, |(i, c)| i + c.len_utf8())
}

fn next_sentence_end(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .find(|(_, c)| is_terminator(*c))
        .map_or(text.len(), |(i, c)| pos + i + c.len_utf8())
}

/// The part of `span` outside `quote`.
fn outside(span: Span, quote: Span) -> Option<Span> {
    if !span.overlaps(&quote) {
        Some(span)
    } else if span.start < quote.start {
        Some(Span::new(span.start, quote.start))
    } else if span.end > quote.end {
        Some(Span::new(quote.end, span.end))
    } else {
        None
    }
}

/// Sorted spans with overlapping or touching ones joined.
fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Trimmed `[lo, hi)` when it holds any word characters.
fn content_span(text: &str, lo: usize, hi: usize) -> Option<Span> {
    if lo >= hi {
        return None;
    }
    let slice = &text[lo..hi];
    if !slice.chars().any(char::is_alphanumeric) {
        return None;
    }
    let start = lo + (slice.len() - slice.trim_start().len());
    let end = lo + slice.trim_end().len();
    Some(Span::new(start, end))
}
