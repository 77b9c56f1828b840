/*!
 * Reference candidates.
 *
 * Callers (usually the transcription step) may hand in the references they
 * heard with approximate positions in the raw transcript. Those positions
 * are remapped through the normalization deltas and snapped onto the
 * reference mention found in the normalized text. Without candidates the
 * normalized text is scanned instead.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{CandidateError, ReferenceError};
use crate::scripture::{BibleReference, NormalizedText, ReferenceMatch, scan_references};
use crate::span::{Span, floor_char_boundary};

/// A reference reported by the caller, positioned in the raw transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCandidate {
    /// Reference text, e.g. "John 3:16" or "Romans 12 one"
    pub reference: String,

    /// Byte offset of the mention in the raw transcript
    pub position: usize,

    /// Byte length of the mention; defaults to the length of `reference`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl ReferenceCandidate {
    pub fn new(reference: &str, position: usize) -> Self {
        Self {
            reference: reference.to_string(),
            position,
            length: None,
            translation: None,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_translation(mut self, translation: &str) -> Self {
        self.translation = Some(translation.to_string());
        self
    }
}

/// A candidate validated and positioned in the normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCandidate {
    pub reference: BibleReference,
    pub span: Span,
    pub translation: Option<String>,
}

/// A candidate that did not make it into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedCandidate {
    /// Canonical reference when it parsed, the raw text otherwise
    pub reference: String,
    pub start: usize,
    pub end: usize,
    /// Category from `CandidateError::kind`
    pub kind: String,
    pub reason: String,
}

impl DroppedCandidate {
    pub fn new(reference: impl Into<String>, span: Span, error: &CandidateError) -> Self {
        Self {
            reference: reference.into(),
            start: span.start,
            end: span.end,
            kind: error.kind().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Resolve caller candidates against the normalized text.
pub fn resolve_candidates(
    candidates: &[ReferenceCandidate],
    raw: &str,
    normalized: &NormalizedText,
) -> (Vec<ResolvedCandidate>, Vec<DroppedCandidate>) {
    let scanned = scan_references(&normalized.text).matches;
    let mut resolved = Vec::with_capacity(candidates.len());
    let mut dropped = Vec::new();

    for candidate in candidates {
        let raw_span = raw_span(candidate, raw);
        let span = normalized.map_span(raw_span);

        let reference = match BibleReference::parse(&candidate.reference) {
            Ok(reference) => reference,
            Err(error) => {
                let error = CandidateError::InvalidReference(error);
                debug!("Dropping candidate '{}': {}", candidate.reference, error);
                dropped.push(DroppedCandidate::new(candidate.reference.as_str(), span, &error));
                continue;
            }
        };

        if span.is_empty() {
            let error = CandidateError::InvalidReference(ReferenceError::Malformed(format!(
                "position {} is outside the transcript",
                candidate.position
            )));
            dropped.push(DroppedCandidate::new(reference.canonical(), span, &error));
            continue;
        }

        let span = snap_to_mention(&scanned, &reference, span);
        resolved.push(ResolvedCandidate {
            reference: reference.with_span(span),
            span,
            translation: candidate.translation.clone(),
        });
    }

    (resolved, dropped)
}

/// Candidates found by scanning the normalized text.
pub fn scan_candidates(normalized: &NormalizedText) -> (Vec<ResolvedCandidate>, Vec<DroppedCandidate>) {
    let scan = scan_references(&normalized.text);
    let resolved = scan
        .matches
        .into_iter()
        .map(|found| ResolvedCandidate {
            reference: found.reference,
            span: found.span,
            translation: None,
        })
        .collect();
    let dropped = scan
        .invalid
        .into_iter()
        .map(|mention| {
            let error = CandidateError::InvalidReference(mention.error);
            DroppedCandidate::new(mention.text, mention.span, &error)
        })
        .collect();
    (resolved, dropped)
}

fn raw_span(candidate: &ReferenceCandidate, raw: &str) -> Span {
    let start = floor_char_boundary(raw, candidate.position.min(raw.len()));
    let length = candidate.length.unwrap_or(candidate.reference.len());
    let end = floor_char_boundary(raw, start.saturating_add(length).min(raw.len()));
    Span::new(start, end)
}

/// Prefer the span of a scanned mention of the same passage that overlaps
/// the mapped candidate span.
fn snap_to_mention(scanned: &[ReferenceMatch], reference: &BibleReference, span: Span) -> Span {
    scanned
        .iter()
        .find(|found| found.span.overlaps(&span) && found.reference.same_passage(reference))
        .map_or(span, |found| found.span)
}
