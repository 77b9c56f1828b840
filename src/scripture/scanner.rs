/*!
 * Reference scanning.
 *
 * Finds scripture references in (normalized) transcript text so the
 * pipeline can run without externally supplied candidates.
 */

use serde::{Deserialize, Serialize};

use crate::errors::ReferenceError;
use crate::scripture::normalizer::parse_references;
use crate::scripture::reference::BibleReference;
use crate::span::Span;

/// A valid reference found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMatch {
    pub reference: BibleReference,
    pub span: Span,
}

/// A reference-shaped mention that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMention {
    pub span: Span,
    pub text: String,
    pub error: ReferenceError,
}

/// Result of scanning a text.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub matches: Vec<ReferenceMatch>,
    pub invalid: Vec<InvalidMention>,
}

/// Scan `text` for references, in order of appearance.
pub fn scan_references(text: &str) -> ScanResult {
    let mut result = ScanResult::default();

    for parsed in parse_references(text) {
        match parsed.reference {
            Ok(reference) => result.matches.push(ReferenceMatch {
                reference,
                span: parsed.span,
            }),
            Err(error) => result.invalid.push(InvalidMention {
                span: parsed.span,
                text: text[parsed.span.start..parsed.span.end].to_string(),
                error,
            }),
        }
    }

    result
}
