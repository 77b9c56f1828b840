/*!
 * Quote boundary detection.
 *
 * Locates the transcript span that quotes a referenced verse, tolerating
 * paraphrase, transcription errors, interjections and commentary.
 */

pub mod alignment;
pub mod boundary;
pub mod fuzzy;
pub mod segments;
pub mod tokens;

pub use alignment::{AlignedPair, Alignment, align};
pub use boundary::{
    DetectorConfig, InterjectionScoring, LocateOptions, LocatedQuote, QuoteBoundary, QuoteBoundaryDetector,
    SearchDirection, include_opening_quote, trim_quote_end,
};
pub use fuzzy::{MatchKind, WordMatcher};
pub use segments::{Gap, GapKind, InterjectionSpan, segment_gaps};
pub use tokens::{WordToken, tokenize};
