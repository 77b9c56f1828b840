/*!
 * Scripture references: canon table, parsing, normalization and scanning.
 *
 * - `books`: the 66-book canon with chapter counts and spoken aliases
 * - `reference`: validated `BibleReference` values
 * - `normalizer`: in-place rewrite of spoken/mis-transcribed references
 * - `scanner`: finds references in normalized text
 */

pub mod books;
pub mod normalizer;
pub mod numbers;
pub mod reference;
pub mod scanner;

pub use books::{BOOKS, Book, book_by_name};
pub use normalizer::{Bias, NormalizedText, NormalizerConfig, OffsetDelta, ReferenceNormalizer};
pub use reference::BibleReference;
pub use scanner::{InvalidMention, ReferenceMatch, ScanResult, scan_references};
