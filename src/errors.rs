/*!
 * Error types for the sermonscribe library.
 *
 * This module contains custom error types for the different parts of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 * Per-candidate failures (`CandidateError`) are local to one scripture
 * reference and never abort a document; `TreeError` is fatal.
 */

use thiserror::Error;

/// Errors that can occur when talking to an external collaborator
/// (verse lookup service or similarity scorer)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making a request fails
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing a response fails
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Error returned by the remote API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The collaborator has no answer for this request
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller-enforced deadline elapsed
    #[error("Timed out after {0} ms")]
    Timeout(u64),
}

/// Errors raised while parsing or validating a scripture reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Book name not present in the canon table
    #[error("Unknown book: {0}")]
    UnknownBook(String),

    /// Chapter outside the book's chapter count
    #[error("{book} has {max} chapters, got chapter {chapter}")]
    ChapterOutOfRange {
        book: String,
        chapter: u16,
        max: u16,
    },

    /// Verse number or range is not usable
    #[error("Invalid verse range in {book}: start {verse_start}, end {verse_end:?}")]
    VerseOutOfRange {
        book: String,
        verse_start: u16,
        verse_end: Option<u16>,
    },

    /// Text could not be read as a reference at all
    #[error("Malformed reference: {0}")]
    Malformed(String),
}

/// Reasons a single reference candidate is dropped from a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateError {
    /// Reference rejected before lookup
    #[error("Invalid reference: {0}")]
    InvalidReference(#[from] ReferenceError),

    /// Canonical verse text unavailable
    #[error("Verse lookup failed: {0}")]
    LookupFailure(#[from] ProviderError),

    /// Best alignment stayed below the confidence floor
    #[error("No acceptable alignment (best confidence {best_confidence:.2})")]
    AlignmentNotFound {
        /// Highest confidence seen in either search direction
        best_confidence: f32,
    },

    /// Boundary overlaps a boundary that was kept
    #[error("Overlaps higher-ranked passage {kept}")]
    OverlapConflict {
        /// Canonical form of the reference that won
        kept: String,
    },

    /// Boundary cannot be applied to the source text
    #[error("Malformed boundary: {0}")]
    MalformedBoundary(String),
}

impl CandidateError {
    /// Short machine-readable category name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidReference(_) => "invalid_reference",
            Self::LookupFailure(_) => "lookup_failure",
            Self::AlignmentNotFound { .. } => "alignment_not_found",
            Self::OverlapConflict { .. } => "overlap_conflict",
            Self::MalformedBoundary(_) => "malformed_boundary",
        }
    }
}

/// Errors from document tree operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Node id does not exist in the arena
    #[error("Node not found: {0}")]
    NodeNotFound(usize),

    /// A structural invariant of the tree is broken
    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a collaborator
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from reference handling
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Error from the document tree
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::File(format!("JSON error: {}", error))
    }
}
