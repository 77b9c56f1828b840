/*!
 * # sermonscribe
 *
 * A Rust library that turns a raw speech-to-text sermon transcript into a
 * structured document: paragraphs, with the Bible passages the preacher
 * quotes isolated as their own nodes.
 *
 * ## Features
 *
 * - Normalizes mis-transcribed references ("Romans 12 one" → "Romans 12:1")
 * - Locates quoted verses inside noisy speech with fuzzy, bidirectional alignment
 * - Separates interjections and commentary from the quoted text
 * - Splits the remaining text into paragraphs at topic breaks
 * - Preserves every byte of the normalized transcript exactly once
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `span`: byte ranges into the immutable source text
 * - `scripture`: book table, reference parsing, normalization and scanning
 * - `detection`: quote boundary detection (alignment, gaps, trimming)
 * - `document`: the document tree and the passes that mutate it
 * - `providers`: verse lookup and similarity scorer traits and implementations
 * - `pipeline`: sequences the phases over one transcript
 * - `bridge`: line-delimited JSON over stdin/stdout
 * - `app_config`: configuration management
 * - `app_controller`: file and folder processing for the CLI
 * - `errors`: custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod bridge;
pub mod detection;
pub mod document;
pub mod errors;
pub mod pipeline;
pub mod providers;
pub mod scripture;
pub mod span;

// Re-export main types for easier usage
pub use app_config::Config;
pub use detection::{QuoteBoundary, QuoteBoundaryDetector};
pub use document::{DocumentTree, ExtractedReference, NodeId};
pub use errors::{AppError, CandidateError, ProviderError, ReferenceError, TreeError};
pub use pipeline::{PipelineConfig, ProcessedSermon, ReferenceCandidate, SermonPipeline};
pub use scripture::{BibleReference, ReferenceNormalizer};
pub use span::Span;
