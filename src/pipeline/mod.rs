/*!
 * Sermon processing pipeline.
 *
 * Sequences the normalizer, the quote boundary detector and the document
 * passes over one transcript, talking to the verse lookup and similarity
 * scorer through their traits.
 */

pub mod candidates;
pub mod config;
pub mod orchestrator;

pub use candidates::{DroppedCandidate, ReferenceCandidate, ResolvedCandidate};
pub use config::PipelineConfig;
pub use orchestrator::{
    PipelinePhase, PipelineProgress, ProcessedSermon, ProcessingReport, ProgressCallback, SermonPipeline, SermonRecord,
};
