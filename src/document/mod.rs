/*!
 * Document tree and the passes that shape it.
 *
 * - `model`: arena tree over the immutable source text
 * - `passage_pass`: Pass A, isolates detected passages
 * - `segmentation_pass`: Pass B, topic breaks in plain paragraphs
 * - `extraction`: Pass C, references summary
 */

pub mod extraction;
pub mod model;
pub mod passage_pass;
pub mod segmentation_pass;
pub mod sentences;

pub use extraction::{ExtractedReference, extract_references};
pub use model::{DocumentTree, Node, NodeId, NodeKind, NodeRecord, PassageData};
pub use passage_pass::{PassageOutcome, RejectedBoundary, apply_passages_to_ast, filter_boundaries};
pub use segmentation_pass::{
    AdjacencyScores, Comparison, SegmentationConfig, SegmentationOutcome, SegmentationPlan, break_points,
    plan_segmentation, segment_ast_paragraphs,
};
