/*!
 * Pass C: references summary.
 */

use serde::{Deserialize, Serialize};

use crate::document::model::{DocumentTree, NodeId, NodeKind};
use crate::scripture::BibleReference;
use crate::span::Span;

/// One isolated passage, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReference {
    pub node_id: NodeId,
    pub reference: BibleReference,
    pub span: Span,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// Walk passage nodes in document order. Never mutates the tree.
pub fn extract_references(tree: &DocumentTree) -> Vec<ExtractedReference> {
    tree.passages()
        .into_iter()
        .filter_map(|id| match &tree.get(id)?.kind {
            NodeKind::Passage(data) => Some(ExtractedReference {
                node_id: id,
                reference: data.reference.clone(),
                span: data.span,
                confidence: data.confidence,
                translation: data.translation.clone(),
            }),
            _ => None,
        })
        .collect()
}
