/*!
 * Pass A: isolate detected passages in the tree.
 *
 * Boundaries are filtered (unusable spans dropped, overlaps resolved in
 * favour of higher confidence, then earlier start) and applied in
 * ascending start order. Each one splits the text node that covers it
 * into before / passage / after, and the passage gets a paragraph of its
 * own. The original text node is reused for the first non-empty side.
 */

use log::debug;

use crate::detection::QuoteBoundary;
use crate::document::model::{DocumentTree, NodeId, NodeKind, PassageData};
use crate::errors::{CandidateError, TreeError};
use crate::span::Span;

/// A boundary that could not be applied.
#[derive(Debug, Clone)]
pub struct RejectedBoundary {
    pub boundary: QuoteBoundary,
    pub error: CandidateError,
}

/// Result of Pass A.
#[derive(Debug, Clone, Default)]
pub struct PassageOutcome {
    /// Passage nodes created, in document order
    pub applied: Vec<NodeId>,
    pub rejected: Vec<RejectedBoundary>,
}

/// Drop unusable and overlapping boundaries. Kept boundaries come back
/// sorted by start.
pub fn filter_boundaries(source: &str, boundaries: Vec<QuoteBoundary>) -> (Vec<QuoteBoundary>, Vec<RejectedBoundary>) {
    let mut rejected = Vec::new();
    let mut ranked = Vec::new();

    for boundary in boundaries {
        let span = Span::new(boundary.start.min(boundary.end), boundary.end);
        if boundary.start >= boundary.end || !span.is_valid_in(source) {
            let error = CandidateError::MalformedBoundary(format!(
                "[{}, {}) for {} does not fit a {}-byte source",
                boundary.start,
                boundary.end,
                boundary.reference,
                source.len()
            ));
            rejected.push(RejectedBoundary { boundary, error });
        } else {
            ranked.push(boundary);
        }
    }

    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence).then(a.start.cmp(&b.start)));

    let mut kept: Vec<QuoteBoundary> = Vec::new();
    for boundary in ranked {
        let conflict = kept.iter().find(|k| k.span().overlaps(&boundary.span()));
        match conflict {
            Some(winner) => {
                let error = CandidateError::OverlapConflict {
                    kept: winner.reference.canonical(),
                };
                rejected.push(RejectedBoundary { boundary, error });
            }
            None => kept.push(boundary),
        }
    }

    kept.sort_by_key(|b| b.start);
    (kept, rejected)
}

/// Apply boundaries to the tree. Invariants are re-checked afterwards.
pub fn apply_passages_to_ast(tree: &mut DocumentTree, boundaries: Vec<QuoteBoundary>) -> Result<PassageOutcome, TreeError> {
    let (kept, rejected) = filter_boundaries(tree.source(), boundaries);
    let mut outcome = PassageOutcome {
        applied: Vec::new(),
        rejected,
    };

    for boundary in kept {
        match covering_text_node(tree, boundary.span()) {
            Some((paragraph, text_node)) => {
                let passage = isolate(tree, paragraph, text_node, &boundary)?;
                debug!("{} isolated as {} at {}", boundary.reference, passage, boundary.span());
                outcome.applied.push(passage);
            }
            None => {
                let error = CandidateError::MalformedBoundary(format!(
                    "no single text node covers {} for {}",
                    boundary.span(),
                    boundary.reference
                ));
                outcome.rejected.push(RejectedBoundary { boundary, error });
            }
        }
    }

    tree.validate()?;
    Ok(outcome)
}

/// The paragraph-level text node whose span contains `span`.
fn covering_text_node(tree: &DocumentTree, span: Span) -> Option<(NodeId, NodeId)> {
    tree.paragraphs().iter().find_map(|paragraph| {
        tree.children(*paragraph).iter().find_map(|child| match tree.get(*child).map(|n| &n.kind) {
            Some(NodeKind::Text { span: text }) if text.contains_span(&span) => Some((*paragraph, *child)),
            _ => None,
        })
    })
}

fn isolate(tree: &mut DocumentTree, paragraph: NodeId, text_node: NodeId, boundary: &QuoteBoundary) -> Result<NodeId, TreeError> {
    let text_span = tree
        .node(text_node)?
        .kind
        .leaf_span()
        .ok_or_else(|| TreeError::InvariantViolation(format!("{} is not a text node", text_node)))?;
    let quote = boundary.span();
    let before = Span::new(text_span.start, quote.start);
    let after = Span::new(quote.end, text_span.end);

    let siblings = tree.children(paragraph).to_vec();
    let index = siblings
        .iter()
        .position(|c| *c == text_node)
        .ok_or_else(|| TreeError::InvariantViolation(format!("{} missing from {}", text_node, paragraph)))?;

    let mut reusable = Some(text_node);
    let mut left = siblings[..index].to_vec();
    let mut right = Vec::new();
    if !before.is_empty() {
        left.push(reuse_or_create(tree, &mut reusable, before)?);
    }
    if !after.is_empty() {
        right.push(reuse_or_create(tree, &mut reusable, after)?);
    }
    right.extend_from_slice(&siblings[index + 1..]);

    let passage = tree.create(NodeKind::Passage(PassageData {
        reference: boundary.reference.clone(),
        span: quote,
        confidence: boundary.confidence,
        verse_text: boundary.verse_text.clone(),
        translation: boundary.translation.clone(),
        direction: boundary.direction,
    }));
    let leaves = passage_leaves(tree, boundary);
    tree.set_children(passage, leaves)?;

    let mut groups = Vec::new();
    if !left.is_empty() {
        groups.push(left);
    }
    groups.push(vec![passage]);
    if !right.is_empty() {
        groups.push(right);
    }

    let mut paragraphs = Vec::with_capacity(groups.len());
    for (i, children) in groups.into_iter().enumerate() {
        let id = if i == 0 { paragraph } else { tree.create(NodeKind::Paragraph) };
        tree.set_children(id, children)?;
        paragraphs.push(id);
    }
    tree.insert_after(paragraph, &paragraphs[1..])?;

    Ok(passage)
}

fn reuse_or_create(tree: &mut DocumentTree, reusable: &mut Option<NodeId>, span: Span) -> Result<NodeId, TreeError> {
    match reusable.take() {
        Some(id) => {
            tree.set_leaf_span(id, span)?;
            Ok(id)
        }
        None => Ok(tree.create(NodeKind::Text { span })),
    }
}

/// Text and interjection leaves tiling the passage span.
fn passage_leaves(tree: &mut DocumentTree, boundary: &QuoteBoundary) -> Vec<NodeId> {
    let quote = boundary.span();
    let mut interjections: Vec<Span> = boundary.interjections.iter().map(|i| i.span).collect();
    interjections.sort();

    let mut leaves = Vec::new();
    let mut cursor = quote.start;
    for span in interjections {
        let interior = span.start > cursor && span.end < quote.end && !span.is_empty();
        if !interior || !span.is_valid_in(tree.source()) {
            debug!("{}: ignoring interjection {} outside {}", boundary.reference, span, quote);
            continue;
        }
        leaves.push(tree.create(NodeKind::Text {
            span: Span::new(cursor, span.start),
        }));
        leaves.push(tree.create(NodeKind::Interjection { span }));
        cursor = span.end;
    }
    leaves.push(tree.create(NodeKind::Text {
        span: Span::new(cursor, quote.end),
    }));
    leaves
}
