/*!
 * The sermon document tree.
 *
 * An arena of nodes addressed by stable `NodeId`s over one immutable
 * source text. The root holds ordered paragraphs; paragraphs hold text
 * and passage nodes; passages hold text and interjection leaves. Leaves
 * only carry spans, so the text itself is never copied or re-indexed.
 *
 * Invariants checked by `validate`:
 * - a passage is the only child of its paragraph
 * - leaves in document order tile the source text exactly
 * - every reachable child points back at its parent
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detection::SearchDirection;
use crate::errors::TreeError;
use crate::scripture::BibleReference;
use crate::span::Span;

/// Stable node identifier. Never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// What a passage node knows about its quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageData {
    pub reference: BibleReference,
    pub span: Span,
    pub confidence: f32,
    pub verse_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub direction: SearchDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Text { span: Span },
    Passage(PassageData),
    Interjection { span: Span },
}

impl NodeKind {
    /// Span of a text-bearing leaf.
    pub fn leaf_span(&self) -> Option<Span> {
        match self {
            NodeKind::Text { span } | NodeKind::Interjection { span } => Some(*span),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Text { .. } => "text",
            NodeKind::Passage(_) => "passage",
            NodeKind::Interjection { .. } => "interjection",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Single-writer document tree.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl DocumentTree {
    /// Root, one paragraph, one text node over the whole source.
    pub fn from_text(source: impl Into<String>) -> Self {
        let source = source.into();
        let len = source.len();
        let mut tree = Self {
            source,
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = tree.alloc(NodeKind::Document);
        let paragraph = tree.alloc(NodeKind::Paragraph);
        let text = tree.alloc(NodeKind::Text { span: Span::new(0, len) });
        tree.link(root, paragraph);
        tree.link(paragraph, text);
        tree.root = root;
        tree
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Nodes ever allocated, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::NodeNotFound(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::NodeNotFound(id.0))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> &[NodeId] {
        self.children(self.root)
    }

    /// Source text covered by a leaf or passage.
    pub fn text_of(&self, id: NodeId) -> Option<&str> {
        let span = match &self.get(id)?.kind {
            NodeKind::Text { span } | NodeKind::Interjection { span } => *span,
            NodeKind::Passage(data) => data.span,
            _ => return None,
        };
        span.slice(&self.source)
    }

    /// Text and interjection leaves in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |node| {
            if node.kind.leaf_span().is_some() {
                out.push(node.id);
            }
        });
        out
    }

    /// Passage nodes in document order.
    pub fn passages(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |node| {
            if matches!(node.kind, NodeKind::Passage(_)) {
                out.push(node.id);
            }
        });
        out
    }

    /// Concatenated leaf text; equals the source on a valid tree.
    pub fn render_text(&self) -> String {
        self.leaves()
            .into_iter()
            .filter_map(|id| self.text_of(id))
            .collect()
    }

    fn walk<F: FnMut(&Node)>(&self, id: NodeId, visit: &mut F) {
        if let Some(node) = self.get(id) {
            visit(node);
            for child in &node.children {
                self.walk(*child, visit);
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Allocate an unattached node.
    pub(crate) fn create(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind)
    }

    /// Replace the children of `parent`. Previous children not in the new
    /// list become detached.
    pub(crate) fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) -> Result<(), TreeError> {
        for child in &children {
            self.node(*child)?;
        }
        let previous = std::mem::take(&mut self.node_mut(parent)?.children);
        for old in previous {
            self.nodes[old.0].parent = None;
        }
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.node_mut(parent)?.children = children;
        Ok(())
    }

    /// Insert `new_siblings` right after `anchor` in its parent.
    pub(crate) fn insert_after(&mut self, anchor: NodeId, new_siblings: &[NodeId]) -> Result<(), TreeError> {
        let parent = self
            .node(anchor)?
            .parent
            .ok_or_else(|| TreeError::InvariantViolation(format!("{} has no parent", anchor)))?;
        let position = self
            .children(parent)
            .iter()
            .position(|c| *c == anchor)
            .ok_or_else(|| TreeError::InvariantViolation(format!("{} missing from its parent", anchor)))?;
        for sibling in new_siblings {
            self.node_mut(*sibling)?.parent = Some(parent);
        }
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.splice(position + 1..position + 1, new_siblings.iter().copied());
        Ok(())
    }

    /// Point a text or interjection leaf at a different span.
    pub(crate) fn set_leaf_span(&mut self, id: NodeId, new_span: Span) -> Result<(), TreeError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text { span } | NodeKind::Interjection { span } => {
                *span = new_span;
                Ok(())
            }
            other => Err(TreeError::InvariantViolation(format!(
                "{} is a {} node, not a leaf",
                id,
                other.name()
            ))),
        }
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), TreeError> {
        let root = self.node(self.root)?;
        if root.kind != NodeKind::Document || root.parent.is_some() {
            return Err(TreeError::InvariantViolation("root must be a parentless document node".to_string()));
        }

        for paragraph_id in &root.children {
            let paragraph = self.node(*paragraph_id)?;
            self.check_parent(paragraph, self.root)?;
            if paragraph.kind != NodeKind::Paragraph {
                return Err(TreeError::InvariantViolation(format!(
                    "{} under the root is a {} node",
                    paragraph.id,
                    paragraph.kind.name()
                )));
            }

            let has_passage = paragraph
                .children
                .iter()
                .any(|c| matches!(self.get(*c).map(|n| &n.kind), Some(NodeKind::Passage(_))));
            if has_passage && paragraph.children.len() != 1 {
                return Err(TreeError::InvariantViolation(format!(
                    "passage in {} shares its paragraph with {} sibling(s)",
                    paragraph.id,
                    paragraph.children.len() - 1
                )));
            }

            for child_id in &paragraph.children {
                let child = self.node(*child_id)?;
                self.check_parent(child, paragraph.id)?;
                match &child.kind {
                    NodeKind::Text { .. } => {}
                    NodeKind::Passage(data) => self.check_passage(child, data)?,
                    other => {
                        return Err(TreeError::InvariantViolation(format!(
                            "{} node {} directly inside paragraph {}",
                            other.name(),
                            child.id,
                            paragraph.id
                        )));
                    }
                }
            }
        }

        self.check_conservation()
    }

    fn check_parent(&self, node: &Node, expected: NodeId) -> Result<(), TreeError> {
        if node.parent != Some(expected) {
            return Err(TreeError::InvariantViolation(format!(
                "{} points at parent {:?}, expected {}",
                node.id, node.parent, expected
            )));
        }
        Ok(())
    }

    fn check_passage(&self, passage: &Node, data: &PassageData) -> Result<(), TreeError> {
        if passage.children.is_empty() {
            return Err(TreeError::InvariantViolation(format!("passage {} has no text", passage.id)));
        }
        let mut cursor = data.span.start;
        for leaf_id in &passage.children {
            let leaf = self.node(*leaf_id)?;
            self.check_parent(leaf, passage.id)?;
            let span = leaf.kind.leaf_span().ok_or_else(|| {
                TreeError::InvariantViolation(format!("{} node {} inside passage", leaf.kind.name(), leaf.id))
            })?;
            if span.start != cursor {
                return Err(TreeError::InvariantViolation(format!(
                    "passage {} leaf {} starts at {}, expected {}",
                    passage.id, leaf.id, span.start, cursor
                )));
            }
            cursor = span.end;
        }
        if cursor != data.span.end {
            return Err(TreeError::InvariantViolation(format!(
                "passage {} leaves end at {}, passage ends at {}",
                passage.id, cursor, data.span.end
            )));
        }
        Ok(())
    }

    fn check_conservation(&self) -> Result<(), TreeError> {
        let mut cursor = 0;
        for id in self.leaves() {
            let span = self.node(id)?.kind.leaf_span().unwrap_or_default();
            if span.start != cursor || !span.is_valid_in(&self.source) {
                return Err(TreeError::InvariantViolation(format!(
                    "leaf {} covers {}, expected to start at {}",
                    id, span, cursor
                )));
            }
            cursor = span.end;
        }
        if cursor != self.source.len() {
            return Err(TreeError::InvariantViolation(format!(
                "leaves cover {} of {} source bytes",
                cursor,
                self.source.len()
            )));
        }
        Ok(())
    }

    /// Serializable snapshot of the reachable tree.
    pub fn to_record(&self) -> NodeRecord {
        self.record(self.root)
    }

    fn record(&self, id: NodeId) -> NodeRecord {
        let Some(node) = self.get(id) else {
            return NodeRecord::Paragraph { id, children: Vec::new() };
        };
        let children = || node.children.iter().map(|c| self.record(*c)).collect();
        let text = |span: &Span| span.slice(&self.source).unwrap_or_default().to_string();
        match &node.kind {
            NodeKind::Document => NodeRecord::Document { id, children: children() },
            NodeKind::Paragraph => NodeRecord::Paragraph { id, children: children() },
            NodeKind::Text { span } => NodeRecord::Text {
                id,
                start: span.start,
                end: span.end,
                text: text(span),
            },
            NodeKind::Interjection { span } => NodeRecord::Interjection {
                id,
                start: span.start,
                end: span.end,
                text: text(span),
            },
            NodeKind::Passage(data) => NodeRecord::Passage {
                id,
                reference: data.reference.canonical(),
                start: data.span.start,
                end: data.span.end,
                confidence: data.confidence,
                translation: data.translation.clone(),
                children: children(),
            },
        }
    }
}

/// Tagged JSON form of a node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeRecord {
    Document {
        id: NodeId,
        children: Vec<NodeRecord>,
    },
    Paragraph {
        id: NodeId,
        children: Vec<NodeRecord>,
    },
    Text {
        id: NodeId,
        start: usize,
        end: usize,
        text: String,
    },
    Passage {
        id: NodeId,
        reference: String,
        start: usize,
        end: usize,
        confidence: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        translation: Option<String>,
        children: Vec<NodeRecord>,
    },
    Interjection {
        id: NodeId,
        start: usize,
        end: usize,
        text: String,
    },
}
