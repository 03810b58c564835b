//! Arena-backed markdown document tree
//!
//! A [`Document`] owns the source text it was parsed from together with a flat
//! arena of [`Node`]s. Nodes refer to each other through [`NodeId`] indices, so
//! parent, child and sibling lookups are plain slice accesses and the tree is
//! an immutable value once the parser has built it.
//!
//! Leaf content is never copied into the tree: text-bearing nodes carry a
//! [`Span`] into the source, and every consumer goes through
//! [`Span::slice`], which refuses spans that do not fit the buffer.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(0);

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers and Spans
// ─────────────────────────────────────────────────────────────────────────────

/// Index of a node inside the [`Document`] that created it, tagged with that
/// document so ids from another parse are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    document: u64,
    index: usize,
}

/// Half-open byte range `start..end` into a document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `at`.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice `source` with this span.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSpan` when the span is reversed, runs past the end
    /// of `source`, or does not fall on UTF-8 character boundaries.
    pub fn slice<'a>(&self, source: &'a str) -> Result<&'a str> {
        let invalid = || Error::InvalidSpan {
            start: self.start,
            end: self.end,
            len: source.len(),
        };
        if self.start > self.end || self.end > source.len() {
            return Err(invalid());
        }
        source.get(self.start..self.end).ok_or_else(invalid)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of node kinds the engine understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of the tree
    Document,
    /// ATX heading (`#` x level)
    Heading { level: u8 },
    /// Paragraph at block level or inside a loose list item
    Paragraph,
    /// Bullet or ordered list
    List {
        ordered: bool,
        /// Bullet character for unordered lists, `.` or `)` for ordered ones
        marker: char,
        start: usize,
    },
    /// List item; `offset` is the width of its marker plus following spaces
    ListItem { offset: usize },
    /// Inline container of a tight list item
    TextBlock,
    /// Literal text; `soft_line_break` marks text that ends a source line
    Text { soft_line_break: bool },
    /// Inline link `[title](destination)`
    Link { destination: String },
    /// Bare or angle-bracketed URL
    AutoLink,
    /// `*` (level 1) or `**` (level 2) emphasis
    Emphasis { level: u8 },
    /// Task list marker, first inline of a list item
    Checkbox { checked: bool },
    /// Anything outside the supported subset; kept so sections stay intact
    Unsupported { kind: &'static str },
}

impl NodeKind {
    /// Human readable kind name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Paragraph => "paragraph",
            NodeKind::List { .. } => "list",
            NodeKind::ListItem { .. } => "list item",
            NodeKind::TextBlock => "text block",
            NodeKind::Text { .. } => "text",
            NodeKind::Link { .. } => "link",
            NodeKind::AutoLink => "autolink",
            NodeKind::Emphasis { .. } => "emphasis",
            NodeKind::Checkbox { .. } => "checkbox",
            NodeKind::Unsupported { kind } => *kind,
        }
    }

    /// Heading level, or `None` for every other kind.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            NodeKind::Heading { level } => Some(*level),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A node in the document arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Bytes this node covers in the document source
    pub span: Span,
    /// Start line in source (1-indexed)
    pub line: usize,
    /// A blank line separates this block from the block before it
    pub blank_lines_before: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed markdown document: the source text plus its node arena.
#[derive(Debug, Clone)]
pub struct Document {
    id: u64,
    source: String,
    nodes: Vec<Node>,
}

impl Document {
    /// Create a document holding only its root node.
    pub(crate) fn new(source: String) -> Self {
        let root = Node {
            kind: NodeKind::Document,
            span: Span::new(0, source.len()),
            line: 1,
            blank_lines_before: false,
            parent: None,
            children: Vec::new(),
        };
        Self {
            id: NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed),
            source,
            nodes: vec![root],
        }
    }

    /// Parse markdown text into a document.
    ///
    /// # Errors
    ///
    /// Propagates failures from the parser adapter.
    pub fn parse(source: &str) -> Result<Self> {
        super::parser::parse_markdown(source)
    }

    /// Parse a raw byte buffer.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUtf8` when the buffer is not UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::parse(std::str::from_utf8(bytes)?)
    }

    /// Append a node under `parent` and return its id.
    pub(crate) fn push(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        span: Span,
        line: usize,
        blank_lines_before: bool,
    ) -> NodeId {
        let id = self.node_id(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span,
            line,
            blank_lines_before,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index].children.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index]
    }

    /// The source text this document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top_level().is_empty()
    }

    fn node_id(&self, index: usize) -> NodeId {
        NodeId {
            document: self.id,
            index,
        }
    }

    pub fn root(&self) -> NodeId {
        self.node_id(0)
    }

    /// Whether `id` was handed out by this document or a clone of it.
    pub fn contains(&self, id: NodeId) -> bool {
        id.document == self.id && id.index < self.nodes.len()
    }

    /// Look up a node. Ids are only meaningful for the document that created them.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index].children
    }

    /// Top-level block nodes in document order.
    pub fn top_level(&self) -> &[NodeId] {
        self.children(self.root())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index].parent
    }

    /// Parent of the parent, the hop between a list item and its enclosing item.
    pub fn grandparent(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).and_then(|p| self.parent(p))
    }

    /// Position of `id` among its siblings (0 for the root).
    pub fn sibling_index(&self, id: NodeId) -> usize {
        self.parent(id)
            .and_then(|p| self.children(p).iter().position(|c| *c == id))
            .unwrap_or(0)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id);
        index
            .checked_sub(1)
            .map(|prev| self.children(parent)[prev])
    }

    /// Every node below `id` in pre-order, `id` itself excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Concatenated literal text of `id` and its descendants.
    ///
    /// Text and autolink spans contribute; markup does not. For a heading this
    /// is its title.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSpan` if a span does not fit the source.
    pub fn text(&self, id: NodeId) -> Result<String> {
        let mut out = String::new();
        self.collect_text(id, &mut out)?;
        Ok(out)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) -> Result<()> {
        let node = self.node(id);
        match node.kind {
            NodeKind::Text { .. } => out.push_str(node.span.slice(&self.source)?),
            NodeKind::AutoLink => {
                let literal = node.span.slice(&self.source)?;
                out.push_str(literal.trim_start_matches('<').trim_end_matches('>'));
            }
            _ => {}
        }
        for &child in self.children(id) {
            self.collect_text(child, out)?;
        }
        Ok(())
    }

    /// Byte offset where the first line of `id` ends, before its line break.
    pub fn line_end(&self, id: NodeId) -> usize {
        let start = self.node(id).span.start.min(self.source.len());
        let end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |i| start + i);
        if end > start && self.source.as_bytes()[end - 1] == b'\r' {
            end - 1
        } else {
            end
        }
    }

    /// `"\r\n"` when the first line of the source ends that way, else `"\n"`.
    ///
    /// Documents with mixed endings render every generated break with this one.
    pub fn line_ending(&self) -> &'static str {
        match self.source.find('\n') {
            Some(at) if self.source[..at].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    /// Line endings after the last block of the document.
    pub fn trailing(&self) -> &str {
        let body = self
            .source
            .trim_end_matches(|c| c == '\n' || c == '\r')
            .len();
        &self.source[body..]
    }

    /// Ids of every ListItem strictly enclosing `id`, innermost first.
    pub fn enclosing_items(&self, id: NodeId) -> Vec<NodeId> {
        let mut items = Vec::new();
        let mut cur = self.parent(id);
        while let Some(ancestor) = cur {
            if matches!(self.kind(ancestor), NodeKind::ListItem { .. }) {
                items.push(ancestor);
            }
            cur = self.parent(ancestor);
        }
        items
    }

    /// Summed `offset` of every enclosing ListItem: the indentation a
    /// continuation line of `id` needs.
    pub fn list_indent(&self, id: NodeId) -> usize {
        self.enclosing_items(id)
            .into_iter()
            .map(|item| match self.kind(item) {
                NodeKind::ListItem { offset } => *offset,
                _ => 0,
            })
            .sum()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_slice_in_bounds() {
        let span = Span::new(2, 5);
        assert_eq!(span.slice("# Todos").unwrap(), "Tod");
        assert_eq!(span.len(), 3);
    }

    #[test]
    fn test_span_slice_out_of_bounds() {
        let err = Span::new(4, 40).slice("# Todos").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSpan {
                start: 4,
                end: 40,
                len: 7
            }
        ));
    }

    #[test]
    fn test_span_slice_reversed() {
        assert!(Span::new(5, 2).slice("# Todos").is_err());
    }

    #[test]
    fn test_span_slice_splits_character() {
        // 'た' is three bytes
        let source = "# たすく";
        assert!(Span::new(2, 3).slice(source).is_err());
        assert_eq!(Span::new(2, 5).slice(source).unwrap(), "た");
    }

    #[test]
    fn test_push_links_parent_and_children() {
        let mut doc = Document::new("# T\n".to_string());
        let root = doc.root();
        let heading = doc.push(root, NodeKind::Heading { level: 1 }, Span::new(0, 3), 1, false);
        let text = doc.push(
            heading,
            NodeKind::Text {
                soft_line_break: false,
            },
            Span::new(2, 3),
            1,
            false,
        );

        assert_eq!(doc.top_level(), &[heading]);
        assert_eq!(doc.parent(text), Some(heading));
        assert_eq!(doc.grandparent(text), Some(root));
        assert_eq!(doc.text(heading).unwrap(), "T");
        assert_eq!(doc.line_end(heading), 3);
        assert_eq!(doc.trailing(), "\n");
    }

    #[test]
    fn test_siblings() {
        let mut doc = Document::new("a\n\nb\n".to_string());
        let root = doc.root();
        let a = doc.push(root, NodeKind::Paragraph, Span::new(0, 1), 1, false);
        let b = doc.push(root, NodeKind::Paragraph, Span::new(3, 4), 3, true);

        assert_eq!(doc.previous_sibling(a), None);
        assert_eq!(doc.previous_sibling(b), Some(a));
        assert_eq!(doc.sibling_index(b), 1);
    }

    #[test]
    fn test_descendants_pre_order() {
        let mut doc = Document::new("a\n\nb\n".to_string());
        let root = doc.root();
        let a = doc.push(root, NodeKind::Paragraph, Span::new(0, 1), 1, false);
        let b = doc.push(root, NodeKind::Paragraph, Span::new(3, 4), 3, true);
        let soft = NodeKind::Text {
            soft_line_break: false,
        };
        let a_text = doc.push(a, soft.clone(), Span::new(0, 1), 1, false);
        let b_text = doc.push(b, soft, Span::new(3, 4), 3, false);

        assert_eq!(doc.descendants(root), vec![a, a_text, b, b_text]);
        assert!(doc.descendants(a_text).is_empty());
    }

    #[test]
    fn test_list_indent_sums_enclosing_items() {
        let mut doc = Document::new("1. a\n   - b\n".to_string());
        let root = doc.root();
        let outer_list = doc.push(
            root,
            NodeKind::List {
                ordered: true,
                marker: '.',
                start: 1,
            },
            Span::new(0, 11),
            1,
            false,
        );
        let outer = doc.push(
            outer_list,
            NodeKind::ListItem { offset: 3 },
            Span::new(0, 11),
            1,
            false,
        );
        let inner_list = doc.push(
            outer,
            NodeKind::List {
                ordered: false,
                marker: '-',
                start: 0,
            },
            Span::new(8, 11),
            2,
            false,
        );
        let inner = doc.push(
            inner_list,
            NodeKind::ListItem { offset: 2 },
            Span::new(8, 11),
            2,
            false,
        );
        let block = doc.push(inner, NodeKind::TextBlock, Span::new(10, 11), 2, false);

        assert_eq!(doc.enclosing_items(inner), vec![outer]);
        assert_eq!(doc.enclosing_items(block), vec![inner, outer]);
        assert_eq!(doc.list_indent(inner), 3);
        assert_eq!(doc.list_indent(block), 5);
        assert_eq!(doc.list_indent(outer), 0);
    }

    #[test]
    fn test_line_ending() {
        assert_eq!(Document::new("# T\r\n\r\n- a\r\n".to_string()).line_ending(), "\r\n");
        assert_eq!(Document::new("# T\n\r\n".to_string()).line_ending(), "\n");
        assert_eq!(Document::new("# T".to_string()).line_ending(), "\n");
    }

    #[test]
    fn test_line_end_stops_before_carriage_return() {
        let mut doc = Document::new("# T\r\n".to_string());
        let root = doc.root();
        let heading = doc.push(root, NodeKind::Heading { level: 1 }, Span::new(0, 3), 1, false);
        assert_eq!(doc.line_end(heading), 3);
    }

    #[test]
    fn test_trailing_without_final_newline() {
        let doc = Document::new("# T".to_string());
        assert_eq!(doc.trailing(), "");
    }

    #[test]
    fn test_node_kind_names() {
        assert_eq!(NodeKind::Heading { level: 2 }.name(), "heading");
        assert_eq!(
            NodeKind::Unsupported {
                kind: "code block"
            }
            .name(),
            "code block"
        );
        assert_eq!(NodeKind::Heading { level: 3 }.heading_level(), Some(3));
        assert_eq!(NodeKind::Paragraph.heading_level(), None);
    }
}
