//! Round-trip markdown renderer
//!
//! Reproduces the literal markdown of a node from its own fields plus the
//! bytes its span covers. Rendering every top-level node of a parsed document
//! in order, followed by the document's trailing line endings, gives back the
//! original text for the supported subset.
//!
//! Block nodes carry their own leading separator (a blank line, or a single
//! line break between adjacent top-level blocks), so a node can be rendered on
//! its own and spliced after a heading line without further glue.

use std::fmt::Write as _;

use super::document::{Document, NodeId, NodeKind};
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Render a single node and its subtree.
///
/// # Errors
///
/// - `Error::UnsupportedNode` for a node kind with no markdown form here
/// - `Error::InvalidSpan` for a span that does not fit the document source
/// - `Error::Application` when `node` was not created by `doc` or a clone of it
pub fn render(doc: &Document, node: NodeId) -> Result<String> {
    if !doc.contains(node) {
        return Err(Error::Application(format!(
            "Node {:?} does not belong to this document",
            node
        )));
    }
    let mut out = String::new();
    render_node(doc, node, &mut out)?;
    Ok(out)
}

/// Render several nodes back to back.
pub fn render_all(doc: &Document, nodes: &[NodeId]) -> Result<String> {
    let mut out = String::new();
    for &node in nodes {
        out.push_str(&render(doc, node)?);
    }
    Ok(out)
}

/// Render a whole document: leading indentation or blank lines, every
/// top-level node, then the trailing line endings.
pub fn render_document(doc: &Document) -> Result<String> {
    let Some(&first) = doc.top_level().first() else {
        return Ok(doc.source().to_string());
    };
    let lead = doc.node(first).span.start;
    let mut out = String::from(doc.source().get(..lead).unwrap_or_default());
    out.push_str(&render_all(doc, doc.top_level())?);
    out.push_str(doc.trailing());
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn render_node(doc: &Document, id: NodeId, out: &mut String) -> Result<()> {
    let node = doc.node(id);
    let source = doc.source();

    match &node.kind {
        NodeKind::Document | NodeKind::TextBlock => {}
        NodeKind::Heading { level } => {
            out.push_str(&block_separator(doc, id));
            out.push_str(&"#".repeat(usize::from(*level)));
            out.push(' ');
        }
        NodeKind::Paragraph | NodeKind::List { .. } => {
            out.push_str(&block_separator(doc, id));
        }
        NodeKind::ListItem { .. } => list_item_prefix(doc, id, out),
        NodeKind::Text { soft_line_break } => {
            let in_link = doc
                .parent(id)
                .is_some_and(|p| matches!(doc.kind(p), NodeKind::Link { .. }));
            if !in_link {
                out.push_str(node.span.slice(source)?);
                if *soft_line_break {
                    out.push_str(doc.line_ending());
                    out.push_str(&" ".repeat(doc.list_indent(id)));
                }
            }
        }
        NodeKind::Checkbox { checked } => {
            out.push_str(if *checked { "[x] " } else { "[ ] " });
        }
        NodeKind::Link { destination } => {
            let title = doc.text(id)?;
            let _ = write!(out, "[{}]({})", title, destination);
            return Ok(());
        }
        NodeKind::AutoLink => {
            out.push_str(node.span.slice(source)?);
            return Ok(());
        }
        NodeKind::Emphasis { level } => {
            let marker = "*".repeat(usize::from(*level));
            out.push_str(&marker);
            for &child in doc.children(id) {
                render_node(doc, child, out)?;
            }
            out.push_str(&marker);
            return Ok(());
        }
        NodeKind::Unsupported { kind } => {
            return Err(Error::UnsupportedNode {
                kind: *kind,
                line: node.line,
            });
        }
    }

    for &child in doc.children(id) {
        render_node(doc, child, out)?;
    }
    Ok(())
}

/// Separator emitted before a heading, paragraph or list.
fn block_separator(doc: &Document, id: NodeId) -> String {
    let node = doc.node(id);
    let eol = doc.line_ending();
    let has_previous = doc.previous_sibling(id).is_some();
    let parent_kind = doc.parent(id).map(|p| doc.kind(p));

    match parent_kind {
        Some(NodeKind::ListItem { .. }) => {
            // a nested list's first item supplies its own line break
            if matches!(node.kind, NodeKind::List { .. }) {
                return if node.blank_lines_before {
                    eol.to_string()
                } else {
                    String::new()
                };
            }
            if !has_previous {
                return String::new();
            }
            let breaks = if node.blank_lines_before { 2 } else { 1 };
            format!("{}{}", eol.repeat(breaks), " ".repeat(doc.list_indent(id)))
        }
        Some(NodeKind::Document) if !node.blank_lines_before && has_previous => eol.to_string(),
        _ if node.blank_lines_before => eol.repeat(2),
        _ => String::new(),
    }
}

fn list_item_prefix(doc: &Document, id: NodeId, out: &mut String) {
    let node = doc.node(id);
    let eol = doc.line_ending();
    let index = doc.sibling_index(id);
    let nested = !doc.enclosing_items(id).is_empty();

    if index > 0 || nested {
        out.push_str(eol);
        if node.blank_lines_before {
            out.push_str(eol);
        }
    }
    out.push_str(&" ".repeat(doc.list_indent(id)));

    match doc.parent(id).map(|list| doc.kind(list)) {
        Some(NodeKind::List {
            ordered: true,
            marker,
            start,
        }) => {
            let _ = write!(out, "{}{} ", start + index, marker);
        }
        Some(NodeKind::List { marker, .. }) => {
            let _ = write!(out, "{} ", marker);
        }
        _ => out.push_str("- "),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::document::Span;
    use crate::markdown::parser::parse_markdown;

    fn round_trip(source: &str) {
        let doc = parse_markdown(source).unwrap();
        let rendered = render_all(&doc, doc.top_level()).unwrap();
        assert_eq!(format!("{}{}", rendered, doc.trailing()), source);
        assert_eq!(render_document(&doc).unwrap(), source);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Round Trip
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_round_trip_headings() {
        round_trip("# daily memo\n\n## todos\n\n## memos\n");
    }

    #[test]
    fn test_round_trip_adjacent_blocks() {
        round_trip("# T\n## todos\n- a\n- b\n## memos\ntext\n");
    }

    #[test]
    fn test_round_trip_lists() {
        round_trip("## todos\n\n- buy milk\n- call mom\n\n1. first\n2. second\n");
    }

    #[test]
    fn test_round_trip_loose_list() {
        round_trip("- one\n\n- two\n\n- three\n");
    }

    #[test]
    fn test_round_trip_nested_lists() {
        round_trip("- parent\n  - child\n    - grandchild\n- sibling\n");
        round_trip("1. outer\n   1. inner\n   2. inner two\n2. outer two\n");
    }

    #[test]
    fn test_round_trip_task_list() {
        round_trip("## todos\n\n- [ ] write report\n- [x] review PR\n  - [ ] nested task\n");
    }

    #[test]
    fn test_round_trip_inlines() {
        round_trip("Read [the book](https://example.com/book) and *take* **notes**.\n");
        round_trip("See https://example.com or <https://example.org>\n");
    }

    #[test]
    fn test_round_trip_soft_breaks() {
        round_trip("first line\nsecond line\n\n- item\n  continued\n");
    }

    #[test]
    fn test_round_trip_no_trailing_newline() {
        round_trip("# T\n\n- a");
    }

    #[test]
    fn test_round_trip_multiple_trailing_newlines() {
        round_trip("# T\n\n\n");
    }

    #[test]
    fn test_round_trip_japanese() {
        round_trip("# 日報\n\n## やること\n\n- 牛乳を買う\n");
    }

    #[test]
    fn test_round_trip_crlf() {
        round_trip("# T\r\n\r\n## Todos\r\n\r\n- a\r\n- b\r\n");
        round_trip("- parent\r\n  - [ ] child\r\n\r\n1. one\r\n2. two\r\n");
        round_trip("first line\r\nsecond line\r\nhard  \r\nbreak\r\n");
    }

    #[test]
    fn test_render_document_keeps_leading_blank_lines() {
        let doc = parse_markdown("\n\n# T\n").unwrap();
        assert_eq!(render_document(&doc).unwrap(), "\n\n# T\n");
    }

    #[test]
    fn test_render_document_whitespace_only() {
        let doc = parse_markdown("\n\n").unwrap();
        assert_eq!(render_document(&doc).unwrap(), "\n\n");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Normalised Output
    // ─────────────────────────────────────────────────────────────────────────

    fn normalised(source: &str) -> String {
        render_document(&parse_markdown(source).unwrap()).unwrap()
    }

    #[test]
    fn test_heading_trailing_spaces_dropped() {
        assert_eq!(normalised("## Todos  \n"), "## Todos\n");
    }

    #[test]
    fn test_heading_closing_sequence_dropped() {
        assert_eq!(normalised("## Todos ##\n"), "## Todos\n");
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        assert_eq!(normalised("# T\n\n\n## A\n"), "# T\n\n## A\n");
        assert_eq!(normalised("- a\n\n\n\nnext\n"), "- a\n\nnext\n");
    }

    #[test]
    fn test_underscore_emphasis_becomes_asterisks() {
        assert_eq!(normalised("_x_ and __y__\n"), "*x* and **y**\n");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-Kind Rules
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_list_member_with_blank_separator() {
        let doc = parse_markdown("# T\n\n## Todos\n\n- buy milk\n\n## Notes\n").unwrap();
        let list = doc.top_level()[2];
        assert_eq!(render(&doc, list).unwrap(), "\n\n- buy milk");
    }

    #[test]
    fn test_render_heading_without_blank_line() {
        let doc = parse_markdown("# T\n## A\n").unwrap();
        assert_eq!(render(&doc, doc.top_level()[1]).unwrap(), "\n## A");
        assert_eq!(render(&doc, doc.top_level()[0]).unwrap(), "# T");
    }

    #[test]
    fn test_render_nested_ordered_item() {
        let doc = parse_markdown("1. a\n   1. b\n").unwrap();
        let outer = doc.children(doc.top_level()[0])[0];
        let nested_list = doc.children(outer)[1];
        let nested_item = doc.children(nested_list)[0];
        let rendered = render(&doc, nested_item).unwrap();
        assert!(rendered.starts_with("\n   1. "), "got {:?}", rendered);
        assert_eq!(rendered, "\n   1. b");
    }

    #[test]
    fn test_render_ordinal_uses_start() {
        let doc = parse_markdown("5. five\n6. six\n").unwrap();
        let second = doc.children(doc.top_level()[0])[1];
        assert_eq!(render(&doc, second).unwrap(), "\n6. six");
    }

    #[test]
    fn test_render_link_uses_child_text() {
        let doc = parse_markdown("[a *b*](x.md#c)").unwrap();
        assert_eq!(render(&doc, doc.top_level()[0]).unwrap(), "[a b](x.md#c)");
    }

    #[test]
    fn test_render_unsupported_node() {
        let doc = parse_markdown("# T\n\n> quoted\n").unwrap();
        let err = render(&doc, doc.top_level()[1]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedNode {
                kind: "block quote",
                line: 3
            }
        ));
    }

    #[test]
    fn test_render_invalid_span() {
        let mut doc = parse_markdown("# T\n").unwrap();
        let heading = doc.top_level()[0];
        let text = doc.children(heading)[0];
        doc.node_mut(text).span = Span::new(2, 99);
        let err = render(&doc, heading).unwrap_err();
        assert!(matches!(err, Error::InvalidSpan { end: 99, .. }));
    }

    #[test]
    fn test_render_foreign_node_id() {
        let small = parse_markdown("# T\n").unwrap();
        let large = parse_markdown("# T\n\n- a\n- b\n- c\n").unwrap();
        let foreign = *large.children(large.top_level()[1]).last().unwrap();
        assert!(render(&small, foreign).is_err());
    }

    #[test]
    fn test_render_foreign_node_id_in_range() {
        let first = parse_markdown("# T\n\n- a\n").unwrap();
        let second = parse_markdown("# T\n\n- a\n").unwrap();
        let foreign = second.top_level()[1];
        let err = render(&first, foreign).unwrap_err();
        assert!(matches!(err, Error::Application(_)));

        let copy = first.clone();
        assert_eq!(render(&copy, first.top_level()[1]).unwrap(), "\n\n- a");
    }
}
