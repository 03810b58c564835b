//! Markdown parser implementation using comrak
//!
//! comrak builds the syntax tree; this module converts it into the crate's own
//! [`Document`] arena. comrak reports positions as line/column pairs and hands
//! inline text over as owned strings, so inline spans are recovered by
//! searching the source forward from a cursor that follows the conversion.

use comrak::{
    nodes::{AstNode, ListDelimType, ListType, NodeValue, Sourcepos},
    parse_document, Arena, Options,
};
use log::debug;

use super::document::{Document, NodeId, NodeKind, Span};
use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for markdown parsing.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable autolink URLs and emails
    pub autolink: bool,
    /// Enable task lists (- [ ] and - [x])
    pub tasklist: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            autolink: true,
            tasklist: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();
        options.extension.autolink = self.autolink;
        options.extension.tasklist = self.tasklist;
        options
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Parse markdown text into a [`Document`] using default options.
pub fn parse_markdown(markdown: &str) -> Result<Document> {
    parse_markdown_with_options(markdown, &MarkdownOptions::default())
}

/// Parse markdown text into a [`Document`] with custom options.
///
/// Node kinds outside the supported subset are kept as
/// [`NodeKind::Unsupported`] so section boundaries stay correct; rendering
/// them is what fails.
pub fn parse_markdown_with_options(markdown: &str, options: &MarkdownOptions) -> Result<Document> {
    let arena = Arena::new();
    let comrak_options = options.to_comrak_options();

    let root = parse_document(&arena, markdown, &comrak_options);

    let mut builder = TreeBuilder::new(markdown);
    let doc_root = builder.doc.root();
    for child in root.children() {
        builder.convert_block(child, doc_root, false);
    }

    Ok(builder.doc)
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Index
// ─────────────────────────────────────────────────────────────────────────────

/// Maps comrak's 1-based line/column positions to byte offsets.
struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            starts,
            len: source.len(),
        }
    }

    fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|index| self.starts.get(index))
            .copied()
    }

    fn offset(&self, line: usize, column: usize) -> usize {
        match self.line_start(line) {
            Some(start) => (start + column.saturating_sub(1)).min(self.len),
            None => 0,
        }
    }

    /// Offset of the line break ending `line`, or the buffer end.
    fn line_end(&self, line: usize) -> usize {
        match self.starts.get(line) {
            Some(next) if line > 0 => next - 1,
            _ if line == 0 => 0,
            _ => self.len,
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset).max(1)
    }

    fn is_blank(&self, source: &str, line: usize) -> bool {
        let Some(start) = self.line_start(line) else {
            return false;
        };
        source
            .get(start..self.line_end(line))
            .is_some_and(|text| text.trim().is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Conversion
// ─────────────────────────────────────────────────────────────────────────────

struct TreeBuilder<'s> {
    source: &'s str,
    lines: LineIndex,
    doc: Document,
    /// Bytes before this offset belong to inlines already converted
    cursor: usize,
    /// Checkbox state and item start of the task item being converted
    pending_checkbox: Option<(bool, usize)>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            doc: Document::new(source.to_string()),
            cursor: 0,
            pending_checkbox: None,
        }
    }

    fn block_span(&self, pos: Sourcepos) -> Span {
        let start = self.lines.offset(pos.start.line, pos.start.column);
        let end = self.lines.line_end(pos.end.line).max(start);
        Span::new(start, end)
    }

    /// The first block of a container never gets a separator.
    fn blank_line_before(&self, parent: NodeId, line: usize) -> bool {
        !self.doc.children(parent).is_empty()
            && line > 1
            && self.lines.is_blank(self.source, line - 1)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Blocks
    // ─────────────────────────────────────────────────────────────────────────

    fn convert_block<'a>(&mut self, node: &'a AstNode<'a>, parent: NodeId, tight: bool) {
        let ast = node.data.borrow();
        let pos = ast.sourcepos;
        let line = pos.start.line.max(1);
        let span = self.block_span(pos);
        let blank = self.blank_line_before(parent, line);

        match &ast.value {
            NodeValue::Heading(heading) => {
                let limit = self.lines.line_end(line).max(span.start);
                let span = Span::new(span.start, limit);
                let id = self.doc.push(
                    parent,
                    NodeKind::Heading {
                        level: heading.level,
                    },
                    span,
                    line,
                    blank,
                );
                self.cursor = heading_content_start(self.source, span);
                self.convert_inlines(node, id, limit);
            }
            NodeValue::Paragraph => {
                let in_item = matches!(self.doc.kind(parent), NodeKind::ListItem { .. });
                let kind = if tight && in_item {
                    NodeKind::TextBlock
                } else {
                    NodeKind::Paragraph
                };
                let id = self.doc.push(parent, kind, span, line, blank);
                self.cursor = span.start;
                if let Some((checked, item_start)) = self.pending_checkbox.take() {
                    if let Some(marker) = self.checkbox_span(item_start) {
                        self.doc
                            .push(id, NodeKind::Checkbox { checked }, marker, line, false);
                        let paragraph = self.doc.node_mut(id);
                        paragraph.span.start = paragraph.span.start.min(marker.start);
                        self.cursor = marker.end;
                    }
                }
                self.convert_inlines(node, id, span.end);
            }
            NodeValue::List(list) => {
                let (ordered, marker) = match list.list_type {
                    ListType::Bullet => (false, char::from(list.bullet_char)),
                    ListType::Ordered => (
                        true,
                        if list.delimiter == ListDelimType::Period {
                            '.'
                        } else {
                            ')'
                        },
                    ),
                };
                let id = self.doc.push(
                    parent,
                    NodeKind::List {
                        ordered,
                        marker,
                        start: list.start,
                    },
                    span,
                    line,
                    blank,
                );
                for child in node.children() {
                    self.convert_block(child, id, list.tight);
                }
            }
            NodeValue::Item(_) => self.convert_item(node, parent, pos, None, tight),
            NodeValue::TaskItem(symbol) => {
                let checked = symbol.is_some_and(|c| c == 'x' || c == 'X');
                self.convert_item(node, parent, pos, Some(checked), tight);
            }
            other => {
                let kind = describe(other);
                debug!("Keeping unsupported {} block at line {}", kind, line);
                self.doc
                    .push(parent, NodeKind::Unsupported { kind }, span, line, blank);
            }
        }
    }

    fn convert_item<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        parent: NodeId,
        pos: Sourcepos,
        checked: Option<bool>,
        tight: bool,
    ) {
        let source = self.source;
        let line = pos.start.line.max(1);
        let line_end = self.lines.line_end(line);

        // comrak may start the item at the indentation; spans start at the marker
        let mut start = self.lines.offset(line, pos.start.column);
        while start < line_end && matches!(source.as_bytes()[start], b' ' | b'\t') {
            start += 1;
        }
        let end = self.lines.line_end(pos.end.line).max(start);
        let offset = source.get(start..line_end).map_or(2, marker_width);
        let blank = self.blank_line_before(parent, line);

        let id = self.doc.push(
            parent,
            NodeKind::ListItem { offset },
            Span::new(start, end),
            line,
            blank,
        );
        self.cursor = start;
        self.pending_checkbox = checked.map(|checked| (checked, start));
        for child in node.children() {
            self.convert_block(child, id, tight);
        }
        self.pending_checkbox = None;
    }

    /// `[ ]` / `[x]` on the first line of a task item.
    fn checkbox_span(&self, item_start: usize) -> Option<Span> {
        let line_end = self.lines.line_end(self.lines.line_of(item_start));
        let line = self.source.get(item_start..line_end)?;
        let open = line.find('[')?;
        let close = open + line[open..].find(']')?;
        Some(Span::new(item_start + open, item_start + close + 1))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inlines
    // ─────────────────────────────────────────────────────────────────────────

    fn convert_inlines<'a>(&mut self, node: &'a AstNode<'a>, parent: NodeId, limit: usize) {
        for child in node.children() {
            let ast = child.data.borrow();
            match &ast.value {
                NodeValue::Text(literal) => self.push_text(parent, literal, ast.sourcepos, limit),
                NodeValue::SoftBreak | NodeValue::LineBreak => self.break_line(parent, limit),
                NodeValue::Emph => self.convert_emphasis(child, parent, 1, limit),
                NodeValue::Strong => self.convert_emphasis(child, parent, 2, limit),
                NodeValue::Link(link) => self.convert_link(child, parent, &link.url, limit),
                other => {
                    let kind = describe(other);
                    let span = self.fallback_span(ast.sourcepos, limit);
                    let line = self.lines.line_of(span.start);
                    self.doc
                        .push(parent, NodeKind::Unsupported { kind }, span, line, false);
                    self.cursor = self.cursor.max(span.end);
                }
            }
        }
    }

    fn push_text(&mut self, parent: NodeId, literal: &str, pos: Sourcepos, limit: usize) {
        let span = self
            .locate(literal, limit)
            .unwrap_or_else(|| self.fallback_span(pos, limit));
        let line = self.lines.line_of(span.start);
        self.doc.push(
            parent,
            NodeKind::Text {
                soft_line_break: false,
            },
            span,
            line,
            false,
        );
        self.cursor = self.cursor.max(span.end);
    }

    /// Find `literal` in the source between the cursor and `limit`.
    fn locate(&self, literal: &str, limit: usize) -> Option<Span> {
        let window = self.source.get(self.cursor..limit)?;
        if literal.is_empty() {
            return Some(Span::empty(self.cursor));
        }
        let (at, len) = match window.find(literal) {
            Some(at) => (at, literal.len()),
            None => {
                // tasklist processing can leave the space after `]` on the literal
                let trimmed = literal.trim_start();
                if trimmed.is_empty() || trimmed.len() == literal.len() {
                    return None;
                }
                (window.find(trimmed)?, trimmed.len())
            }
        };
        Some(Span::new(self.cursor + at, self.cursor + at + len))
    }

    /// Span from comrak's own position, clamped to the unconverted window.
    fn fallback_span(&self, pos: Sourcepos, limit: usize) -> Span {
        let floor = self.cursor.min(limit);
        let start = self
            .lines
            .offset(pos.start.line, pos.start.column)
            .clamp(floor, limit);
        let end = (self.lines.offset(pos.end.line, pos.end.column) + 1).clamp(start, limit);
        if self.source.is_char_boundary(start) && self.source.is_char_boundary(end) {
            Span::new(start, end)
        } else {
            Span::empty(floor)
        }
    }

    /// Mark the inline before a line break as ending its line.
    ///
    /// Trailing spaces and a hard-break backslash stay on the text so the line
    /// renders back unchanged. The line ending itself, `\r\n` included, is
    /// left to the renderer.
    fn break_line(&mut self, parent: NodeId, limit: usize) {
        let source = self.source;
        let Some(newline) = source
            .get(self.cursor..limit)
            .and_then(|window| window.find('\n'))
            .map(|at| self.cursor + at)
        else {
            return;
        };
        let line_end = if source[..newline].ends_with('\r') {
            newline - 1
        } else {
            newline
        };

        let last_text = self
            .doc
            .children(parent)
            .last()
            .copied()
            .filter(|&id| matches!(self.doc.kind(id), NodeKind::Text { .. }));

        match last_text {
            Some(id) => {
                let node = self.doc.node_mut(id);
                if source
                    .get(node.span.end..line_end)
                    .is_some_and(is_line_tail)
                {
                    node.span.end = line_end;
                }
                node.kind = NodeKind::Text {
                    soft_line_break: true,
                };
            }
            None => {
                let start = self.cursor;
                let span = if source.get(start..line_end).is_some_and(is_line_tail) {
                    Span::new(start, line_end)
                } else {
                    Span::empty(start)
                };
                let line = self.lines.line_of(start);
                self.doc.push(
                    parent,
                    NodeKind::Text {
                        soft_line_break: true,
                    },
                    span,
                    line,
                    false,
                );
            }
        }
        self.cursor = newline + 1;
    }

    fn convert_emphasis<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        parent: NodeId,
        level: u8,
        limit: usize,
    ) {
        let source = self.source;
        let start = source
            .get(self.cursor..limit)
            .and_then(|window| window.find(|c| c == '*' || c == '_'))
            .map_or(self.cursor, |at| self.cursor + at);
        let line = self.lines.line_of(start);
        let id = self.doc.push(
            parent,
            NodeKind::Emphasis { level },
            Span::empty(start),
            line,
            false,
        );

        self.cursor = start + count_markers(source.get(start..limit), level);
        self.convert_inlines(node, id, limit);
        self.cursor += count_markers(source.get(self.cursor..limit), level);
        self.doc.node_mut(id).span.end = self.cursor;
    }

    fn convert_link<'a>(&mut self, node: &'a AstNode<'a>, parent: NodeId, url: &str, limit: usize) {
        if let Some(span) = self.autolink_span(node, url, limit) {
            let line = self.lines.line_of(span.start);
            self.doc.push(parent, NodeKind::AutoLink, span, line, false);
            self.cursor = span.end;
            return;
        }

        let source = self.source;
        let start = source
            .get(self.cursor..limit)
            .and_then(|window| window.find('['))
            .map_or(self.cursor, |at| self.cursor + at);
        let line = self.lines.line_of(start);
        let id = self.doc.push(
            parent,
            NodeKind::Link {
                destination: url.to_string(),
            },
            Span::empty(start),
            line,
            false,
        );

        if source.as_bytes().get(start) == Some(&b'[') {
            self.cursor = start + 1;
        }
        self.convert_inlines(node, id, limit);
        self.cursor = self.skip_link_tail(limit);
        self.doc.node_mut(id).span.end = self.cursor;
    }

    /// Span of a bare or `<...>` URL, or `None` for an inline `[..](..)` link.
    fn autolink_span<'a>(&self, node: &'a AstNode<'a>, url: &str, limit: usize) -> Option<Span> {
        let mut children = node.children();
        let only = children.next()?;
        if children.next().is_some() {
            return None;
        }
        let label = match &only.data.borrow().value {
            NodeValue::Text(text) => text.clone(),
            _ => return None,
        };
        if label.is_empty() || !url.ends_with(label.as_str()) {
            return None;
        }

        let span = self.locate(&label, limit)?;
        let bytes = self.source.as_bytes();
        match span.start.checked_sub(1).map(|before| bytes[before]) {
            Some(b'[') => None,
            Some(b'<') if bytes.get(span.end) == Some(&b'>') => {
                Some(Span::new(span.start - 1, span.end + 1))
            }
            _ => Some(span),
        }
    }

    /// Offset just past the `](destination)` that closes an inline link.
    fn skip_link_tail(&self, limit: usize) -> usize {
        let Some(window) = self.source.get(self.cursor..limit) else {
            return self.cursor;
        };
        let Some(open) = window.find("](") else {
            return window
                .find(']')
                .map_or(self.cursor, |at| self.cursor + at + 1);
        };

        let mut depth = 0usize;
        for (at, c) in window[open + 1..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.cursor + open + 1 + at + 1;
                    }
                }
                _ => {}
            }
        }
        limit
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn heading_content_start(source: &str, span: Span) -> usize {
    source.get(span.start..span.end).map_or(span.start, |line| {
        let content = line
            .trim_start_matches(' ')
            .trim_start_matches('#')
            .trim_start_matches(|c| c == ' ' || c == '\t');
        span.end - content.len()
    })
}

/// Width of a list marker plus the spaces after it, CommonMark style: one
/// space is assumed when the content is empty or starts with more than four.
fn marker_width(line: &str) -> usize {
    let bytes = line.as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    let marker = if digits > 0 { digits + 1 } else { 1 };
    let marker = marker.min(bytes.len());
    let spaces = bytes[marker..].iter().take_while(|b| **b == b' ').count();
    if spaces == 0 || spaces > 4 || marker + spaces == bytes.len() {
        marker + 1
    } else {
        marker + spaces
    }
}

fn count_markers(window: Option<&str>, level: u8) -> usize {
    window.map_or(0, |text| {
        text.bytes()
            .take(usize::from(level))
            .take_while(|b| matches!(b, b'*' | b'_'))
            .count()
    })
}

fn is_line_tail(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\\'))
}

fn describe(value: &NodeValue) -> &'static str {
    match value {
        NodeValue::BlockQuote => "block quote",
        NodeValue::CodeBlock(_) => "code block",
        NodeValue::HtmlBlock(_) => "html block",
        NodeValue::ThematicBreak => "thematic break",
        NodeValue::Table(_) => "table",
        NodeValue::FootnoteDefinition(_) => "footnote definition",
        NodeValue::FrontMatter(_) => "front matter",
        NodeValue::DescriptionList => "description list",
        NodeValue::Code(_) => "code span",
        NodeValue::HtmlInline(_) => "inline html",
        NodeValue::Image(_) => "image",
        NodeValue::Strikethrough => "strikethrough",
        NodeValue::FootnoteReference(_) => "footnote reference",
        _ => "unrecognized",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
