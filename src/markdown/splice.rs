//! Byte-buffer splicing after headings
//!
//! Structural edits never mutate a tree. Each operation parses the buffer,
//! finds an anchor from an existing heading's span, and builds a new buffer
//! with the rendered text inserted there. Bytes outside the insertion point
//! are copied through untouched.
//!
//! The anchor is the end of the heading's own line, just before its line
//! break. Inserted text always starts with its own separator, so the line
//! break that followed the heading now follows the inserted text.
//!
//! Inserted text takes the line ending of the buffer it lands in, so a
//! `\r\n` file stays `\r\n` throughout.

use log::debug;

use super::document::{Document, NodeId};
use super::renderer::{render, render_all};
use super::section::{find_heading, section_members, HeadingRef};
use crate::error::{Error, Result};

/// Insert a blank line and `text` after the heading matching `heading`.
///
/// Returns `buf` unchanged when no heading matches.
///
/// # Errors
///
/// Returns `Error::InvalidUtf8` when `buf` is not UTF-8.
pub fn insert_text_after_heading(buf: &[u8], heading: &HeadingRef, text: &str) -> Result<Vec<u8>> {
    let doc = Document::from_bytes(buf)?;
    let Some(target) = find_heading(&doc, heading) else {
        debug!("Heading '{}' not found, leaving buffer unchanged", heading);
        return Ok(buf.to_vec());
    };
    let eol = doc.line_ending();
    let insert = format!("{}{}{}", eol, eol, with_line_ending(text, eol));
    splice(buf, doc.line_end(target), &insert)
}

/// Insert rendered `nodes` of `src` after the heading matching `heading` in
/// `dest`, keeping their order.
///
/// Nodes are spliced one at a time in reverse at the same anchor. Every
/// insertion lands after the anchor, so the offset stays valid.
///
/// # Errors
///
/// Propagates UTF-8 and rendering errors; `dest` is never partially edited.
pub fn insert_nodes_after_heading(
    dest: &[u8],
    heading: &HeadingRef,
    src: &Document,
    nodes: &[NodeId],
) -> Result<Vec<u8>> {
    let doc = Document::from_bytes(dest)?;
    let Some(target) = find_heading(&doc, heading) else {
        debug!("Heading '{}' not found, leaving buffer unchanged", heading);
        return Ok(dest.to_vec());
    };
    let anchor = doc.line_end(target);
    let eol = doc.line_ending();

    let mut out = dest.to_vec();
    for &node in nodes.iter().rev() {
        let rendered = with_line_ending(&render(src, node)?, eol);
        out = splice(&out, anchor, &rendered)?;
    }
    Ok(out)
}

/// Render the members of the section under `heading`.
///
/// Returns `None` when the heading is missing and an empty string for a
/// section without members.
pub fn extract_section(src: &[u8], heading: &HeadingRef) -> Result<Option<String>> {
    let doc = Document::from_bytes(src)?;
    let section = section_members(&doc, heading);
    if !section.is_found() {
        return Ok(None);
    }
    render_all(&doc, &section.members).map(Some)
}

/// Copy the section under `heading` from `src` into `dest`, right after the
/// same heading.
///
/// `dest` comes back unchanged when either document lacks the heading.
pub fn inherit_section(dest: &[u8], src: &[u8], heading: &HeadingRef) -> Result<Vec<u8>> {
    let src_doc = Document::from_bytes(src)?;
    let section = section_members(&src_doc, heading);
    if !section.is_found() {
        debug!("Source has no '{}' section, nothing to inherit", heading);
        return Ok(dest.to_vec());
    }
    insert_nodes_after_heading(dest, heading, &src_doc, &section.members)
}

fn with_line_ending(text: &str, eol: &str) -> String {
    let text = text.replace("\r\n", "\n");
    if eol == "\n" {
        text
    } else {
        text.replace('\n', eol)
    }
}

fn splice(buf: &[u8], at: usize, insert: &str) -> Result<Vec<u8>> {
    if at > buf.len() {
        return Err(Error::InvalidSpan {
            start: at,
            end: at,
            len: buf.len(),
        });
    }
    let mut out = Vec::with_capacity(buf.len() + insert.len());
    out.extend_from_slice(&buf[..at]);
    out.extend_from_slice(insert.as_bytes());
    out.extend_from_slice(&buf[at..]);
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
