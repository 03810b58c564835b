//! Structural markdown editing module
//!
//! This module parses markdown into an arena-backed tree with byte spans,
//! locates heading-bounded sections, renders nodes back to their literal
//! markdown, and splices rendered text into other documents after a heading.
//! Parsing is delegated to comrak, a CommonMark + GFM compatible parser.
//!
//! # Features
//! - Round-trip rendering: parse then render reproduces the source
//! - Section lookup by heading level and title substring
//! - Byte-buffer insertion that leaves unrelated text untouched
//! - Link anchor slugs and small line builders
//!
//! # Example
//! ```ignore
//! use memo::markdown::{inherit_section, HeadingRef};
//!
//! let todos = HeadingRef::new(2, "todos");
//! let updated = inherit_section(today.as_bytes(), yesterday.as_bytes(), &todos)?;
//! ```

pub mod builders;
mod document;
mod parser;
mod renderer;
mod section;
mod slug;
mod splice;

pub use builders::{build_checkbox, build_heading, build_link, build_list, build_ordered_list};
pub use document::{Document, Node, NodeId, NodeKind, Span};
pub use parser::{parse_markdown, parse_markdown_with_options, MarkdownOptions};
pub use renderer::{render, render_all, render_document};
pub use section::{
    find_heading, headings_by_level, section_members, split_sections, HeadingRef, Section,
};
pub use slug::slug;
pub use splice::{
    extract_section, inherit_section, insert_nodes_after_heading, insert_text_after_heading,
};
