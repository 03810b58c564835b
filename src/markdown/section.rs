//! Heading lookup and section extraction
//!
//! A section is a heading plus the run of top-level nodes that follows it, up
//! to the next heading of the same or a higher rank. Nesting is decided by
//! heading level alone; the tree itself is flat at the top.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::{Document, NodeId};

// ─────────────────────────────────────────────────────────────────────────────
// Heading Reference
// ─────────────────────────────────────────────────────────────────────────────

/// Lookup key for a heading: its level and a substring of its title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRef {
    pub level: u8,
    pub text: String,
}

impl HeadingRef {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Whether `id` is a heading of this level whose title contains `text`.
    /// Matching is case-sensitive.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        doc.kind(id).heading_level() == Some(self.level)
            && doc
                .text(id)
                .is_ok_and(|title| title.contains(self.text.as_str()))
    }
}

impl fmt::Display for HeadingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", "#".repeat(usize::from(self.level)), self.text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Section
// ─────────────────────────────────────────────────────────────────────────────

/// A located heading and the top-level nodes hanging under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub heading: Option<NodeId>,
    pub members: Vec<NodeId>,
}

impl Section {
    pub fn is_found(&self) -> bool {
        self.heading.is_some()
    }
}

/// First top-level heading matching `heading`, in document order.
pub fn find_heading(doc: &Document, heading: &HeadingRef) -> Option<NodeId> {
    doc.top_level()
        .iter()
        .copied()
        .find(|&id| heading.matches(doc, id))
}

/// Every top-level heading of `level`, in document order.
pub fn headings_by_level(doc: &Document, level: u8) -> Vec<NodeId> {
    doc.top_level()
        .iter()
        .copied()
        .filter(|&id| doc.kind(id).heading_level() == Some(level))
        .collect()
}

#[derive(Clone, Copy)]
enum Scan {
    Searching,
    Collecting(NodeId),
}

/// Locate `heading` and collect the nodes of its section.
///
/// Collection stops at the first later heading whose level is less than or
/// equal to `heading.level`. Deeper headings are members.
pub fn section_members(doc: &Document, heading: &HeadingRef) -> Section {
    let mut scan = Scan::Searching;
    let mut members = Vec::new();

    for &id in doc.top_level() {
        match scan {
            Scan::Searching => {
                if heading.matches(doc, id) {
                    scan = Scan::Collecting(id);
                }
            }
            Scan::Collecting(_) => {
                if doc
                    .kind(id)
                    .heading_level()
                    .is_some_and(|level| level <= heading.level)
                {
                    break;
                }
                members.push(id);
            }
        }
    }

    match scan {
        Scan::Searching => Section::default(),
        Scan::Collecting(found) => Section {
            heading: Some(found),
            members,
        },
    }
}

/// Split `nodes` into sections headed by headings of `level`.
///
/// Nodes before the first such heading are dropped; a heading of a higher
/// rank ends the current section without starting a new one.
pub fn split_sections(doc: &Document, nodes: &[NodeId], level: u8) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for &id in nodes {
        match doc.kind(id).heading_level() {
            Some(found) if found == level => {
                sections.extend(current.take());
                current = Some(Section {
                    heading: Some(id),
                    members: Vec::new(),
                });
            }
            Some(found) if found < level => sections.extend(current.take()),
            _ => {
                if let Some(section) = current.as_mut() {
                    section.members.push(id);
                }
            }
        }
    }
    sections.extend(current);
    sections
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::parser::parse_markdown;

    const MEMO: &str = "# T\n\n## Todos\n\n- buy milk\n\n## Notes\n";

    // ─────────────────────────────────────────────────────────────────────────
    // Heading Lookup
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_find_heading_by_substring() {
        let doc = parse_markdown("# daily memo 2024-03-08\n\n## todos\n").unwrap();
        let found = find_heading(&doc, &HeadingRef::new(1, "daily memo")).unwrap();
        assert_eq!(found, doc.top_level()[0]);
    }

    #[test]
    fn test_find_heading_is_case_sensitive() {
        let doc = parse_markdown("## Todos\n").unwrap();
        assert!(find_heading(&doc, &HeadingRef::new(2, "todos")).is_none());
        assert!(find_heading(&doc, &HeadingRef::new(2, "Todos")).is_some());
    }

    #[test]
    fn test_find_heading_requires_level() {
        let doc = parse_markdown("### Todos\n").unwrap();
        assert!(find_heading(&doc, &HeadingRef::new(2, "Todos")).is_none());
    }

    #[test]
    fn test_find_heading_first_match_wins() {
        let doc = parse_markdown("## Todos\n\n- a\n\n## Todos\n\n- b\n").unwrap();
        let found = find_heading(&doc, &HeadingRef::new(2, "Todos")).unwrap();
        assert_eq!(found, doc.top_level()[0]);
    }

    #[test]
    fn test_headings_by_level() {
        let doc = parse_markdown("# T\n\n## a\n\n### x\n\n## b\n").unwrap();
        let found = headings_by_level(&doc, 2);
        let titles: Vec<String> = found.iter().map(|id| doc.text(*id).unwrap()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_heading_ref_display() {
        assert_eq!(HeadingRef::new(2, "todos").to_string(), "## todos");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Section Members
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_section_members_single_list() {
        let doc = parse_markdown(MEMO).unwrap();
        let section = section_members(&doc, &HeadingRef::new(2, "Todos"));
        assert_eq!(section.heading, Some(doc.top_level()[1]));
        assert_eq!(section.members, vec![doc.top_level()[2]]);
    }

    #[test]
    fn test_section_members_missing_heading() {
        let doc = parse_markdown(MEMO).unwrap();
        let section = section_members(&doc, &HeadingRef::new(2, "Tip"));
        assert!(!section.is_found());
        assert!(section.members.is_empty());
    }

    #[test]
    fn test_section_members_empty_section() {
        let doc = parse_markdown("## Todos\n## Notes\n- a\n").unwrap();
        let section = section_members(&doc, &HeadingRef::new(2, "Todos"));
        assert!(section.is_found());
        assert!(section.members.is_empty());
    }

    #[test]
    fn test_section_members_include_deeper_headings() {
        let doc = parse_markdown("## memos\n\n### one\n\ntext\n\n### two\n\n# next\n").unwrap();
        let section = section_members(&doc, &HeadingRef::new(2, "memos"));
        assert_eq!(section.members.len(), 3);
    }

    #[test]
    fn test_section_members_runs_to_document_end() {
        let doc = parse_markdown("## todos\n\n- a\n\ntext\n").unwrap();
        let section = section_members(&doc, &HeadingRef::new(2, "todos"));
        assert_eq!(section.members.len(), 2);
    }

    #[test]
    fn test_section_members_deterministic() {
        let doc = parse_markdown(MEMO).unwrap();
        let heading = HeadingRef::new(2, "Todos");
        assert_eq!(section_members(&doc, &heading), section_members(&doc, &heading));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Splitting
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_split_sections() {
        let doc =
            parse_markdown("## memos\n\nintro\n\n### one\n\na\n\n### two\n\nb\n\nc\n\n## end\n\nz\n")
                .unwrap();
        let sections = split_sections(&doc, doc.top_level(), 3);
        assert_eq!(sections.len(), 2);
        assert_eq!(doc.text(sections[0].heading.unwrap()).unwrap(), "one");
        assert_eq!(sections[0].members.len(), 1);
        assert_eq!(sections[1].members.len(), 2);
    }
}
