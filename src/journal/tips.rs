//! Tips collection and the tips index
//!
//! Tips are level-2 headings inside markdown files under `{base}/tips/`. The
//! index lists every directory, file title and tip as a nested list, with a
//! checkbox per tip recording whether it has already been shown. One unshown
//! tip is picked for each new daily memo.

use std::path::{Path, PathBuf};

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use walkdir::WalkDir;

use super::read_file;
use crate::error::{Error, Result};
use crate::markdown::{
    build_checkbox, build_link, build_list, headings_by_level, slug, split_sections, Document,
    NodeKind,
};

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// A tip heading and its link destination, `file.md#slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tip {
    pub text: String,
    pub destination: String,
    pub checked: bool,
}

impl Tip {
    /// `[text](destination)`
    pub fn to_link(&self) -> String {
        build_link(&self.text, &self.destination)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipEntry {
    Dir { name: String },
    Title { text: String, destination: String },
    Tip(Tip),
}

/// One line of the tips index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipNode {
    pub entry: TipEntry,
    pub depth: usize,
}

impl TipNode {
    fn tip(&self) -> Option<&Tip> {
        match &self.entry {
            TipEntry::Tip(tip) => Some(tip),
            _ => None,
        }
    }

    fn tip_mut(&mut self) -> Option<&mut Tip> {
        match &mut self.entry {
            TipEntry::Tip(tip) => Some(tip),
            _ => None,
        }
    }

    /// Index line, indented two spaces per depth level, ending in `\n`.
    pub fn to_markdown(&self) -> String {
        let line = match &self.entry {
            TipEntry::Dir { name } => build_list(name),
            TipEntry::Title { text, .. } => build_list(text),
            TipEntry::Tip(tip) => build_checkbox(&tip.to_link(), tip.checked),
        };
        format!("{}{}\n", "  ".repeat(self.depth), line)
    }
}

pub fn render_entries(nodes: &[TipNode]) -> String {
    nodes.iter().map(TipNode::to_markdown).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Reading the Index
// ─────────────────────────────────────────────────────────────────────────────

/// Every linked entry of a tips index, with its checkbox state.
///
/// Entries are the text blocks of list items; those without a link are
/// skipped.
pub fn tips_from_index(doc: &Document) -> Result<Vec<Tip>> {
    let mut tips = Vec::new();
    for id in doc.descendants(doc.root()) {
        if !matches!(doc.kind(id), NodeKind::TextBlock | NodeKind::Paragraph) {
            continue;
        }
        let in_item = doc
            .parent(id)
            .is_some_and(|parent| matches!(doc.kind(parent), NodeKind::ListItem { .. }));
        if !in_item {
            continue;
        }

        let mut link = None;
        let mut checked = false;
        for &child in doc.children(id) {
            match doc.kind(child) {
                NodeKind::Link { destination } => {
                    link = Some((doc.text(child)?, destination.clone()));
                }
                NodeKind::Checkbox { checked: state } => checked = *state,
                _ => {}
            }
        }
        if let Some((text, destination)) = link {
            tips.push(Tip {
                text,
                destination,
                checked,
            });
        }
    }
    Ok(tips)
}

/// Checked tips of the index file at `path`.
pub fn checked_tips(path: &Path) -> Result<Vec<Tip>> {
    let doc = Document::from_bytes(&read_file(path)?)?;
    Ok(tips_from_index(&doc)?
        .into_iter()
        .filter(|tip| tip.checked)
        .collect())
}

// ─────────────────────────────────────────────────────────────────────────────
// Collecting Tips
// ─────────────────────────────────────────────────────────────────────────────

/// Walk `tips_dir` and build index lines for every directory and tips file.
///
/// `skip` lists files that are never read as tips (the template and the
/// index itself). A tip whose destination appears in `checked` starts out
/// checked.
pub fn collect_tip_nodes(
    tips_dir: &Path,
    skip: &[PathBuf],
    checked: &[Tip],
) -> Result<Vec<TipNode>> {
    let mut nodes = Vec::new();

    let walker = WalkDir::new(tips_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| Error::Application(format!("Failed to walk tips: {}", e)))?;
        let path = entry.path();
        if skip.iter().any(|skipped| skipped == path) {
            continue;
        }

        let Ok(relative) = path.strip_prefix(tips_dir) else {
            continue;
        };
        let depth = relative.components().count().saturating_sub(1);
        let name = entry.file_name().to_string_lossy().into_owned();

        if entry.file_type().is_dir() {
            nodes.push(TipNode {
                entry: TipEntry::Dir { name },
                depth,
            });
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }

        let destination = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let doc = Document::from_bytes(&read_file(path)?)?;
        nodes.extend(file_nodes(&doc, &destination, depth, checked)?);
    }
    Ok(nodes)
}

/// Title and tip lines for one tips file.
///
/// The title is the first level-1 heading; tips are the level-2 headings of
/// its section. Files without either yield nothing.
fn file_nodes(
    doc: &Document,
    destination: &str,
    depth: usize,
    checked: &[Tip],
) -> Result<Vec<TipNode>> {
    let Some(&title) = headings_by_level(doc, 1).first() else {
        debug!("'{}' has no title heading, skipping", destination);
        return Ok(Vec::new());
    };
    let members = split_sections(doc, doc.top_level(), 1)
        .into_iter()
        .find(|section| section.heading == Some(title))
        .map(|section| section.members)
        .unwrap_or_default();

    let mut tips = Vec::new();
    for id in members {
        if doc.kind(id).heading_level() != Some(2) {
            continue;
        }
        let text = doc.text(id)?;
        let tip_destination = format!("{}#{}", destination, slug(&text));
        let is_checked = checked.iter().any(|tip| tip.destination == tip_destination);
        tips.push(TipNode {
            entry: TipEntry::Tip(Tip {
                text,
                destination: tip_destination,
                checked: is_checked,
            }),
            depth: depth + 1,
        });
    }
    if tips.is_empty() {
        debug!("'{}' has no tips, skipping", destination);
        return Ok(tips);
    }

    let mut nodes = Vec::with_capacity(tips.len() + 1);
    nodes.push(TipNode {
        entry: TipEntry::Title {
            text: doc.text(title)?,
            destination: destination.to_string(),
        },
        depth,
    });
    nodes.extend(tips);
    Ok(nodes)
}

// ─────────────────────────────────────────────────────────────────────────────
// Picking
// ─────────────────────────────────────────────────────────────────────────────

/// Pick a random unchecked tip and check it.
///
/// When every tip is already checked, all are unchecked first and the pick
/// is made from the whole set. Every entry sharing the picked destination is
/// checked. Returns `None` when there are no tips at all.
pub fn pick_tip<R: Rng + ?Sized>(nodes: &mut [TipNode], rng: &mut R) -> Option<Tip> {
    let all_shown = nodes
        .iter()
        .filter_map(TipNode::tip)
        .all(|tip| tip.checked);
    if all_shown {
        debug!("Every tip has been shown, starting over");
        for tip in nodes.iter_mut().filter_map(TipNode::tip_mut) {
            tip.checked = false;
        }
    }

    let candidates: Vec<&Tip> = nodes
        .iter()
        .filter_map(TipNode::tip)
        .filter(|tip| !tip.checked)
        .collect();
    let picked = candidates.choose(rng).map(|tip| (*tip).clone())?;
    for tip in nodes.iter_mut().filter_map(TipNode::tip_mut) {
        if tip.destination == picked.destination {
            tip.checked = true;
        }
    }
    Some(picked)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
