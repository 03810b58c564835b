//! Cross-references between memos
//!
//! A memo is a level-3 heading (one below the memos heading) and its body
//! inside a daily memo's memos section. Memos reference each other by
//! `file name#slug` anchors.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::markdown::{render_all, section_members, slug, split_sections, Document, HeadingRef};

use super::dailymemo::DailyMemo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    pub file_name: String,
    pub title: String,
    pub content: String,
}

impl Memo {
    /// `2024-03-08-Fri.md#title`, the anchor other memos link to.
    pub fn key(&self) -> String {
        format!("{}#{}", self.file_name, slug(&self.title))
    }
}

/// Split the section under `memos_heading` into memos.
pub fn memos_from_dailymemo(memo: &DailyMemo, memos_heading: &HeadingRef) -> Result<Vec<Memo>> {
    let doc = Document::from_bytes(&memo.content)?;
    let section = section_members(&doc, memos_heading);
    let level = memos_heading.level.saturating_add(1);

    let mut memos = Vec::new();
    for part in split_sections(&doc, &section.members, level) {
        let Some(heading) = part.heading else {
            continue;
        };
        memos.push(Memo {
            file_name: memo.file_name.clone(),
            title: doc.text(heading)?,
            content: render_all(&doc, &part.members)?,
        });
    }
    Ok(memos)
}

/// For every memo key, the keys of the memos that mention it.
///
/// A memo mentioning its own key is not reported.
pub fn find_links(memos: &[Memo]) -> BTreeMap<String, Vec<String>> {
    let mut links: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for target in memos {
        let key = target.key();
        for source in memos {
            if source.key() != key && source.content.contains(&key) {
                links.entry(key.clone()).or_default().push(source.key());
            }
        }
    }
    links
}

/// `source  ->  target` lines, sorted by target.
pub fn format_links(links: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    links
        .iter()
        .flat_map(|(target, sources)| {
            sources
                .iter()
                .map(move |source| format!("{}  ->  {}", source, target))
        })
        .collect()
}
