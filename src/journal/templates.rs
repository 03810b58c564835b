//! Heading-only templates new journal documents start from.

use crate::config::HeadingTable;
use crate::markdown::{build_heading, HeadingRef};

/// An ordered list of headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub headings: Vec<HeadingRef>,
}

impl Template {
    pub fn new(headings: Vec<HeadingRef>) -> Self {
        Self { headings }
    }

    /// Daily memo: title, today's tip, todos, wanttodos, memos.
    pub fn dailymemo(table: &HeadingTable) -> Self {
        Self::new(vec![
            table.title.clone(),
            table.todays_tip.clone(),
            table.todos.clone(),
            table.wanttodos.clone(),
            table.memos.clone(),
        ])
    }

    pub fn weekly_report(table: &HeadingTable) -> Self {
        Self::new(vec![table.weekly_report.clone()])
    }

    pub fn tips_index(table: &HeadingTable) -> Self {
        Self::new(vec![table.tips_index.clone()])
    }

    /// Sample tips file showing how categories and tips are laid out.
    pub fn tips_sample() -> Self {
        Self::new(vec![
            HeadingRef::new(1, "sushi (<- tip category)"),
            HeadingRef::new(2, "how to eat sushi (<- tip title in heading level 2)"),
            HeadingRef::new(2, "how to roll sushi (<- another tip)"),
        ])
    }

    /// Heading lines separated by one blank line, ending in `\n`.
    pub fn to_markdown(&self) -> String {
        self.headings
            .iter()
            .map(|heading| build_heading(heading.level, &heading.text) + "\n")
            .collect::<Vec<_>>()
            .join("\n")
    }
}
