//! Weekly report: an ordered list of every memo heading, grouped by ISO week.

use crate::error::Result;
use crate::markdown::{
    build_heading, build_link, build_ordered_list, section_members, slug, Document, HeadingRef,
};

use super::dailymemo::DailyMemo;

fn week_splitter(year: i32, week: u32) -> String {
    format!("{}\n\n", build_heading(2, &format!("{} | Week {}", year, week)))
}

/// Report body for `memos`, which must be in chronological order.
///
/// A `## YYYY | Week W` heading opens every new ISO week. Each memo gets a
/// `### file name` heading followed by links to the headings inside its
/// `memos_heading` section.
pub fn build_weekly_report(memos: &[DailyMemo], memos_heading: &HeadingRef) -> Result<String> {
    let mut out = String::new();
    let mut current_week = None;

    for memo in memos {
        let week = memo.iso_week();
        if current_week != Some(week) {
            out.push_str(&week_splitter(week.0, week.1));
            current_week = Some(week);
        }
        out.push_str(&build_heading(3, &memo.file_name));
        out.push_str("\n\n");

        let doc = Document::from_bytes(&memo.content)?;
        let section = section_members(&doc, memos_heading);
        let mut order = 0;
        for &id in &section.members {
            let Some(level) = doc.kind(id).heading_level() else {
                continue;
            };
            order += 1;
            let title = doc.text(id)?;
            let label = build_heading(level.saturating_sub(2), &title);
            let destination = format!("{}#{}", memo.file_name, slug(&title));
            out.push_str(&build_ordered_list(order, &build_link(&label, &destination)));
            out.push('\n');
        }
        if order > 0 {
            out.push('\n');
        }
    }
    Ok(out)
}
