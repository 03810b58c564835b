//! Journal workflows
//!
//! This module ties the markdown engine to the files under the journal base
//! directory:
//! - Daily memos generated from a template, inheriting open sections from
//!   the most recent memo
//! - A tips index with one tip picked per memo
//! - A weekly report and cross-references built from the memos sections

mod dailymemo;
mod links;
mod templates;
mod tips;
mod weekly_report;

pub use dailymemo::{file_name_for, parse_file_name, DailyMemo, DailyMemoRepo, DATE_LAYOUT};
pub use links::{find_links, format_links, memos_from_dailymemo, Memo};
pub use templates::Template;
pub use tips::{
    checked_tips, collect_tip_nodes, pick_tip, render_entries, tips_from_index, Tip, TipEntry,
    TipNode,
};
pub use weekly_report::build_weekly_report;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use rand::{Rng, RngCore};

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use crate::markdown::{build_link, build_list, inherit_section, insert_text_after_heading};

// ─────────────────────────────────────────────────────────────────────────────
// File Helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to `path`, creating missing parent directories.
pub(crate) fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn write_if_missing(path: &Path, content: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_file(path, content)?;
    info!("Created {}", path.display());
    Ok(true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Journal
// ─────────────────────────────────────────────────────────────────────────────

/// The journal rooted at `settings.base_dir`.
#[derive(Debug, Clone)]
pub struct Journal {
    settings: Settings,
}

impl Journal {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dailymemo_repo(&self) -> Result<DailyMemoRepo> {
        DailyMemoRepo::new(self.settings.dailymemo_dir())
    }

    /// Create the journal directories and write any missing template files.
    pub fn initialize(&self) -> Result<()> {
        let headings = &self.settings.headings;

        for dir in [self.settings.dailymemo_dir(), self.settings.tips_dir()] {
            if !dir.is_dir() {
                fs::create_dir_all(&dir).map_err(|source| Error::FileWrite {
                    path: dir.clone(),
                    source,
                })?;
                info!("Created {}", dir.display());
            }
        }

        write_if_missing(
            &self.settings.dailymemo_template_file(),
            &Template::dailymemo(headings).to_markdown(),
        )?;
        write_if_missing(
            &self.settings.tips_template_file(),
            &Template::tips_sample().to_markdown(),
        )?;
        write_if_missing(
            &self.settings.tips_index_file(),
            &Template::tips_index(headings).to_markdown(),
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Daily Memo
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the daily memo for `date` and return its path.
    ///
    /// An existing memo is left alone unless `truncate` is set. A new memo
    /// starts from the daily memo template, gets the date under its title,
    /// inherits the todos and wanttodos sections from the latest memo within
    /// `days_to_seek` days, and links a tip picked from the tips index.
    pub fn generate_memo<R: Rng>(
        &self,
        date: NaiveDate,
        truncate: bool,
        rng: &mut R,
    ) -> Result<PathBuf> {
        let repo = self.dailymemo_repo()?;
        let path = repo.path_for(date);
        if path.exists() && !truncate {
            info!("{} already exists, leaving it untouched", path.display());
            return Ok(path);
        }

        let headings = &self.settings.headings;
        let template_file = self.settings.dailymemo_template_file();
        let template = if template_file.exists() {
            read_file(&template_file)?
        } else {
            debug!("No template at {}, using defaults", template_file.display());
            Template::dailymemo(headings).to_markdown().into_bytes()
        };

        let date_text = date.format(DATE_LAYOUT).to_string();
        let mut content = insert_text_after_heading(&template, &headings.title, &date_text)?;

        match repo.latest_before(date, self.settings.days_to_seek)? {
            Some(previous) => {
                debug!("Inheriting sections from {}", previous.file_name);
                content = inherit_section(&content, &previous.content, &headings.todos)?;
                content = inherit_section(&content, &previous.content, &headings.wanttodos)?;
            }
            None => debug!(
                "No memo within {} days before {}",
                self.settings.days_to_seek, date
            ),
        }

        if let Some(tip) = self.update_tips_index(Some(rng))? {
            let destination = self.settings.tip_destination_from_dailymemo(&tip.destination);
            let link = build_link(&tip.text, &destination);
            content =
                insert_text_after_heading(&content, &headings.todays_tip, &build_list(&link))?;
        }

        write_file(&path, &content)?;
        info!("Wrote {}", path.display());
        Ok(path)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Weekly Report
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the weekly report from every memo and return its path.
    pub fn weekly_report(&self) -> Result<PathBuf> {
        let memos = self.dailymemo_repo()?.entries()?;
        let headings = &self.settings.headings;
        let body = build_weekly_report(&memos, &headings.memos)?;

        let mut content = Template::weekly_report(headings).to_markdown();
        content.push('\n');
        content.push_str(&body);

        let path = self.settings.weekly_report_file();
        write_file(&path, content)?;
        info!("Wrote weekly report for {} memos to {}", memos.len(), path.display());
        Ok(path)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tips
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the tips index, keeping the checked state of shown tips.
    pub fn save_tips(&self) -> Result<()> {
        self.update_tips_index(None).map(|_| ())
    }

    /// Rebuild the tips index with one more tip picked and checked.
    pub fn pick_tip<R: Rng>(&self, rng: &mut R) -> Result<Option<Tip>> {
        self.update_tips_index(Some(rng))
    }

    fn update_tips_index(&self, rng: Option<&mut dyn RngCore>) -> Result<Option<Tip>> {
        let tips_dir = self.settings.tips_dir();
        if !tips_dir.is_dir() {
            debug!("No tips directory at {}", tips_dir.display());
            return Ok(None);
        }

        let index_file = self.settings.tips_index_file();
        let checked = if index_file.exists() {
            checked_tips(&index_file)
                .unwrap_or_warn_default(Vec::new(), "Failed to read tips index")
        } else {
            Vec::new()
        };

        let skip = [self.settings.tips_template_file(), index_file.clone()];
        let mut nodes = collect_tip_nodes(&tips_dir, &skip, &checked)?;
        if nodes.is_empty() {
            debug!("No tips found under {}", tips_dir.display());
            return Ok(None);
        }

        let picked = rng.and_then(|rng| pick_tip(&mut nodes, rng));
        if let Some(tip) = &picked {
            info!("Picked tip '{}'", tip.text);
        }

        let headings = &self.settings.headings;
        let template = Template::tips_index(headings).to_markdown();
        let content = insert_text_after_heading(
            template.as_bytes(),
            &headings.tips_index,
            &render_entries(&nodes),
        )?;
        write_file(&index_file, content)?;
        info!("Wrote tips index to {}", index_file.display());
        Ok(picked)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────

    /// For every memo key, the memos that mention it.
    pub fn links(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let memos_heading = &self.settings.headings.memos;
        let mut memos = Vec::new();
        for dailymemo in self.dailymemo_repo()?.entries()? {
            memos.extend(memos_from_dailymemo(&dailymemo, memos_heading)?);
        }
        Ok(find_links(&memos))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
