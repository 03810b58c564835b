//! Daily memo files on disk
//!
//! Memos live flat in `{base}/dailymemo/` and are named after their date,
//! `YYYY-MM-DD-Www.md`. Sorting by file name is chronological.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use regex::Regex;

use super::read_file;
use crate::error::{Error, Result};

/// `chrono` layout of a memo file stem, e.g. `2024-03-08-Fri`.
pub const DATE_LAYOUT: &str = "%Y-%m-%d-%a";

const FILE_NAME_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}-\S{3}\.md$";

/// A memo file and its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyMemo {
    pub path: PathBuf,
    pub file_name: String,
    pub date: NaiveDate,
    pub content: Vec<u8>,
}

impl DailyMemo {
    /// ISO year and week number.
    pub fn iso_week(&self) -> (i32, u32) {
        let week = self.date.iso_week();
        (week.year(), week.week())
    }
}

/// `2024-03-08-Fri.md`
pub fn file_name_for(date: NaiveDate) -> String {
    format!("{}.md", date.format(DATE_LAYOUT))
}

/// Parse the date out of a memo file name.
pub fn parse_file_name(file_name: &str) -> Result<NaiveDate> {
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
    NaiveDate::parse_from_str(stem, DATE_LAYOUT).map_err(|source| Error::InvalidDate {
        value: file_name.to_string(),
        source,
    })
}

/// The `dailymemo` directory.
#[derive(Debug, Clone)]
pub struct DailyMemoRepo {
    dir: PathBuf,
    pattern: Regex,
}

impl DailyMemoRepo {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let pattern = Regex::new(FILE_NAME_PATTERN)
            .map_err(|e| Error::Application(format!("Invalid memo file pattern: {}", e)))?;
        Ok(Self {
            dir: dir.into(),
            pattern,
        })
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(file_name_for(date))
    }

    /// Whether `file_name` looks like a memo file.
    pub fn is_memo_file_name(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }

    /// Load the memo at `path`.
    pub fn entry(&self, path: &Path) -> Result<DailyMemo> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let date = parse_file_name(&file_name)?;
        Ok(DailyMemo {
            path: path.to_path_buf(),
            file_name,
            date,
            content: read_file(path)?,
        })
    }

    /// Every memo in the directory, sorted by file name.
    ///
    /// Names that match the pattern but carry no valid date are skipped.
    pub fn entries(&self) -> Result<Vec<DailyMemo>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|source| Error::FileRead {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = read_dir
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .filter(|entry| self.is_memo_file_name(&entry.file_name().to_string_lossy()))
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        let mut memos = Vec::with_capacity(paths.len());
        for path in paths {
            match self.entry(&path) {
                Ok(memo) => memos.push(memo),
                Err(Error::InvalidDate { value, .. }) => {
                    debug!("Skipping '{}': not a memo date", value);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(memos)
    }

    /// The memo written for `date`, if any.
    pub fn find_by_date(&self, date: NaiveDate) -> Result<Option<DailyMemo>> {
        let path = self.path_for(date);
        if !path.is_file() {
            return Ok(None);
        }
        self.entry(&path).map(Some)
    }

    /// The closest memo among the `days` days before `date`.
    pub fn latest_before(&self, date: NaiveDate, days: u32) -> Result<Option<DailyMemo>> {
        for back in 1..=i64::from(days) {
            let Some(day) = date.checked_sub_signed(Duration::days(back)) else {
                break;
            };
            if let Some(memo) = self.find_by_date(day)? {
                return Ok(Some(memo));
            }
        }
        Ok(None)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
