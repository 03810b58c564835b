//! Settings for the memo journal
//!
//! This module defines the configuration persisted as `config.toml`: where
//! the journal lives, how far back memo inheritance looks, and the headings
//! every generated document is built from.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::markdown::HeadingRef;

// ─────────────────────────────────────────────────────────────────────────────
// Layout Constants
// ─────────────────────────────────────────────────────────────────────────────

const DAILYMEMO_DIR_NAME: &str = "dailymemo";
const TIPS_DIR_NAME: &str = "tips";
const TEMPLATE_FILE_NAME: &str = "template.md";
const TIPS_INDEX_FILE_NAME: &str = "index.md";
const WEEKLY_REPORT_FILE_NAME: &str = "weekly_report.md";

/// Journal directory name under the platform config directory.
pub const DEFAULT_BASE_DIR_NAME: &str = "memo";

// ─────────────────────────────────────────────────────────────────────────────
// Heading Table
// ─────────────────────────────────────────────────────────────────────────────

/// The headings generated documents are built from and searched by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingTable {
    /// Daily memo title, the date goes under it
    pub title: HeadingRef,
    /// Where the picked tip link goes
    pub todays_tip: HeadingRef,
    /// Inherited from the previous memo
    pub todos: HeadingRef,
    /// Inherited from the previous memo
    pub wanttodos: HeadingRef,
    /// Free-form memos, one level-3 heading each
    pub memos: HeadingRef,
    pub weekly_report: HeadingRef,
    pub tips_index: HeadingRef,
}

impl Default for HeadingTable {
    fn default() -> Self {
        Self {
            title: HeadingRef::new(1, "daily memo"),
            todays_tip: HeadingRef::new(2, "today's tip"),
            todos: HeadingRef::new(2, "todos"),
            wanttodos: HeadingRef::new(2, "wanttodos"),
            memos: HeadingRef::new(2, "memos"),
            weekly_report: HeadingRef::new(1, "Weekly Report"),
            tips_index: HeadingRef::new(1, "Tips Index"),
        }
    }
}

impl HeadingTable {
    fn all_mut(&mut self) -> [&mut HeadingRef; 7] {
        [
            &mut self.title,
            &mut self.todays_tip,
            &mut self.todos,
            &mut self.wanttodos,
            &mut self.memos,
            &mut self.weekly_report,
            &mut self.tips_index,
        ]
    }

    fn sanitize(&mut self) {
        for heading in self.all_mut() {
            heading.level = heading
                .level
                .clamp(Settings::MIN_HEADING_LEVEL, Settings::MAX_HEADING_LEVEL);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User configuration.
///
/// All fields have defaults via the `Default` trait and `#[serde(default)]`,
/// so a partial `config.toml` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the journal; holds `dailymemo/` and `tips/`
    pub base_dir: PathBuf,

    /// How many days back to look for a memo to inherit sections from
    pub days_to_seek: u32,

    pub headings: HeadingTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            days_to_seek: Self::DEFAULT_DAYS_TO_SEEK,
            headings: HeadingTable::default(),
        }
    }
}

/// `{config_dir}/memo`, or a relative `memo` when the platform has no config
/// directory.
pub fn default_base_dir() -> PathBuf {
    dirs::config_dir()
        .map(|base| base.join(DEFAULT_BASE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR_NAME))
}

impl Settings {
    pub const DEFAULT_DAYS_TO_SEEK: u32 = 10;
    pub const MIN_DAYS_TO_SEEK: u32 = 1;
    pub const MAX_DAYS_TO_SEEK: u32 = 365;
    pub const MIN_HEADING_LEVEL: u8 = 1;
    pub const MAX_HEADING_LEVEL: u8 = 6;

    /// Settings rooted at `base_dir`, defaults elsewhere.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Clamp values to valid ranges.
    ///
    /// Applied after loading settings from a file that might have been
    /// edited by hand.
    pub fn sanitize(&mut self) {
        self.days_to_seek = self
            .days_to_seek
            .clamp(Self::MIN_DAYS_TO_SEEK, Self::MAX_DAYS_TO_SEEK);
        self.headings.sanitize();
    }

    /// Deserialize from TOML, then sanitize.
    pub fn from_toml_sanitized(text: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Self = toml::from_str(text)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Point `base_dir` at `dir` when it names an existing directory.
    ///
    /// Returns whether the override was applied.
    pub fn apply_base_dir_override(&mut self, dir: Option<&Path>) -> bool {
        match dir {
            Some(dir) if dir.is_dir() => {
                self.base_dir = dir.to_path_buf();
                true
            }
            _ => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Journal Layout
    // ─────────────────────────────────────────────────────────────────────────

    /// `{base}/dailymemo`
    pub fn dailymemo_dir(&self) -> PathBuf {
        self.base_dir.join(DAILYMEMO_DIR_NAME)
    }

    /// `{base}/dailymemo/template.md`
    pub fn dailymemo_template_file(&self) -> PathBuf {
        self.dailymemo_dir().join(TEMPLATE_FILE_NAME)
    }

    /// `{base}/dailymemo/weekly_report.md`
    pub fn weekly_report_file(&self) -> PathBuf {
        self.dailymemo_dir().join(WEEKLY_REPORT_FILE_NAME)
    }

    /// `{base}/tips`
    pub fn tips_dir(&self) -> PathBuf {
        self.base_dir.join(TIPS_DIR_NAME)
    }

    /// `{base}/tips/template.md`
    pub fn tips_template_file(&self) -> PathBuf {
        self.tips_dir().join(TEMPLATE_FILE_NAME)
    }

    /// `{base}/tips/index.md`
    pub fn tips_index_file(&self) -> PathBuf {
        self.tips_dir().join(TIPS_INDEX_FILE_NAME)
    }

    /// Rewrite a tips-relative link destination so it resolves from a memo
    /// in the dailymemo directory.
    pub fn tip_destination_from_dailymemo(&self, destination: &str) -> String {
        format!("../{}/{}", TIPS_DIR_NAME, destination)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.days_to_seek, 10);
        assert!(settings.base_dir.ends_with(DEFAULT_BASE_DIR_NAME));
        assert_eq!(settings.headings.title, HeadingRef::new(1, "daily memo"));
        assert_eq!(settings.headings.todays_tip, HeadingRef::new(2, "today's tip"));
        assert_eq!(settings.headings.tips_index, HeadingRef::new(1, "Tips Index"));
    }

    #[test]
    fn test_layout_paths() {
        let settings = Settings::with_base_dir("/journal");
        assert_eq!(settings.dailymemo_dir(), PathBuf::from("/journal/dailymemo"));
        assert_eq!(
            settings.dailymemo_template_file(),
            PathBuf::from("/journal/dailymemo/template.md")
        );
        assert_eq!(
            settings.weekly_report_file(),
            PathBuf::from("/journal/dailymemo/weekly_report.md")
        );
        assert_eq!(settings.tips_index_file(), PathBuf::from("/journal/tips/index.md"));
        assert_eq!(
            settings.tips_template_file(),
            PathBuf::from("/journal/tips/template.md")
        );
    }

    #[test]
    fn test_tip_destination_from_dailymemo() {
        let settings = Settings::with_base_dir("/journal");
        let destination = settings.tip_destination_from_dailymemo("sushi.md#how-to-eat");
        assert_eq!(destination, "../tips/sushi.md#how-to-eat");

        let (file, _) = destination.split_once('#').unwrap();
        let resolved = settings.dailymemo_dir().join(file);
        assert!(resolved.starts_with("/journal/dailymemo/.."));
        assert!(resolved.ends_with("tips/sushi.md"));
    }

    #[test]
    fn test_sanitize_clamps_days_to_seek() {
        let mut settings = Settings {
            days_to_seek: 0,
            ..Settings::default()
        };
        settings.sanitize();
        assert_eq!(settings.days_to_seek, Settings::MIN_DAYS_TO_SEEK);

        settings.days_to_seek = 10_000;
        settings.sanitize();
        assert_eq!(settings.days_to_seek, Settings::MAX_DAYS_TO_SEEK);
    }

    #[test]
    fn test_sanitize_clamps_heading_levels() {
        let mut settings = Settings::default();
        settings.headings.todos.level = 9;
        settings.headings.title.level = 0;
        settings.sanitize();
        assert_eq!(settings.headings.todos.level, 6);
        assert_eq!(settings.headings.title.level, 1);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = Settings::from_toml_sanitized("days_to_seek = 3\n").unwrap();
        assert_eq!(settings.days_to_seek, 3);
        assert_eq!(settings.headings, HeadingTable::default());
    }

    #[test]
    fn test_toml_heading_override() {
        let text = r#"
base_dir = "/journal"

[headings.todos]
level = 2
text = "やること"
"#;
        let settings = Settings::from_toml_sanitized(text).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/journal"));
        assert_eq!(settings.headings.todos, HeadingRef::new(2, "やること"));
        assert_eq!(settings.headings.memos, HeadingRef::new(2, "memos"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut original = Settings::with_base_dir("/journal");
        original.days_to_seek = 30;
        original.headings.memos = HeadingRef::new(2, "notes");

        let text = toml::to_string_pretty(&original).unwrap();
        let loaded = Settings::from_toml_sanitized(&text).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Settings::from_toml_sanitized("days_to_seek = \"many\"").is_err());
    }

    #[test]
    fn test_base_dir_override_requires_existing_dir() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::with_base_dir("/journal");

        assert!(!settings.apply_base_dir_override(Some(temp.path().join("missing").as_path())));
        assert_eq!(settings.base_dir, PathBuf::from("/journal"));

        assert!(settings.apply_base_dir_override(Some(temp.path())));
        assert_eq!(settings.base_dir, temp.path().to_path_buf());

        assert!(!settings.apply_base_dir_override(None));
    }
}
