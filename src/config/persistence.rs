//! Configuration file persistence for memo
//!
//! This module handles loading and saving `config.toml` in the
//! platform-specific config directory, with graceful fallback to defaults.

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used for the config directory
const APP_NAME: &str = "memo";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Backup configuration file name (used during atomic writes)
const CONFIG_BACKUP_NAME: &str = "config.toml.bak";

/// Environment variable that points the journal at another existing directory
pub const BASE_DIR_ENV: &str = "MEMO_BASE_DIR";

// ─────────────────────────────────────────────────────────────────────────────
// Platform-Specific Directory Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Get the platform-specific configuration directory for the application.
///
/// - **Windows**: `%APPDATA%\memo\`
/// - **macOS**: `~/Library/Application Support/memo/`
/// - **Linux**: `~/.config/memo/`
///
/// # Errors
///
/// Returns `Error::ConfigDirNotFound` if the config directory cannot be determined
/// (e.g., if the HOME environment variable is not set).
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the configuration file.
///
/// # Errors
///
/// Returns `Error::ConfigDirNotFound` if the config directory cannot be determined.
pub fn get_config_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

// ─────────────────────────────────────────────────────────────────────────────
// Load Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Load configuration from the default config file location.
///
/// # Behavior
///
/// 1. If the config file exists and is valid TOML, load and sanitize it
/// 2. If the config file doesn't exist or is empty, use default settings
/// 3. If the config file is corrupted, log a warning and use defaults
/// 4. If `MEMO_BASE_DIR` names an existing directory, it replaces `base_dir`
pub fn load_config() -> Settings {
    let mut settings = get_config_file_path()
        .and_then(|path| load_config_from(&path))
        .unwrap_or_warn_default(Settings::default(), "Failed to load configuration");

    let override_dir = std::env::var_os(BASE_DIR_ENV).map(PathBuf::from);
    if settings.apply_base_dir_override(override_dir.as_deref()) {
        debug!(
            "Using base directory from {}: {}",
            BASE_DIR_ENV,
            settings.base_dir.display()
        );
    }
    settings
}

/// Load and sanitize settings from `config_path`.
///
/// # Errors
///
/// - `Error::ConfigLoad`: the file exists but cannot be read
/// - `Error::ConfigParse`: the file is not valid TOML for [`Settings`]
pub fn load_config_from(config_path: &Path) -> Result<Settings> {
    if !config_path.exists() {
        debug!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        return Ok(Settings::default());
    }

    debug!("Loading config from: {}", config_path.display());

    let contents = fs::read_to_string(config_path).map_err(|e| Error::ConfigLoad {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;

    if contents.trim().is_empty() {
        debug!("Config file is empty, using defaults");
        return Ok(Settings::default());
    }

    let settings = Settings::from_toml_sanitized(&contents).map_err(|e| {
        warn!(
            "Config file at {} contains invalid TOML: {}",
            config_path.display(),
            e
        );
        Error::ConfigParse {
            message: format!("Failed to parse config file: {}", e),
            source: Some(Box::new(e)),
        }
    })?;

    info!(
        "Configuration loaded successfully from {}",
        config_path.display()
    );
    Ok(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Save Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Save configuration to `config_path`.
///
/// This performs an atomic write by writing a backup file next to the
/// target and renaming it over the original.
pub fn save_config_to(settings: &Settings, config_path: &Path) -> Result<()> {
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or(Error::ConfigDirNotFound)?;
    let backup_path = config_dir.join(CONFIG_BACKUP_NAME);

    if !config_dir.exists() {
        debug!("Creating config directory: {}", config_dir.display());
        fs::create_dir_all(&config_dir).map_err(|e| Error::ConfigSave {
            path: config_dir.clone(),
            source: Box::new(e),
        })?;
    }

    debug!("Saving config to: {}", config_path.display());

    let text = toml::to_string_pretty(settings).map_err(|e| Error::ConfigSave {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;

    fs::write(&backup_path, &text).map_err(|e| Error::ConfigSave {
        path: backup_path.clone(),
        source: Box::new(e),
    })?;

    fs::rename(&backup_path, config_path).map_err(|e| Error::ConfigSave {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;

    info!(
        "Configuration saved successfully to {}",
        config_path.display()
    );
    Ok(())
}

/// Write the default configuration file when none exists yet, so there is
/// something to edit.
///
/// Returns `true` if a file was created.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = get_config_file_path()?;
    if config_path.exists() {
        return Ok(false);
    }
    save_config_to(&Settings::default(), &config_path)?;
    Ok(true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::HeadingRef;
    use tempfile::TempDir;

    /// Helper to create a test environment with a temporary config directory.
    struct TestEnv {
        _temp_dir: TempDir,
        config_file: PathBuf,
    }

    impl TestEnv {
        fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let config_file = temp_dir.path().join(APP_NAME).join(CONFIG_FILE_NAME);
            Self {
                _temp_dir: temp_dir,
                config_file,
            }
        }

        fn write_config(&self, content: &str) {
            fs::create_dir_all(self.config_file.parent().unwrap()).unwrap();
            fs::write(&self.config_file, content).expect("Failed to write config");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Platform directory tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_get_config_file_path() {
        if let Ok(path) = get_config_file_path() {
            assert!(path.ends_with(Path::new(APP_NAME).join(CONFIG_FILE_NAME)));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Load tests with temp directory
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let env = TestEnv::new();
        let settings = load_config_from(&env.config_file).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let env = TestEnv::new();
        env.write_config("  \n");
        let settings = load_config_from(&env.config_file).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_valid_config() {
        let env = TestEnv::new();
        env.write_config("base_dir = \"/journal\"\ndays_to_seek = 5\n");
        let settings = load_config_from(&env.config_file).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/journal"));
        assert_eq!(settings.days_to_seek, 5);
    }

    #[test]
    fn test_load_config_sanitizes_values() {
        let env = TestEnv::new();
        env.write_config("days_to_seek = 0\n");
        let settings = load_config_from(&env.config_file).unwrap();
        assert_eq!(settings.days_to_seek, Settings::MIN_DAYS_TO_SEEK);
    }

    #[test]
    fn test_load_corrupted_config_returns_error() {
        let env = TestEnv::new();
        env.write_config("days_to_seek = [");
        let err = load_config_from(&env.config_file).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_corrupted_config_degrades_to_default() {
        let env = TestEnv::new();
        env.write_config("{ not toml }");
        let settings = load_config_from(&env.config_file)
            .unwrap_or_warn_default(Settings::default(), "Failed to load configuration");
        assert_eq!(settings, Settings::default());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Save tests with temp directory
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_save_creates_directory_and_file() {
        let env = TestEnv::new();
        save_config_to(&Settings::with_base_dir("/journal"), &env.config_file).unwrap();
        assert!(env.config_file.exists());
        assert!(!env
            .config_file
            .with_file_name(CONFIG_BACKUP_NAME)
            .exists());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let env = TestEnv::new();
        let mut original = Settings::with_base_dir("/journal");
        original.days_to_seek = 42;
        original.headings.wanttodos = HeadingRef::new(3, "someday");

        save_config_to(&original, &env.config_file).unwrap();
        let loaded = load_config_from(&env.config_file).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_save_overwrites_existing() {
        let env = TestEnv::new();
        save_config_to(&Settings::with_base_dir("/one"), &env.config_file).unwrap();
        save_config_to(&Settings::with_base_dir("/two"), &env.config_file).unwrap();
        let loaded = load_config_from(&env.config_file).unwrap();
        assert_eq!(loaded.base_dir, PathBuf::from("/two"));
    }
}
