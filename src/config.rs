use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::activity::DEFAULT_WEB_BASE;
use crate::error::ActivityError;
use crate::github::{DEFAULT_API_BASE, DEFAULT_PAGE_SIZE, DEFAULT_USER_AGENT};

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/gh-activity/`
/// - Linux: `~/.config/gh-activity/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/gh-activity/`
///
/// Falls back to `~/.gh-activity/` if platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("gh-activity"))
        .unwrap_or_else(legacy_dotdir)
}

fn legacy_dotdir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gh-activity")
}

/// Load a JSON config file, returning Default if missing or corrupt.
/// Corrupt files are logged instead of silently resetting state.
pub fn load_json_config<T: DeserializeOwned + Default>(dir: &Path, filename: &str) -> T {
    let path = dir.join(filename);
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not read config {}: {e}", path.display());
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Corrupt config {}: {e}. Using defaults.", path.display());
            T::default()
        }
    }
}

/// Save a JSON config file atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub fn save_json_config<T: Serialize>(dir: &Path, filename: &str, config: &T) -> Result<(), ActivityError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ActivityError::Config(format!("Failed to create config directory: {e}")))?;

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ActivityError::Config(format!("Failed to serialize config: {e}")))?;

    let target = dir.join(filename);
    let temp = dir.join(format!("{}.tmp.{}", filename, std::process::id()));

    std::fs::write(&temp, &json)
        .map_err(|e| ActivityError::Config(format!("Failed to write temp config: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| ActivityError::Config(format!("Failed to set config permissions: {e}")))?;
    }

    // Either the old file or the new one exists, never a partial write
    std::fs::rename(&temp, &target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        ActivityError::Config(format!("Failed to commit config: {e}"))
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// AppConfig: endpoints, paging and timings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// How long the load-more control shows its error before re-enabling.
    #[serde(default = "default_load_more_retry_ms")]
    pub load_more_retry_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            web_base_url: default_web_base_url(),
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            load_more_retry_ms: default_load_more_retry_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_base_url() -> String { DEFAULT_API_BASE.to_string() }
fn default_web_base_url() -> String { DEFAULT_WEB_BASE.to_string() }
fn default_page_size() -> u32 { DEFAULT_PAGE_SIZE }
fn default_search_debounce_ms() -> u64 { 300 }
fn default_load_more_retry_ms() -> u64 { 2_000 }
fn default_user_agent() -> String { DEFAULT_USER_AGENT.to_string() }

// ---------------------------------------------------------------------------
// Theme preference: the single "theme" key in prefs.json
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme \"{other}\" (expected light or dark)")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemePreference {
    #[serde(default)]
    pub theme: Theme,
}

const APP_CONFIG_FILE: &str = "config.json";
const PREFS_FILE: &str = "prefs.json";

/// Config and preference files rooted at one directory.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_app_config(&self) -> AppConfig {
        load_json_config(&self.dir, APP_CONFIG_FILE)
    }

    /// Read once at startup. Missing or unreadable → light.
    pub fn load_theme(&self) -> Theme {
        load_json_config::<ThemePreference>(&self.dir, PREFS_FILE).theme
    }

    /// Written on every toggle.
    pub fn save_theme(&self, theme: Theme) -> Result<(), ActivityError> {
        save_json_config(&self.dir, PREFS_FILE, &ThemePreference { theme })
    }
}
