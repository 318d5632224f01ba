//! Settings for Anemos Kit.
//!
//! Settings are persisted as JSON at `{config}/anemos-kit/settings.json`.
//! Environment variables override individual fields after loading.

use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::toolchain::downloader::DEFAULT_MAX_REDIRECTS;
use crate::toolchain::paths;
use crate::toolchain::release::ReleaseSource;

/// Overrides the cache directory.
pub const CACHE_DIR_ENV: &str = "ANEMOS_KIT_CACHE_DIR";

/// Overrides the release tag to download.
pub const RELEASE_VERSION_ENV: &str = "ANEMOS_KIT_RELEASE_VERSION";

const SETTINGS_DIR: &str = "anemos-kit";
const SETTINGS_FILE: &str = "settings.json";

// =============================================================================
// Settings
// =============================================================================

/// User settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the downloaded binary is kept. Defaults to the per-user data dir.
    pub cache_dir: Option<PathBuf>,

    /// Release the binary is downloaded from.
    pub release: ReleaseSource,

    /// Redirect hops followed during a download.
    pub max_redirects: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            release: ReleaseSource::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl Settings {
    /// Default settings file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Loads settings from the default location and applies env overrides.
    pub fn load() -> Self {
        let mut settings = match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key));
        settings
    }

    /// Loads settings from `path`.
    ///
    /// A missing file yields defaults. An unreadable or corrupted file is
    /// logged and also yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("Settings not found at {}, using defaults", path.display());
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read settings from {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Failed to parse settings at {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Applies environment overrides using a custom lookup function.
    pub fn apply_env_with<F>(&mut self, env_fn: F)
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        if let Ok(dir) = env_fn(CACHE_DIR_ENV) {
            if !dir.is_empty() {
                self.cache_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(version) = env_fn(RELEASE_VERSION_ENV) {
            if !version.is_empty() {
                self.release.version = version;
            }
        }
    }

    /// The effective cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(paths::default_cache_dir)
    }
}
