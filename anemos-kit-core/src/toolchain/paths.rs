//! Path management for the cached binary and generated declarations.
//!
//! The downloaded binary lives directly in the cache directory:
//!
//! - Linux: `~/.local/share/anemos-kit/anemos`
//! - macOS: `~/Library/Application Support/anemos-kit/anemos`
//! - Windows: `C:\Users\<User>\AppData\Local\anemos-kit\anemos.exe`
//!
//! Declarations are generated inside the project's installed anemos package,
//! next to a `version.json` record of the binary version that produced them.

use std::path::{Path, PathBuf};

use super::types::Platform;
use crate::error::{Result, ToolchainError};

/// Subdirectory name under the per-user data folder.
const CACHE_DIR_NAME: &str = "anemos-kit";

/// Location of generated declarations relative to the project root.
pub const TYPES_RELATIVE_DIR: &str = "node_modules/@ohayocorp/anemos/types";

/// File name of the version record inside the declarations directory.
pub const VERSION_RECORD_FILE: &str = "version.json";

// ============================================================================
// Path Resolution
// ============================================================================

/// Returns the default cache directory.
///
/// Falls back to the OS temp folder when the platform reports no data dir.
pub fn default_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
}

/// Returns the deterministic location of a downloaded binary.
///
/// Path: `{cache_dir}/anemos` or `{cache_dir}/anemos.exe`
pub fn cached_binary_path(cache_dir: &Path, platform: Platform) -> PathBuf {
    cache_dir.join(platform.binary_name())
}

/// Returns the generated declarations directory for a project.
///
/// Path: `{project_root}/node_modules/@ohayocorp/anemos/types`
pub fn types_dir(project_root: &Path) -> PathBuf {
    project_root.join(TYPES_RELATIVE_DIR)
}

/// Returns the version record path for a declarations directory.
///
/// Path: `{types_dir}/version.json`
pub fn version_record_path(types_dir: &Path) -> PathBuf {
    types_dir.join(VERSION_RECORD_FILE)
}

/// Creates `dir` and any missing parents.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ToolchainError::io_at("create directory", dir, e))
}
