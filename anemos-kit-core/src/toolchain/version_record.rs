//! Version record persistence.
//!
//! The `version.json` file next to the generated declarations records which
//! anemos version produced them. Its absence, or a version that differs from
//! the active binary, is what triggers regeneration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, ToolchainError};

/// Marker of which binary version last generated the declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Output of `anemos --version` at generation time.
    pub version: String,
    /// When the declarations were generated.
    pub generated: DateTime<Utc>,
}

impl VersionRecord {
    /// Creates a record stamped with the current time.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            generated: Utc::now(),
        }
    }
}

// ============================================================================
// Record Persistence
// ============================================================================

/// Loads the record at `path`.
///
/// Returns `None` if the file doesn't exist. A corrupted record is logged and
/// also treated as missing, which forces regeneration.
pub async fn load(path: &Path) -> Result<Option<VersionRecord>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Version record not found at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(ToolchainError::io_at("read version record", path, e)),
    };

    match serde_json::from_str::<VersionRecord>(&content) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            warn!(
                "Failed to parse version record at {}: {}. Treating as missing.",
                path.display(),
                e
            );
            Ok(None)
        }
    }
}

/// Writes `record` to `path`.
///
/// The JSON goes to a sibling temporary file first and is renamed into place,
/// so a reader sees either the previous record or the new one.
pub async fn save(record: &VersionRecord, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ToolchainError::io_at("create directory", parent, e))?;
    }

    let content = serde_json::to_string_pretty(record)?;
    let staging = path.with_extension("json.tmp");

    tokio::fs::write(&staging, content)
        .await
        .map_err(|e| ToolchainError::io_at("write", &staging, e))?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(|e| ToolchainError::io_at("replace version record", path, e))?;

    debug!(version = %record.version, "Version record saved to {}", path.display());
    Ok(())
}

/// Deletes the record at `path`. A missing record is not an error.
pub async fn invalidate(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Invalidated version record at {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ToolchainError::io_at("remove version record", path, e)),
    }
}
