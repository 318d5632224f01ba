//! Error types for locating, acquiring and invoking the anemos binary.

use std::path::Path;

use thiserror::Error;

/// Result alias used across the toolchain modules.
pub type Result<T> = std::result::Result<T, ToolchainError>;

/// Errors surfaced by the resolver, downloader and declaration synchronizer.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// No usable binary: not on the search path, not cached, and the
    /// download from `url` failed. `source` holds the download error.
    #[error("anemos binary unavailable: download from {url} failed: {source}")]
    BinaryUnavailable {
        url: String,
        #[source]
        source: Box<ToolchainError>,
    },

    /// The user declined to download the binary.
    #[error("anemos binary unavailable: download was declined")]
    AcquisitionDeclined,

    /// The release endpoint answered with a non-success status.
    #[error("Download failed with status {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown error"))]
    DownloadFailed { status: reqwest::StatusCode },

    /// The release endpoint kept redirecting.
    #[error("Download exceeded {limit} redirects")]
    TooManyRedirects { limit: u8 },

    /// The URL or a redirect target could not be parsed.
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure talking to the release endpoint.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The binary ran but reported failure.
    #[error("`{command}` failed: {exit}")]
    ToolInvocationFailed { command: String, exit: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolchainError {
    /// Builds an I/O error annotated with the path it concerns.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Builds an I/O error for an operation on `path`.
    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("Failed to {} {}", action, path.display()), source)
    }

    /// True for `BinaryUnavailable` and its `AcquisitionDeclined` subtype.
    pub fn is_binary_unavailable(&self) -> bool {
        matches!(
            self,
            Self::BinaryUnavailable { .. } | Self::AcquisitionDeclined
        )
    }

    /// Unwraps `BinaryUnavailable` layers down to the error that caused them.
    pub fn root_cause(&self) -> &ToolchainError {
        match self {
            Self::BinaryUnavailable { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
