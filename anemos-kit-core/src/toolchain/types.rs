//! Core types for the anemos toolchain.
//!
//! This module defines the platform target used to pick a release asset and
//! the location type handed back by the resolver.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Base name of the external binary.
pub const BINARY_STEM: &str = "anemos";

// ============================================================================
// Platform Detection
// ============================================================================

/// Operating system token used in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsId {
    Windows,
    Darwin,
    Linux,
}

impl OsId {
    /// Maps a `std::env::consts::OS` style name. Unknown systems map to Linux.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "windows" | "win32" => Self::Windows,
            "macos" | "darwin" => Self::Darwin,
            _ => Self::Linux,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Darwin => "darwin",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for OsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CPU architecture token used in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchId {
    Amd64,
    Arm64,
}

impl ArchId {
    /// Maps a `std::env::consts::ARCH` style name. Anything unrecognized is amd64.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "aarch64" | "arm64" => Self::Arm64,
            _ => Self::Amd64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for ArchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The {OS, architecture} pair a release asset is chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: OsId,
    pub arch: ArchId,
}

impl Platform {
    pub fn new(os: OsId, arch: ArchId) -> Self {
        Self { os, arch }
    }

    /// Builds a platform from raw OS and architecture names.
    pub fn from_parts(os: &str, arch: &str) -> Self {
        Self::new(OsId::from_name(os), ArchId::from_name(arch))
    }

    /// The host platform, detected once per process.
    pub fn current() -> Self {
        static CURRENT: OnceLock<Platform> = OnceLock::new();
        *CURRENT.get_or_init(|| {
            Platform::from_parts(std::env::consts::OS, std::env::consts::ARCH)
        })
    }

    /// Execute permission bits are meaningless on Windows.
    pub fn is_windows_family(&self) -> bool {
        self.os == OsId::Windows
    }

    /// File name of the binary on this platform.
    pub fn binary_name(&self) -> &'static str {
        if self.is_windows_family() {
            "anemos.exe"
        } else {
            BINARY_STEM
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

// ============================================================================
// Tool Location
// ============================================================================

/// Where the resolver found a usable binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolLocation {
    /// A bare command name the execution search path resolves.
    SearchPath(String),
    /// An absolute path to the binary, usually inside the cache directory.
    Path(PathBuf),
}

impl ToolLocation {
    /// The program argument to hand to a process spawner.
    pub fn program(&self) -> &OsStr {
        match self {
            Self::SearchPath(name) => OsStr::new(name),
            Self::Path(path) => path.as_os_str(),
        }
    }

}

impl fmt::Display for ToolLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchPath(name) => write!(f, "{}", name),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
