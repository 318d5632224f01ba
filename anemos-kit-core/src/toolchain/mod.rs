//! Anemos binary management.
//!
//! This module finds or downloads the `anemos` binary and keeps the type
//! declarations it generates in sync with its version.
//!
//! # Architecture
//!
//! - `types`: Platform target and tool location
//! - `paths`: Cache and declarations path resolution
//! - `release`: Release asset URLs
//! - `downloader`: Streaming download with bounded redirects
//! - `invoke`: Process invocation contract (`--help`, `--version`, `declarations`, `build`)
//! - `resolver`: Search path, cache, then download
//! - `version_record`: JSON persistence of the last generated version
//! - `sync`: Regenerates declarations when the version changes
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use anemos_kit_core::toolchain::{DeclarationSync, ProcessRunner, Resolver};
//! use anemos_kit_core::Settings;
//!
//! let settings = Settings::load();
//! let resolver = Arc::new(Resolver::from_settings(&settings, Arc::new(ProcessRunner::new()), prompt)?);
//!
//! let location = resolver.locate().await?;
//! println!("anemos at {}", location);
//!
//! let sync = DeclarationSync::for_project(resolver, notifier, &project_root);
//! sync.ensure_up_to_date().await?;
//! ```

pub mod downloader;
pub mod invoke;
pub mod paths;
pub mod release;
pub mod resolver;
pub mod sync;
pub mod types;
pub mod version_record;

// Re-export commonly used types
pub use downloader::{DownloadProgress, Downloader, DEFAULT_MAX_REDIRECTS};
pub use invoke::{ProcessRunner, ToolRunner};
pub use release::ReleaseSource;
pub use resolver::{ConsentPrompt, DownloadRequest, Resolver};
pub use sync::{needs_update, DeclarationSync, DownstreamNotifier, SyncOutcome, UNVERSIONED};
pub use types::{ArchId, OsId, Platform, ToolLocation};
pub use version_record::VersionRecord;
