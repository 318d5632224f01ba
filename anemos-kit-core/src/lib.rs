//! Anemos Kit Core Library
//!
//! This crate manages the `anemos` command-line tool for a host application.
//! It includes:
//!
//! - Resolution of the binary from the search path, the cache, or a download
//! - Streaming downloads of platform-specific release assets
//! - Synchronization of generated type declarations with the binary version
//! - Settings persisted as JSON with environment overrides

pub mod config;
pub mod error;
pub mod toolchain;

// Re-exports for convenience
pub use config::Settings;
pub use error::{Result, ToolchainError};

// Re-export toolchain
pub use toolchain::{
    ConsentPrompt, DeclarationSync, DownloadRequest, DownstreamNotifier, Platform,
    ProcessRunner, Resolver, SyncOutcome, ToolLocation, ToolRunner, VersionRecord,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
