//! Configuration module for Anemos Kit.

pub mod settings;

pub use settings::{Settings, CACHE_DIR_ENV, RELEASE_VERSION_ENV};
