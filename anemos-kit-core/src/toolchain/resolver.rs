//! Locating and acquiring the anemos binary.
//!
//! Sources are tried in order and the first hit wins:
//!
//! 1. the execution search path (`anemos --help` launches),
//! 2. a previously downloaded copy in the cache directory,
//! 3. a fresh download, if the user consents.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::downloader::{discard_partial, make_executable, Downloader};
use super::invoke::ToolRunner;
use super::paths;
use super::release::ReleaseSource;
use super::types::{Platform, ToolLocation};
use crate::config::Settings;
use crate::error::{Result, ToolchainError};

// ============================================================================
// Consent
// ============================================================================

/// What the resolver is about to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    pub platform: Platform,
}

/// Asks the user whether the binary may be downloaded.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn confirm_download(&self, request: &DownloadRequest) -> bool;
}

// ============================================================================
// Resolver
// ============================================================================

/// Finds a usable anemos binary, downloading one on demand.
///
/// Calls to [`Resolver::locate`] are serialized. A caller that waited on
/// another caller's download re-runs the probes and picks up the cached copy.
pub struct Resolver {
    runner: Arc<dyn ToolRunner>,
    prompt: Arc<dyn ConsentPrompt>,
    downloader: Downloader,
    cache_dir: PathBuf,
    platform: Platform,
    release: ReleaseSource,
    lock: Mutex<()>,
}

impl Resolver {
    /// Creates a resolver for the host platform.
    pub fn new(
        cache_dir: PathBuf,
        release: ReleaseSource,
        downloader: Downloader,
        runner: Arc<dyn ToolRunner>,
        prompt: Arc<dyn ConsentPrompt>,
    ) -> Self {
        Self {
            runner,
            prompt,
            downloader,
            cache_dir,
            platform: Platform::current(),
            release,
            lock: Mutex::new(()),
        }
    }

    /// Creates a resolver from loaded settings.
    pub fn from_settings(
        settings: &Settings,
        runner: Arc<dyn ToolRunner>,
        prompt: Arc<dyn ConsentPrompt>,
    ) -> Result<Self> {
        let downloader = Downloader::new(settings.max_redirects)?;
        Ok(Self::new(
            settings.cache_dir(),
            settings.release.clone(),
            downloader,
            runner,
            prompt,
        ))
    }

    /// Overrides the detected platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// The runner used for probing, shared with callers that invoke the binary.
    pub fn runner(&self) -> &Arc<dyn ToolRunner> {
        &self.runner
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where a downloaded binary is (or would be) stored.
    pub fn cached_binary(&self) -> PathBuf {
        paths::cached_binary_path(&self.cache_dir, self.platform)
    }

    /// Release asset URL for this platform.
    pub fn download_url(&self) -> String {
        self.release.download_url(self.platform)
    }

    /// Returns a location from which the binary can be launched.
    ///
    /// # Errors
    ///
    /// - `AcquisitionDeclined` if the binary had to be downloaded and the user said no.
    /// - `BinaryUnavailable` wrapping the download failure otherwise.
    pub async fn locate(&self) -> Result<ToolLocation> {
        let _guard = self.lock.lock().await;

        if let Some(location) = self.find_existing().await {
            return Ok(location);
        }

        self.acquire().await
    }

    /// Checks the search path, then the cache. No network access.
    async fn find_existing(&self) -> Option<ToolLocation> {
        let name = self.platform.binary_name();
        if self.runner.probe(OsStr::new(name)).await {
            debug!("Found {} on the search path", name);
            return Some(ToolLocation::SearchPath(name.to_string()));
        }

        // Only this resolver writes the cache, so presence is trusted.
        let cached = self.cached_binary();
        match tokio::fs::try_exists(&cached).await {
            Ok(true) => {
                debug!("Using cached binary at {}", cached.display());
                return Some(ToolLocation::Path(cached));
            }
            Ok(false) => {}
            Err(e) => debug!("Could not check cached binary at {}: {}", cached.display(), e),
        }

        None
    }

    async fn acquire(&self) -> Result<ToolLocation> {
        let request = DownloadRequest {
            url: self.download_url(),
            destination: self.cached_binary(),
            platform: self.platform,
        };

        if !self.prompt.confirm_download(&request).await {
            info!("Download of {} declined", request.url);
            return Err(ToolchainError::AcquisitionDeclined);
        }

        self.download(&request)
            .await
            .map_err(|source| ToolchainError::BinaryUnavailable {
                url: request.url.clone(),
                source: Box::new(source),
            })?;

        info!(
            "anemos for {} installed at {}",
            self.platform,
            request.destination.display()
        );
        Ok(ToolLocation::Path(request.destination))
    }

    async fn download(&self, request: &DownloadRequest) -> Result<()> {
        paths::ensure_dir(&self.cache_dir).await?;

        self.downloader
            .fetch(&request.url, &request.destination, |progress| {
                if let Some(percent) = progress.percent {
                    debug!("anemos download progress: {:.1}%", percent);
                }
            })
            .await?;

        if !self.platform.is_windows_family() {
            if let Err(e) = make_executable(&request.destination) {
                discard_partial(&request.destination).await;
                return Err(e);
            }
        }

        Ok(())
    }
}
