//! Async file downloader with redirect handling and progress reporting.
//!
//! Redirects are followed here rather than by reqwest so the depth can be
//! capped and every hop logged. The body is streamed straight into the
//! destination file; any failure removes whatever was written so the cache
//! never holds a truncated binary.

use futures::StreamExt;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, ToolchainError};

/// Redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: u8 = 5;

// ============================================================================
// Download Progress
// ============================================================================

/// Progress information during a download.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub bytes_downloaded: u64,
    /// Total bytes expected (if known from Content-Length header).
    pub total_bytes: Option<u64>,
    /// Progress percentage (0.0 to 100.0), or None if total is unknown.
    pub percent: Option<f32>,
}

impl DownloadProgress {
    fn new(bytes_downloaded: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes.map(|total| {
            if total > 0 {
                (bytes_downloaded as f32 / total as f32) * 100.0
            } else {
                0.0
            }
        });

        Self {
            bytes_downloaded,
            total_bytes,
            percent,
        }
    }
}

// ============================================================================
// Downloader
// ============================================================================

/// Fetches release assets into the cache directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    max_redirects: u8,
}

impl Downloader {
    /// Creates a downloader that follows at most `max_redirects` hops.
    pub fn new(max_redirects: u8) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!("anemos-kit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            max_redirects,
        })
    }

    /// Downloads `url` into `dest`, following 301/302 redirects.
    ///
    /// Returns the number of bytes written. On any error the file at `dest`
    /// is removed before the error is returned.
    pub async fn fetch<F>(&self, url: &str, dest: &Path, progress_cb: F) -> Result<u64>
    where
        F: Fn(DownloadProgress),
    {
        info!("Downloading {} to {}", url, dest.display());

        match self.fetch_to_file(url, dest, &progress_cb).await {
            Ok(bytes) => {
                info!(
                    "Download complete: {} bytes written to {}",
                    bytes,
                    dest.display()
                );
                Ok(bytes)
            }
            Err(e) => {
                discard_partial(dest).await;
                Err(e)
            }
        }
    }

    async fn fetch_to_file<F>(&self, url: &str, dest: &Path, progress_cb: &F) -> Result<u64>
    where
        F: Fn(DownloadProgress),
    {
        let mut current = Url::parse(url).map_err(|source| ToolchainError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let mut hops: u8 = 0;

        let response = loop {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(ToolchainError::DownloadFailed { status })?;

                if hops >= self.max_redirects {
                    return Err(ToolchainError::TooManyRedirects {
                        limit: self.max_redirects,
                    });
                }
                hops += 1;

                let next = current
                    .join(location)
                    .map_err(|source| ToolchainError::InvalidUrl {
                        url: location.to_string(),
                        source,
                    })?;
                debug!(status = status.as_u16(), from = %current, to = %next, "Following redirect");
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(ToolchainError::DownloadFailed { status });
            }

            break response;
        };

        let total_bytes = response.content_length();
        debug!("Content-Length: {:?}", total_bytes);

        let mut file = File::create(dest)
            .await
            .map_err(|e| ToolchainError::io_at("create file", dest, e))?;

        let mut stream = response.bytes_stream();
        let mut bytes_downloaded: u64 = 0;

        progress_cb(DownloadProgress::new(0, total_bytes));

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;

            file.write_all(&chunk)
                .await
                .map_err(|e| ToolchainError::io_at("write to", dest, e))?;

            bytes_downloaded += chunk.len() as u64;
            progress_cb(DownloadProgress::new(bytes_downloaded, total_bytes));
        }

        file.flush()
            .await
            .map_err(|e| ToolchainError::io_at("flush", dest, e))?;

        Ok(bytes_downloaded)
    }
}

/// Removes a partially written download. Failures are logged only.
pub(crate) async fn discard_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!("Removed partial download at {}", dest.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to remove partial download at {}: {}",
            dest.display(),
            e
        ),
    }
}

/// Marks `path` as executable (rwxr-xr-x). No-op where permission bits don't apply.
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let permissions = std::fs::Permissions::from_mode(0o755);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| ToolchainError::io_at("set executable permission on", path, e))?;

        debug!("Set executable permission on {}", path.display());
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}
