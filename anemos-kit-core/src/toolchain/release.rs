//! Release asset URLs for the anemos binary.

use serde::{Deserialize, Serialize};

use super::types::Platform;

pub const DEFAULT_HOST: &str = "github.com";
pub const DEFAULT_ORG: &str = "ohayocorp";
pub const DEFAULT_PROJECT: &str = "anemos";
pub const LATEST: &str = "latest";

/// Where release binaries are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSource {
    /// Host serving the release pages, e.g. `github.com`.
    pub host: String,
    pub org: String,
    pub project: String,
    /// Release tag, or `latest`.
    pub version: String,
    /// Replaces `https://{host}` when set, e.g. for an internal mirror.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            org: DEFAULT_ORG.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            version: LATEST.to_string(),
            base_url: None,
        }
    }
}

impl ReleaseSource {
    /// Asset name for a platform: `{project}-{os}-{arch}`.
    pub fn asset_name(&self, platform: Platform) -> String {
        format!("{}-{}-{}", self.project, platform.os, platform.arch)
    }

    /// Download URL of the release asset for `platform`.
    ///
    /// `https://{host}/{org}/{project}/releases/{version}/download/{asset}`
    pub fn download_url(&self, platform: Platform) -> String {
        let base = match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.host),
        };
        format!(
            "{}/{}/{}/releases/{}/download/{}",
            base,
            self.org,
            self.project,
            self.version,
            self.asset_name(platform)
        )
    }
}
