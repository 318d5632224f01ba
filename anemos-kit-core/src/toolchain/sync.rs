//! Keeps generated declarations in step with the active anemos version.
//!
//! A pass queries `anemos --version`, compares it with the `version.json`
//! record next to the declarations, and regenerates when they disagree.
//! Regeneration removes the old record first and writes the new one only
//! after `anemos declarations` succeeds, so a present record always matches
//! the declarations on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::paths;
use super::resolver::Resolver;
use super::version_record::{self, VersionRecord};
use crate::error::Result;

/// Version reported by unversioned development builds. Never treated as fresh.
pub const UNVERSIONED: &str = "0.0.0";

/// Told when declarations were regenerated, e.g. to restart a language service.
///
/// Fire-and-forget: implementations handle their own failures.
#[async_trait]
pub trait DownstreamNotifier: Send + Sync {
    async fn declarations_changed(&self, types_dir: &Path, version: &str);
}

/// Result of one synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The record already matched the active version.
    Fresh { version: String },
    /// Declarations were regenerated for this version.
    Regenerated { version: String },
    /// The version query failed; nothing was touched.
    VersionUnknown { reason: String },
}

/// Whether declarations must be regenerated for `current`.
pub fn needs_update(record: Option<&VersionRecord>, current: &str) -> bool {
    match record {
        None => true,
        Some(record) => record.version != current || current == UNVERSIONED,
    }
}

/// Synchronizes one declarations directory.
pub struct DeclarationSync {
    resolver: Arc<Resolver>,
    notifier: Arc<dyn DownstreamNotifier>,
    types_dir: PathBuf,
    lock: Mutex<()>,
}

impl DeclarationSync {
    pub fn new(
        resolver: Arc<Resolver>,
        notifier: Arc<dyn DownstreamNotifier>,
        types_dir: PathBuf,
    ) -> Self {
        Self {
            resolver,
            notifier,
            types_dir,
            lock: Mutex::new(()),
        }
    }

    /// Synchronizes the declarations installed under `project_root`.
    pub fn for_project(
        resolver: Arc<Resolver>,
        notifier: Arc<dyn DownstreamNotifier>,
        project_root: &Path,
    ) -> Self {
        Self::new(resolver, notifier, paths::types_dir(project_root))
    }

    pub fn types_dir(&self) -> &Path {
        &self.types_dir
    }

    pub fn record_path(&self) -> PathBuf {
        paths::version_record_path(&self.types_dir)
    }

    /// Runs one synchronization pass.
    ///
    /// Passes are serialized. Resolver, record and generation failures are
    /// returned; the caller decides whether they matter.
    pub async fn ensure_up_to_date(&self) -> Result<SyncOutcome> {
        let _guard = self.lock.lock().await;

        let location = self.resolver.locate().await?;
        let runner = self.resolver.runner();

        let current = match runner.version(&location).await {
            Ok(version) if !version.is_empty() => version,
            Ok(_) => {
                warn!("{} --version printed nothing, skipping declaration sync", location);
                return Ok(SyncOutcome::VersionUnknown {
                    reason: "empty version output".to_string(),
                });
            }
            Err(e) => {
                warn!("Could not determine anemos version, skipping declaration sync: {}", e);
                return Ok(SyncOutcome::VersionUnknown {
                    reason: e.to_string(),
                });
            }
        };

        let record_path = self.record_path();
        let record = version_record::load(&record_path).await?;

        if !needs_update(record.as_ref(), &current) {
            debug!(version = %current, "Declarations are up to date");
            return Ok(SyncOutcome::Fresh { version: current });
        }

        info!(
            previous = ?record.as_ref().map(|r| r.version.as_str()),
            current = %current,
            "Regenerating declarations in {}",
            self.types_dir.display()
        );

        version_record::invalidate(&record_path).await?;
        runner.declarations(&location, &self.types_dir).await?;
        version_record::save(&VersionRecord::new(current.clone()), &record_path).await?;

        self.notifier
            .declarations_changed(&self.types_dir, &current)
            .await;

        Ok(SyncOutcome::Regenerated { version: current })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolchainError;
    use crate::toolchain::downloader::{Downloader, DEFAULT_MAX_REDIRECTS};
    use crate::toolchain::invoke::ToolRunner;
    use crate::toolchain::release::ReleaseSource;
    use crate::toolchain::resolver::tests::FakePrompt;
    use crate::toolchain::types::ToolLocation;
    use std::ffi::OsStr;
    use std::process::ExitStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Runner found on the search path, reporting a scripted version.
    struct ScriptedRunner {
        version: Option<String>,
        declarations_succeed: bool,
        declarations_calls: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(version: Option<&str>, declarations_succeed: bool) -> Self {
            Self {
                version: version.map(str::to_string),
                declarations_succeed,
                declarations_calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.declarations_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ToolRunner for ScriptedRunner {
        async fn probe(&self, _program: &OsStr) -> bool {
            true
        }

        async fn version(&self, location: &ToolLocation) -> Result<String> {
            self.version
                .clone()
                .ok_or_else(|| ToolchainError::ToolInvocationFailed {
                    command: format!("{} --version", location),
                    exit: "exit code 1".to_string(),
                })
        }

        async fn declarations(&self, location: &ToolLocation, out_dir: &Path) -> Result<()> {
            self.declarations_calls.fetch_add(1, Ordering::SeqCst);
            if !self.declarations_succeed {
                return Err(ToolchainError::ToolInvocationFailed {
                    command: format!("{} declarations {}", location, out_dir.display()),
                    exit: "exit code 2".to_string(),
                });
            }
            std::fs::create_dir_all(out_dir).unwrap();
            std::fs::write(out_dir.join("index.d.ts"), "export {};\n").unwrap();
            Ok(())
        }

        async fn build(&self, _location: &ToolLocation, _entry: &Path) -> Result<ExitStatus> {
            unimplemented!("build is not exercised by sync tests")
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        versions: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn versions(&self) -> Vec<String> {
            self.versions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DownstreamNotifier for RecordingNotifier {
        async fn declarations_changed(&self, _types_dir: &Path, version: &str) {
            self.versions.lock().unwrap().push(version.to_string());
        }
    }

    struct Harness {
        _temp_dir: TempDir,
        runner: Arc<ScriptedRunner>,
        notifier: Arc<RecordingNotifier>,
        sync: DeclarationSync,
    }

    fn harness(runner: ScriptedRunner, consent: bool) -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(runner);
        let notifier = Arc::new(RecordingNotifier::default());
        let resolver = Resolver::new(
            temp_dir.path().join("cache"),
            ReleaseSource::default(),
            Downloader::new(DEFAULT_MAX_REDIRECTS).unwrap(),
            runner.clone(),
            Arc::new(FakePrompt::new(consent)),
        );
        let sync =
            DeclarationSync::for_project(Arc::new(resolver), notifier.clone(), temp_dir.path());

        Harness {
            _temp_dir: temp_dir,
            runner,
            notifier,
            sync,
        }
    }

    async fn seed_record(sync: &DeclarationSync, version: &str) {
        version_record::save(&VersionRecord::new(version), &sync.record_path())
            .await
            .unwrap();
    }

    #[test]
    fn test_needs_update() {
        let record = VersionRecord::new("1.2.0");
        assert!(needs_update(None, "1.2.0"));
        assert!(!needs_update(Some(&record), "1.2.0"));
        assert!(needs_update(Some(&record), "1.3.0"));

        let unversioned = VersionRecord::new(UNVERSIONED);
        assert!(needs_update(Some(&unversioned), UNVERSIONED));
        assert!(needs_update(Some(&record), UNVERSIONED));
    }

    #[tokio::test]
    async fn test_missing_record_regenerates() {
        let h = harness(ScriptedRunner::new(Some("1.2.0"), true), false);

        let outcome = h.sync.ensure_up_to_date().await.unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Regenerated {
                version: "1.2.0".to_string()
            }
        );
        assert_eq!(h.runner.calls(), 1);
        let record = version_record::load(&h.sync.record_path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.version, "1.2.0");
        assert!(h.sync.types_dir().join("index.d.ts").exists());
        assert_eq!(h.notifier.versions(), vec!["1.2.0".to_string()]);
    }

    #[tokio::test]
    async fn test_matching_record_is_fresh() {
        let h = harness(ScriptedRunner::new(Some("1.2.0"), true), false);
        seed_record(&h.sync, "1.2.0").await;

        let outcome = h.sync.ensure_up_to_date().await.unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Fresh {
                version: "1.2.0".to_string()
            }
        );
        assert_eq!(h.runner.calls(), 0);
        assert!(h.notifier.versions().is_empty());
    }

    #[tokio::test]
    async fn test_stale_record_regenerates() {
        let h = harness(ScriptedRunner::new(Some("1.3.0"), true), false);
        seed_record(&h.sync, "1.2.0").await;

        let outcome = h.sync.ensure_up_to_date().await.unwrap();

        assert!(matches!(outcome, SyncOutcome::Regenerated { .. }));
        let record = version_record::load(&h.sync.record_path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.version, "1.3.0");
    }

    #[tokio::test]
    async fn test_unversioned_build_always_regenerates() {
        let h = harness(ScriptedRunner::new(Some(UNVERSIONED), true), false);
        seed_record(&h.sync, UNVERSIONED).await;

        h.sync.ensure_up_to_date().await.unwrap();
        h.sync.ensure_up_to_date().await.unwrap();

        assert_eq!(h.runner.calls(), 2);
        assert_eq!(h.notifier.versions().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_version_query_skips_regeneration() {
        let h = harness(ScriptedRunner::new(None, true), false);
        seed_record(&h.sync, "1.2.0").await;

        let outcome = h.sync.ensure_up_to_date().await.unwrap();

        assert!(matches!(outcome, SyncOutcome::VersionUnknown { .. }));
        assert_eq!(h.runner.calls(), 0);
        let record = version_record::load(&h.sync.record_path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.version, "1.2.0");
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_no_record() {
        let h = harness(ScriptedRunner::new(Some("1.3.0"), false), false);
        seed_record(&h.sync, "1.2.0").await;

        let err = h.sync.ensure_up_to_date().await.unwrap_err();

        assert!(matches!(err, ToolchainError::ToolInvocationFailed { .. }));
        assert!(version_record::load(&h.sync.record_path())
            .await
            .unwrap()
            .is_none());
        assert!(h.notifier.versions().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_binary_is_returned() {
        let temp_dir = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = Arc::new(NeverOnPath);
        let resolver = Resolver::new(
            temp_dir.path().join("cache"),
            ReleaseSource::default(),
            Downloader::new(DEFAULT_MAX_REDIRECTS).unwrap(),
            runner,
            Arc::new(FakePrompt::new(false)),
        );
        let sync = DeclarationSync::for_project(Arc::new(resolver), notifier, temp_dir.path());

        let err = sync.ensure_up_to_date().await.unwrap_err();
        assert!(err.is_binary_unavailable());
    }

    struct NeverOnPath;

    #[async_trait]
    impl ToolRunner for NeverOnPath {
        async fn probe(&self, _program: &OsStr) -> bool {
            false
        }

        async fn version(&self, _location: &ToolLocation) -> Result<String> {
            unreachable!("no binary was located")
        }

        async fn declarations(&self, _location: &ToolLocation, _out_dir: &Path) -> Result<()> {
            unreachable!("no binary was located")
        }

        async fn build(&self, _location: &ToolLocation, _entry: &Path) -> Result<ExitStatus> {
            unreachable!("no binary was located")
        }
    }
}
