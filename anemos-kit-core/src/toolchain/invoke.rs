//! Process invocation contract for the anemos binary.
//!
//! The binary is driven through four entry points: `--help` to test for its
//! presence, `--version` for the active version, `declarations <dir>` to
//! regenerate type declarations, and `build <entry>` which runs attached to
//! the caller's terminal.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

use super::types::ToolLocation;
use crate::error::{Result, ToolchainError};

/// Runs the anemos binary.
///
/// Implemented by [`ProcessRunner`]; tests substitute fakes.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Returns true if `program` launches at all.
    ///
    /// Any exit status counts as present; only a launch error means absent.
    async fn probe(&self, program: &OsStr) -> bool;

    /// Returns the trimmed output of `--version`.
    async fn version(&self, location: &ToolLocation) -> Result<String>;

    /// Runs `declarations <out_dir>` and waits for it to finish.
    async fn declarations(&self, location: &ToolLocation, out_dir: &Path) -> Result<()>;

    /// Runs `build <entry_file>` with inherited stdio.
    async fn build(&self, location: &ToolLocation, entry_file: &Path) -> Result<ExitStatus>;
}

/// [`ToolRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    async fn capture(location: &ToolLocation, args: &[&OsStr]) -> Result<Output> {
        let mut cmd = Command::new(location.program());
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd.output()
            .await
            .map_err(|e| ToolchainError::io(format!("Failed to execute {}", location), e))
    }
}

/// Describes a failed exit for error messages.
fn describe_exit(output: &Output) -> String {
    let code = output
        .status
        .code()
        .map(|c| format!("exit code {}", c))
        .unwrap_or_else(|| "terminated by signal".to_string());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if stderr.is_empty() {
        code
    } else {
        format!("{}: {}", code, stderr)
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn probe(&self, program: &OsStr) -> bool {
        let result = Command::new(program)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) => {
                debug!(?status, "{} responded to --help", program.to_string_lossy());
                true
            }
            Err(e) => {
                debug!("{} is not launchable: {}", program.to_string_lossy(), e);
                false
            }
        }
    }

    async fn version(&self, location: &ToolLocation) -> Result<String> {
        let output = Self::capture(location, &[OsStr::new("--version")]).await?;

        if !output.status.success() {
            return Err(ToolchainError::ToolInvocationFailed {
                command: format!("{} --version", location),
                exit: describe_exit(&output),
            });
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(%version, "Queried anemos version");
        Ok(version)
    }

    async fn declarations(&self, location: &ToolLocation, out_dir: &Path) -> Result<()> {
        info!("Generating declarations into {}", out_dir.display());

        let output = Self::capture(
            location,
            &[OsStr::new("declarations"), out_dir.as_os_str()],
        )
        .await?;

        if !output.status.success() {
            return Err(ToolchainError::ToolInvocationFailed {
                command: format!("{} declarations {}", location, out_dir.display()),
                exit: describe_exit(&output),
            });
        }

        Ok(())
    }

    async fn build(&self, location: &ToolLocation, entry_file: &Path) -> Result<ExitStatus> {
        info!("Running {} build {}", location, entry_file.display());

        Command::new(location.program())
            .arg("build")
            .arg(entry_file)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ToolchainError::io(format!("Failed to execute {}", location), e))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Writes an executable shell script standing in for the anemos binary.
    fn fake_binary(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("anemos");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_probe_missing_program() {
        let runner = ProcessRunner::new();
        assert!(
            !runner
                .probe(OsStr::new("anemos-kit-definitely-not-installed"))
                .await
        );
    }

    #[tokio::test]
    async fn test_probe_accepts_nonzero_exit() {
        let temp_dir = TempDir::new().unwrap();
        let binary = fake_binary(temp_dir.path(), "echo usage; exit 2");

        let runner = ProcessRunner::new();
        assert!(runner.probe(binary.as_os_str()).await);
    }

    #[tokio::test]
    async fn test_version_is_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        let binary = fake_binary(temp_dir.path(), "echo '  1.2.0  '");

        let runner = ProcessRunner::new();
        let version = runner.version(&ToolLocation::Path(binary)).await.unwrap();
        assert_eq!(version, "1.2.0");
    }

    #[tokio::test]
    async fn test_version_failure() {
        let temp_dir = TempDir::new().unwrap();
        let binary = fake_binary(temp_dir.path(), "echo broken >&2; exit 3");

        let runner = ProcessRunner::new();
        let err = runner
            .version(&ToolLocation::Path(binary))
            .await
            .unwrap_err();

        match err {
            ToolchainError::ToolInvocationFailed { exit, .. } => {
                assert!(exit.contains("exit code 3"));
                assert!(exit.contains("broken"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_declarations_passes_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let binary = fake_binary(
            temp_dir.path(),
            "[ \"$1\" = declarations ] || exit 1\nmkdir -p \"$2\"\necho 'export {}' > \"$2/index.d.ts\"",
        );
        let out_dir = temp_dir.path().join("types");

        let runner = ProcessRunner::new();
        runner
            .declarations(&ToolLocation::Path(binary), &out_dir)
            .await
            .unwrap();

        assert!(out_dir.join("index.d.ts").exists());
    }

    #[tokio::test]
    async fn test_declarations_failure() {
        let temp_dir = TempDir::new().unwrap();
        let binary = fake_binary(temp_dir.path(), "exit 1");

        let runner = ProcessRunner::new();
        let err = runner
            .declarations(&ToolLocation::Path(binary), temp_dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolchainError::ToolInvocationFailed { .. }));
    }

    #[tokio::test]
    async fn test_build_reports_exit_status() {
        let temp_dir = TempDir::new().unwrap();
        let binary = fake_binary(temp_dir.path(), "[ \"$1\" = build ] && exit 0; exit 1");

        let runner = ProcessRunner::new();
        let status = runner
            .build(&ToolLocation::Path(binary), Path::new("index.ts"))
            .await
            .unwrap();
        assert!(status.success());
    }
}
