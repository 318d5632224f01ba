//! Anemos Kit command-line host
//!
//! Wires the core resolver and declaration sync to a terminal: prompts before
//! downloading, logs downstream restarts, and runs `anemos build`.

mod cli;
mod host;

use anemos_kit_core::{
    DeclarationSync, ProcessRunner, Resolver, Settings, SyncOutcome, ToolLocation, ToolchainError,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use cli::{Cli, Commands};
use host::{sync_best_effort, LogNotifier, TerminalConsent};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::debug!("Starting Anemos Kit v{}", anemos_kit_core::VERSION);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    if verbose {
        if let Ok(directive) = "anemos_kit_core=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load();
    let project_root = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };

    let resolver = Arc::new(
        Resolver::from_settings(
            &settings,
            Arc::new(ProcessRunner::new()),
            Arc::new(TerminalConsent::new(cli.yes)),
        )
        .context("Failed to initialize the anemos resolver")?,
    );

    match cli.command {
        Commands::Locate => {
            let location = locate(&resolver).await?;
            println!("{}", location);
        }
        Commands::Url => {
            println!("{}", resolver.download_url());
        }
        Commands::Sync => {
            let sync = declaration_sync(&resolver, &project_root);
            let outcome = sync
                .ensure_up_to_date()
                .await
                .map_err(|e| summarize(e, resolver.cache_dir()))?;
            match outcome {
                SyncOutcome::Fresh { version } => {
                    println!("Declarations are up to date (anemos {})", version)
                }
                SyncOutcome::Regenerated { version } => {
                    println!("Declarations regenerated for anemos {}", version)
                }
                SyncOutcome::VersionUnknown { reason } => {
                    println!("Skipped: could not determine the anemos version ({})", reason)
                }
            }
        }
        Commands::Build { entry } => {
            let sync = declaration_sync(&resolver, &project_root);
            sync_best_effort(&sync).await;

            let location = locate(&resolver).await?;
            let status = resolver
                .runner()
                .build(&location, &entry)
                .await
                .context("Failed to run anemos build")?;

            return Ok(match status.code() {
                Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
                None => ExitCode::FAILURE,
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn declaration_sync(resolver: &Arc<Resolver>, project_root: &Path) -> DeclarationSync {
    DeclarationSync::for_project(resolver.clone(), Arc::new(LogNotifier), project_root)
}

async fn locate(resolver: &Resolver) -> Result<ToolLocation> {
    resolver
        .locate()
        .await
        .map_err(|e| summarize(e, resolver.cache_dir()))
}

/// Turns a core error into the single message shown to the user.
fn summarize(err: ToolchainError, cache_dir: &Path) -> anyhow::Error {
    if err.is_binary_unavailable() {
        anyhow::anyhow!(
            "{}. Install anemos on your PATH, or rerun with --yes to download it into {}",
            err,
            cache_dir.display()
        )
    } else {
        anyhow::Error::new(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_unavailable_mentions_cache_dir() {
        let err = summarize(ToolchainError::AcquisitionDeclined, Path::new("/cache/anemos-kit"));
        let message = err.to_string();
        assert!(message.contains("declined"));
        assert!(message.contains("--yes"));
        assert!(message.contains("anemos-kit"));
    }

    #[test]
    fn test_summarize_failed_download_gets_hint() {
        let err = summarize(
            ToolchainError::BinaryUnavailable {
                url: "https://github.com/ohayocorp/anemos/releases/latest/download/anemos-linux-amd64"
                    .to_string(),
                source: Box::new(ToolchainError::TooManyRedirects { limit: 5 }),
            },
            Path::new("/cache/anemos-kit"),
        );
        let message = err.to_string();
        assert!(message.contains("anemos-linux-amd64"));
        assert!(message.contains("Install anemos on your PATH"));
    }

    #[test]
    fn test_summarize_keeps_other_errors() {
        let err = summarize(
            ToolchainError::TooManyRedirects { limit: 5 },
            Path::new("/cache"),
        );
        assert!(err.downcast_ref::<ToolchainError>().is_some());
    }
}
