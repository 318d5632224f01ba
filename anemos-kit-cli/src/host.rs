//! Host-side collaborators for the core: consent prompt, downstream
//! notification, and the best-effort policy for background syncs.

use anemos_kit_core::{ConsentPrompt, DeclarationSync, DownloadRequest, DownstreamNotifier, SyncOutcome};
use async_trait::async_trait;
use dialoguer::Confirm;
use std::path::Path;
use tracing::{debug, info, warn};

/// Asks on the terminal before downloading the binary.
///
/// Declines when stderr is not a terminal, unless `assume_yes` is set.
#[derive(Debug, Clone, Default)]
pub struct TerminalConsent {
    assume_yes: bool,
}

impl TerminalConsent {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl ConsentPrompt for TerminalConsent {
    async fn confirm_download(&self, request: &DownloadRequest) -> bool {
        if self.assume_yes {
            info!("Downloading {} without prompting (--yes)", request.url);
            return true;
        }

        let question = format!(
            "anemos was not found. Download it for {} to {}?",
            request.platform,
            request.destination.display()
        );

        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(question).default(true).interact()
        })
        .await;

        match answer {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!("Could not ask for download consent: {}", e);
                false
            }
            Err(e) => {
                warn!("Consent prompt task failed: {}", e);
                false
            }
        }
    }
}

/// Logs a language-service restart request when declarations change.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl DownstreamNotifier for LogNotifier {
    async fn declarations_changed(&self, types_dir: &Path, version: &str) {
        info!(
            %version,
            "Declarations regenerated in {}; restart the TypeScript language service to load them",
            types_dir.display()
        );
    }
}

/// Runs a sync pass, logging and swallowing any failure.
///
/// Stale declarations degrade editing but must never block a command.
pub async fn sync_best_effort(sync: &DeclarationSync) -> Option<SyncOutcome> {
    match sync.ensure_up_to_date().await {
        Ok(outcome) => {
            debug!(?outcome, "Declaration sync finished");
            Some(outcome)
        }
        Err(e) => {
            warn!("Declaration sync failed: {}", e);
            None
        }
    }
}
