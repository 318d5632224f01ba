//! CLI argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Anemos Kit - locate, download and sync the anemos toolchain.
#[derive(Debug, Parser)]
#[command(name = "anemos-kit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project root containing the installed anemos package (defaults to the current directory)
    #[arg(short, long, global = true, env = "ANEMOS_KIT_PROJECT")]
    pub project: Option<PathBuf>,

    /// Download the binary without asking when it is missing
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print where the anemos binary is, downloading it if needed
    Locate,

    /// Print the release download URL for this platform
    Url,

    /// Regenerate declarations if the anemos version changed
    Sync,

    /// Run `anemos build` on an entry file in this terminal
    Build {
        /// Entry file passed to `anemos build`
        entry: PathBuf,
    },
}
