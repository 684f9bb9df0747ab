//! CLI definitions for the WATI AutoBot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// WATI AutoBot CLI.
#[derive(Parser)]
#[command(name = "wati-autobot")]
#[command(about = "Tags unread WATI team-inbox conversations with a routing flow")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (TOML). Environment variables apply on top.
    #[arg(short, long, env = "AUTOBOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Run the bot and the health endpoint (default)
    Run,

    /// Log in by hand in a visible browser and save the session
    SaveSession,

    /// Load and validate the configuration, then print it
    CheckConfig,
}
