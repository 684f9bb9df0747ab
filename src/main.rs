//! WATI AutoBot
//!
//! Logs into the WATI team inbox with a persistent Chromium profile and
//! tags every unread conversation with a routing flow, while a health
//! endpoint tells the hosting platform the process is alive.

mod cli;
mod server;

use std::time::Duration;

use clap::Parser;
use tokio::runtime::Runtime;

use cli::{Cli, Commands};

/// How long exit waits for blocking work, such as an operator prompt still
/// reading stdin.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = server::load_config(cli.config.as_deref())?;
    server::init_tracing(&config.logging)?;

    let runtime = build_runtime()?;
    let result = runtime.block_on(async move {
        match cli.command.unwrap_or(Commands::Run) {
            Commands::Run => server::run(config).await,
            Commands::SaveSession => server::save_session(config).await,
            Commands::CheckConfig => server::check_config(&config),
        }
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}
