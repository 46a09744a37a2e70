//! CCU Monitor - interactive Roblox universe monitoring
//!
//! Samples concurrent users and approval rating once per minute for one
//! universe, or for two universes side by side, then prints a summary.

use anyhow::{Context, Result};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ccu_monitor::console::ConsoleSink;
use ccu_monitor::{MonitorConfig, MonitorWizard, Outcome, Prompter, RobloxFetcher, SystemClock};

async fn run() -> Result<Outcome> {
    let config = MonitorConfig::load().await.context("Failed to load configuration")?;
    let fetcher = RobloxFetcher::new(&config.api).context("Failed to create HTTP client")?;
    let sink = ConsoleSink::new(config.presentation.color);

    let wizard = MonitorWizard::new(config, Arc::new(fetcher), Arc::new(SystemClock), Arc::new(sink))
        .with_interrupts();

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    wizard.run(&mut prompter).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr so they stay out of the report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    info!("CCU monitor starting");

    match run().await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            error!("Monitor failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
