use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use park_monitor::{
    AvailabilityChecker, Monitor, ParkApiClient, build_notifiers, config::AppConfig,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "park-monitor")]
#[command(about = "Check a park facility for availability on the target weekday and notify")]
struct Args {
    /// Additional config file layered over the default locations
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check and log, but do not send any notifications
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();

    // Plain lines when output is redirected to a log file
    let ansi = std::io::stdout().is_terminal();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(ansi))
        .with(filter)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = AppConfig::load_from(args.config.as_deref()).context("Failed to load configuration")?;

    for (a, b) in config.overlapping_ranges() {
        tracing::warn!(
            "Date ranges {} .. {} and {} .. {} overlap; shared days will be reported twice",
            a.start,
            a.end,
            b.start,
            b.end
        );
    }

    let client = ParkApiClient::new(
        &config.facility,
        &config.search.success_code,
        &config.network,
    )?;
    let checker = AvailabilityChecker::new(client, config.search.clone());
    let notifiers = build_notifiers(&config.notifications, &config.network)?;
    let monitor = Monitor::new(checker, notifiers, config.facility.name.clone())
        .with_dry_run(args.dry_run);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(monitor.run())?;
    Ok(())
}
