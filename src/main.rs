use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use procwatch::config::{self, Config};
use procwatch::display;
use procwatch::logger::ProcessLogger;
use procwatch::system::collector::Collector;

#[derive(Parser)]
#[command(
    name = "procwatch",
    about = "Process monitor with resource, I/O, and hierarchy reporting"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Display the process hierarchy (parent-child relationships)
    #[arg(long, conflicts_with_all = ["summary", "top", "log"])]
    hierarchy: bool,

    /// Display the system resource summary
    #[arg(long, conflicts_with_all = ["top", "log"])]
    summary: bool,

    /// Display the top N processes by CPU usage
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..), conflicts_with = "log")]
    top: Option<u64>,

    /// Continuously log process data (with I/O stats) instead of displaying it
    #[arg(long)]
    log: bool,

    /// Stop logging after this many seconds; unbounded when omitted
    #[arg(long, value_name = "SECS", requires = "log")]
    duration: Option<u64>,

    /// Seconds between log entries
    #[arg(long, value_name = "SECS", requires = "log")]
    interval: Option<u64>,

    /// Output directory for log files
    #[arg(long, value_name = "DIR", requires = "log")]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);

    let mut collector = Collector::new();

    if cli.log {
        let interval = cli.interval.unwrap_or(config.logging.interval_secs);
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.logging.output_dir));
        let logger = ProcessLogger::new(output, interval)?;
        logger
            .run_loop(&mut collector, cli.duration.map(Duration::from_secs))
            .await?;
        display::print_log_summary(&logger.summary());
        return Ok(());
    }

    info!("scanning processes");
    let snapshot = collector.snapshot(false);
    if snapshot.records.is_empty() {
        warn!("no processes found; you may need elevated privileges");
        return Ok(());
    }
    info!(count = snapshot.records.len(), "scan complete");

    if cli.hierarchy {
        display::print_hierarchy(&snapshot);
    } else if cli.summary {
        let summary = collector.system_summary();
        display::print_system_summary(&summary, &snapshot, &config.display);
    } else if let Some(top) = cli.top {
        display::print_top_processes(&snapshot, top as usize, &config.display);
    } else {
        display::print_process_list(&snapshot, &config.display);
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    }
}
