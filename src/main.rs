//! Maker Exposure - Main Entry Point
//!
//! Prints the user's maker exposure per market, then keeps recomputing it on
//! every poll tick or market update.

use anyhow::Result;
use clap::{Parser, Subcommand};
use maker_exposure::config::{Config, SourceKind};
use maker_exposure::exposure::ExposureCalculator;
use maker_exposure::monitor::{CycleReport, ExposureMonitor};
use maker_exposure::report::{render_report, render_watch_banner};
use maker_exposure::source::{FileSnapshotSource, HttpSnapshotSource, SnapshotSource};
use maker_exposure::watch::{spawn_poll_trigger, LogSubscription};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Maker Exposure CLI
#[derive(Parser)]
#[command(name = "maker-exposure")]
#[command(version, about = "Maker exposure monitor for perpetual markets")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Account to report on (overrides MX_USER_ADDRESS)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Read snapshots from this JSON file (overrides the configured source)
    #[arg(long, global = true)]
    snapshot_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and print the report once, then exit
    Report,

    /// Print the report and recompute on every update (default)
    Watch {
        /// Seconds between polling refreshes
        #[arg(short, long)]
        interval: Option<u64>,

        /// Websocket RPC endpoint for market log subscriptions
        #[arg(long)]
        ws_url: Option<String>,
    },
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(user) = &self.user {
            config.user_address = user.clone();
        }
        if let Some(path) = &self.snapshot_file {
            config.source.kind = SourceKind::File;
            config.source.path = path.clone();
        }
        if let Some(Commands::Watch { interval, ws_url }) = &self.command {
            if let Some(secs) = interval {
                config.watch.poll_interval_secs = *secs;
            }
            if ws_url.is_some() {
                config.watch.ws_url = ws_url.clone();
            }
        }
    }

    fn once(&self) -> bool {
        matches!(self.command, Some(Commands::Report))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let mut config = Config::load()?;
    cli.apply(&mut config);
    config.validate()?;

    let chain = config.chain()?;
    let user = config.user()?;

    info!("🌸 Perennial v2 - Maker Exposure v{}", env!("CARGO_PKG_VERSION"));
    info!("Watching {}", user);
    info!("Chain: {} ({})", chain, chain.id());
    if chain.is_testnet() {
        warn!("Running against a testnet");
    }

    let monitor = ExposureMonitor::new(
        build_source(&config)?,
        user,
        ExposureCalculator::new(config.exposure.position_view),
    );

    info!("Fetching user markets...");
    if cli.once() {
        print_report(&monitor.run_cycle().await?);
        return Ok(());
    }

    let market_addresses = match monitor.initial_cycle().await? {
        Some(initial) => {
            print_report(&initial);
            info!("{}", render_watch_banner(&initial.markets));
            initial.market_addresses
        }
        None => Vec::new(),
    };

    let (tx, rx) = mpsc::channel(config.watch.channel_capacity);
    let _poll = spawn_poll_trigger(Duration::from_secs(config.watch.poll_interval_secs), tx.clone());

    match &config.watch.ws_url {
        Some(_) if market_addresses.is_empty() => {
            warn!("No market contracts known yet, polling only");
        }
        Some(ws_url) => {
            let mut subscription = LogSubscription::new(ws_url, market_addresses);
            if let Some(topic) = &config.watch.event_topic {
                subscription = subscription.with_topic(topic);
            }
            if let Err(e) = subscription.spawn(tx.clone()).await {
                warn!("Market log subscription unavailable, polling only: {:#}", e);
            }
        }
        None => {}
    }
    drop(tx);

    tokio::select! {
        result = monitor.run(rx, print_report) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}

fn build_source(config: &Config) -> Result<Arc<dyn SnapshotSource>> {
    let source: Arc<dyn SnapshotSource> = match config.source.kind {
        SourceKind::File => Arc::new(FileSnapshotSource::new(&config.source.path)),
        SourceKind::Http => Arc::new(HttpSnapshotSource::new(
            &config.source.url,
            Duration::from_secs(config.source.timeout_secs),
        )?),
    };
    info!("Snapshot source: {}", source.name());
    Ok(source)
}

fn print_report(report: &CycleReport) {
    println!("{}", render_report(&report.results));
}

/// Initialize logging to stdout and an hourly rolling file.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "maker-exposure.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the guard alive for the program duration
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("maker_exposure=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .init();

    Ok(())
}
