//! gram-send - Polling daemon for scheduled publications
//!
//! Drains the queue that gram-post --at fills: every poll, due entries are
//! published and the queue file is rewritten.

use clap::Parser;
use libgramcast::publisher::Publisher;
use libgramcast::{Config, GraphClient, QueueStore, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "gram-send")]
#[command(version)]
#[command(about = "Polling daemon for scheduled publications")]
#[command(long_about = "\
gram-send - Polling daemon for scheduled publications

DESCRIPTION:
    gram-send watches the scheduled-post queue and publishes each entry once
    its time has come. A failed publish is retried on later polls until the
    configured attempt limit, then dropped.

USAGE:
    # Run in the foreground (logs to stderr)
    gram-send

    # Custom poll interval
    gram-send --poll-interval 30

    # Process due posts once and exit (cron-style operation)
    gram-send --once

SIGNALS:
    SIGTERM, SIGINT - graceful shutdown after the current pass

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml

    [scheduling]
    poll_interval = 60   # seconds between polls
    max_attempts = 3     # publish attempts per entry before dropping it
    retry_delay = 10     # pause after a failed publish

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Authentication error
")]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    poll_interval: Option<u64>,

    /// Process due posts once and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        libgramcast::logging::LoggingConfig::new(
            libgramcast::logging::LogFormat::Text,
            "debug".to_string(),
            true,
        )
        .init();
    } else {
        libgramcast::logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = QueueStore::open(&config);
    let client = GraphClient::from_config(&config)?;
    let publisher = Publisher::new(&client);

    info!("gram-send starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let poll_interval = cli
        .poll_interval
        .unwrap_or(config.scheduling.poll_interval);
    info!(poll_interval, "poll interval set");

    if cli.once {
        let summary = publisher
            .process_due(&store, &config.scheduling, chrono::Utc::now().timestamp())
            .await?;
        info!(
            published = summary.published,
            retried = summary.retried,
            dropped = summary.dropped,
            "single pass complete"
        );
        return Ok(());
    }

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("shutdown requested, stopping");
            break;
        }

        match publisher
            .process_due(&store, &config.scheduling, chrono::Utc::now().timestamp())
            .await
        {
            Ok(summary) if summary != Default::default() => {
                info!(
                    published = summary.published,
                    retried = summary.retried,
                    dropped = summary.dropped,
                    "pass complete"
                );
            }
            Ok(_) => {}
            Err(e) => error!("queue pass failed: {}", e),
        }

        // Sleep in one-second slices so shutdown stays responsive
        for _ in 0..poll_interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }

    info!("gram-send stopped");
    Ok(())
}

/// SIGINT/SIGTERM flip the shutdown flag; the loop notices within a second
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
        libgramcast::GramcastError::InvalidInput(format!("signal setup failed: {}", e))
    })?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("received shutdown signal");
                    shutdown.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}
