//! gram-track - Follower and demographics tracking
//!
//! Accumulates one sample per day into the local history files, shows the
//! recorded history, and snapshots the 30-day follower-insights series.

use clap::{Parser, Subcommand};
use libgramcast::history::{follower_variations, HistoryStore, RecordOutcome, INSIGHTS_FILE};
use libgramcast::{account, insights, Config, GramcastError, GraphClient, Result};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Watch mode re-checks hourly; recording stays once-per-day
const WATCH_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Parser, Debug)]
#[command(name = "gram-track")]
#[command(version)]
#[command(about = "Track followers and audience demographics")]
#[command(long_about = "\
gram-track - Track followers and audience demographics

DESCRIPTION:
    gram-track samples account statistics into local JSON history files,
    one sample per day:

        followers_history.json     date -> follower count
        demographics_history.json  date -> {gender, age, city}

    Running a tracker again on the same day is a no-op, so it is safe to
    invoke from cron or to leave running with --watch.

COMMANDS:
    followers     Record today's follower count
    demographics  Record today's gender/age/city breakdowns
    history       Show the recorded follower history with daily deltas
    insights      Snapshot the 30-day follower_count series

USAGE EXAMPLES:
    gram-track followers
    gram-track followers --watch
    gram-track demographics
    gram-track history
    gram-track insights

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml
    History files live in <store.dir>.

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Authentication error
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record today's follower count
    Followers {
        /// Keep running, re-checking every hour
        #[arg(long)]
        watch: bool,
    },

    /// Record today's gender/age/city breakdowns
    Demographics {
        /// Keep running, re-checking every hour
        #[arg(long)]
        watch: bool,
    },

    /// Show the recorded follower history with daily deltas
    History {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Snapshot the 30-day follower_count series
    Insights,
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
    let store = HistoryStore::open(&config);

    match cli.command {
        Commands::Followers { watch } => {
            if watch {
                watch_loop(|| track_followers(&config, &store)).await
            } else {
                track_followers(&config, &store).await
            }
        }
        Commands::Demographics { watch } => {
            if watch {
                watch_loop(|| track_demographics(&config, &store)).await
            } else {
                track_demographics(&config, &store).await
            }
        }
        Commands::History { format } => cmd_history(&store, &format),
        Commands::Insights => cmd_insights(&config, &store).await,
    }
}

/// Run a tracker forever, hourly. Errors are logged, not fatal.
async fn watch_loop<F, Fut>(tick: F) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    loop {
        if let Err(e) = tick().await {
            error!("tracking pass failed: {}", e);
        }
        sleep(WATCH_INTERVAL).await;
    }
}

async fn track_followers(config: &Config, store: &HistoryStore) -> Result<()> {
    let today = chrono::Utc::now().date_naive();

    // Skip the API round-trip when today is already sampled
    if store
        .load_followers()?
        .contains_key(&today.format("%Y-%m-%d").to_string())
    {
        info!(date = %today, "followers already recorded today");
        return Ok(());
    }

    let client = GraphClient::from_config(config)?;
    let details = account::fetch_account_details(&client).await?;
    let count = details.followers_count.ok_or_else(|| {
        GramcastError::from(libgramcast::error::ApiError::Decode(
            "account details carried no followers_count".to_string(),
        ))
    })?;

    match store.record_followers(today, count)? {
        RecordOutcome::Recorded { delta: Some(delta) } => {
            info!(date = %today, count, delta, "follower sample recorded");
            println!("{}: {} followers ({:+})", today, count, delta);
        }
        RecordOutcome::Recorded { delta: None } => {
            info!(date = %today, count, "first follower sample recorded");
            println!("{}: {} followers", today, count);
        }
        RecordOutcome::AlreadyRecorded => {
            info!(date = %today, "followers already recorded today");
        }
    }
    Ok(())
}

async fn track_demographics(config: &Config, store: &HistoryStore) -> Result<()> {
    let today = chrono::Utc::now().date_naive();
    let today_key = today.format("%Y-%m-%d").to_string();

    if store.last_demographics_date()?.as_deref() == Some(today_key.as_str()) {
        info!(date = %today, "demographics already recorded today");
        return Ok(());
    }

    let client = GraphClient::from_config(config)?;
    let ig = account::resolve_business_account(&client).await?.ig_user_id;
    let snapshot = insights::fetch_demographics_snapshot(&client, &ig).await?;

    match store.record_demographics(today, &snapshot)? {
        RecordOutcome::Recorded { .. } => {
            info!(
                date = %today,
                gender = snapshot.gender.len(),
                age = snapshot.age.len(),
                city = snapshot.city.len(),
                "demographics snapshot recorded"
            );
            println!("{}: demographics recorded", today);
        }
        RecordOutcome::AlreadyRecorded => {
            info!(date = %today, "demographics already recorded today");
        }
    }
    Ok(())
}

fn cmd_history(store: &HistoryStore, format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(GramcastError::InvalidInput(format!(
            "invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }

    let history = store.load_followers()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&history).unwrap());
        return Ok(());
    }

    if history.is_empty() {
        println!("No follower history recorded yet");
        return Ok(());
    }

    for (date, count, delta) in follower_variations(&history) {
        match delta {
            Some(delta) => println!("{}: {} followers ({:+})", date, count, delta),
            None => println!("{}: {} followers", date, count),
        }
    }
    Ok(())
}

async fn cmd_insights(config: &Config, store: &HistoryStore) -> Result<()> {
    let client = GraphClient::from_config(config)?;
    let ig = account::resolve_business_account(&client).await?.ig_user_id;

    let (since, until) = insights::follower_window(chrono::Utc::now().date_naive());
    let series = insights::fetch_follower_series(&client, &ig, since, until).await?;

    store.write_snapshot(INSIGHTS_FILE, &series)?;
    info!(file = INSIGHTS_FILE, "follower insights saved");
    println!("{}", serde_json::to_string_pretty(&series).unwrap());
    Ok(())
}
