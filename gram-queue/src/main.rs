//! gram-queue - Manage the scheduled-post queue

use clap::{Parser, Subcommand};
use libgramcast::publisher::Publisher;
use libgramcast::{queue, schedule, Config, GramcastError, GraphClient, QueueStore, Result};

#[derive(Parser, Debug)]
#[command(name = "gram-queue")]
#[command(version)]
#[command(about = "Manage the scheduled-post queue")]
#[command(long_about = "\
gram-queue - Manage the scheduled-post queue

DESCRIPTION:
    gram-queue inspects and edits the queue of deferred publications that
    gram-post --at creates and gram-send drains.

COMMANDS:
    list        List queued posts
    cancel      Cancel a queued post (or all of them)
    reschedule  Move a queued post to a different time
    now         Publish a queued post immediately
    stats       Show queue statistics

USAGE EXAMPLES:
    # List queued posts
    gram-queue list

    # List in JSON
    gram-queue list --format json

    # Cancel one post by queue id
    gram-queue cancel 0d4f...-....

    # Cancel everything without confirmation
    gram-queue cancel --all --force

    # Move a post to tomorrow afternoon
    gram-queue reschedule 0d4f...-.... \"tomorrow 3pm\"

    # Publish a queued post right now
    gram-queue now 0d4f...-....

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml
    Queue file: <store.dir>/scheduled_posts.json
    Override with GRAMCAST_CONFIG / GRAMCAST_TOKEN.

EXIT CODES:
    0 - Success
    1 - Operation failed (unknown id, API failure, ...)
    2 - Authentication error
    3 - Invalid input (bad time format, bad output format)
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
    /// List queued posts
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Cancel a queued post
    Cancel {
        /// Queue id to cancel
        post_id: Option<String>,

        /// Cancel every queued post
        #[arg(long)]
        all: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Move a queued post to a different time
    Reschedule {
        /// Queue id to reschedule
        post_id: String,

        /// New time (unix seconds, "2h", "2026-09-01 18:30", "tomorrow 3pm")
        time: String,
    },

    /// Publish a queued post immediately
    Now {
        /// Queue id to publish
        post_id: String,
    },

    /// Show queue statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
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

    match cli.command {
        Commands::List { format } => cmd_list(&store, &format),
        Commands::Cancel {
            post_id,
            all,
            force,
        } => cmd_cancel(&store, post_id.as_deref(), all, force),
        Commands::Reschedule { post_id, time } => cmd_reschedule(&store, &post_id, &time),
        Commands::Now { post_id } => cmd_now(&config, &store, &post_id).await,
        Commands::Stats { format } => cmd_stats(&store, &format),
    }
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(GramcastError::InvalidInput(format!(
            "invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn cmd_list(store: &QueueStore, format: &str) -> Result<()> {
    validate_format(format)?;
    let posts = store.load()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&posts).unwrap());
        return Ok(());
    }

    let now = chrono::Utc::now().timestamp();
    for post in &posts {
        let preview = post
            .caption
            .as_deref()
            .map(|c| truncate(c, 50))
            .unwrap_or_else(|| "(no caption)".to_string());
        println!(
            "{} | {} | {} | {}",
            post.id,
            post.kind,
            preview,
            format_time_until(now, post.scheduled_at)
        );
    }
    Ok(())
}

fn cmd_cancel(store: &QueueStore, post_id: Option<&str>, all: bool, force: bool) -> Result<()> {
    if all {
        let count = store.load()?.len();
        if count == 0 {
            println!("Queue is empty");
            return Ok(());
        }
        if !force && !confirm(&format!("Cancel all {} queued post(s)?", count))? {
            println!("Aborted");
            return Ok(());
        }
        let removed = store.clear()?;
        println!("Cancelled {} post(s)", removed);
        return Ok(());
    }

    let post_id = post_id.ok_or_else(|| {
        GramcastError::InvalidInput("provide a queue id or use --all".to_string())
    })?;
    let removed = store.remove(post_id)?;
    println!("Cancelled {} ({})", removed.id, removed.kind);
    Ok(())
}

fn cmd_reschedule(store: &QueueStore, post_id: &str, time: &str) -> Result<()> {
    let scheduled = schedule::parse_schedule(time)?;
    schedule::ensure_future(scheduled, chrono::Utc::now())?;

    let updated = store.reschedule(post_id, scheduled.timestamp())?;
    println!("Rescheduled {} for {}", updated.id, scheduled.to_rfc3339());
    Ok(())
}

async fn cmd_now(config: &Config, store: &QueueStore, post_id: &str) -> Result<()> {
    let post = store.find(post_id)?;
    tracing::info!(
        id = post.id.as_str(),
        creation_id = post.creation_id.as_str(),
        "publishing queued post ahead of schedule"
    );

    let client = GraphClient::from_config(config)?;
    let publisher = Publisher::new(&client);
    let media_id = publisher.publish(&post.ig_user_id, &post.creation_id).await?;

    store.remove(post_id)?;
    println!("Published: {}", media_id);
    Ok(())
}

fn cmd_stats(store: &QueueStore, format: &str) -> Result<()> {
    validate_format(format)?;
    let posts = store.load()?;
    let now = chrono::Utc::now().timestamp();
    let summary = queue::stats(&posts, now);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
        return Ok(());
    }

    println!("Total:    {}", summary.total);
    println!("Due:      {}", summary.due);
    println!("Upcoming: {}", summary.upcoming);
    if let Some(next) = summary.next_scheduled_at {
        let when = chrono::DateTime::from_timestamp(next, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| next.to_string());
        println!("Next:     {}", when);
    }
    Ok(())
}

/// Ask a yes/no question on stdin
fn confirm(question: &str) -> Result<bool> {
    use std::io::{BufRead, Write};

    print!("{} [y/N] ", question);
    std::io::stdout().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| GramcastError::InvalidInput(format!("could not read answer: {}", e)))?;

    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Shorten a caption to at most `max` characters for the listing
fn truncate(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        content.to_string()
    } else {
        let cut: String = content.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Human-readable time until a scheduled instant
fn format_time_until(now: i64, scheduled_at: i64) -> String {
    let diff = scheduled_at - now;

    if diff < 0 {
        return "overdue".to_string();
    }

    let minutes = diff / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("in {} day{}", days, if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else if minutes > 0 {
        format!("in {} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        "in <1 minute".to_string()
    }
}
